//! Policy trait and the configured allocator front end

use crate::greedy::BalancedGreedyPolicy;
use crate::random::RandomPolicy;
use crate::solver::SolverPolicy;
use crate::{
    check_group_count, AllocationProblem, AllocatorConfig, AllocatorError, HintClusterer,
    HintLabels, PolicyKind, SearchStats,
};
use roster_domain::Assignment;
use roster_encoder::Embeddings;
use roster_graph::CohortGraph;
use std::time::Instant;
use tracing::info;

/// A complete, feasible labelling found by a policy
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    /// Group index per member, in problem order
    pub labels: Vec<usize>,

    /// Objective value of `labels`
    pub objective: f64,

    /// Search counters
    pub stats: SearchStats,
}

/// Trait for allocation policies
///
/// Every policy returns a labelling that satisfies the size bounds of the
/// problem, or an error. A policy must not run past `deadline` by more than
/// one unit of its own inner work.
pub trait AllocationPolicy {
    /// Policy label recorded with a run
    fn name(&self) -> &'static str;

    /// Allocate every member of `problem`
    fn allocate(
        &self,
        problem: &AllocationProblem,
        deadline: Instant,
    ) -> Result<Solution, AllocatorError>;
}

/// Result of one allocation
#[derive(Debug, Clone)]
pub struct AllocationOutcome {
    /// Final member → group mapping
    pub assignment: Assignment,

    /// Raw solution (labels, objective, stats)
    pub solution: Solution,

    /// Label of the policy that produced it
    pub policy: &'static str,
}

/// Allocator front end driven by [`AllocatorConfig`]
///
/// # Examples
///
/// ```no_run
/// use roster_allocator::{AllocatorConfig, ConstrainedAllocator};
/// # fn run(graph: &roster_graph::CohortGraph, embeddings: &roster_encoder::Embeddings)
/// #     -> Result<(), roster_allocator::AllocatorError> {
/// let allocator = ConstrainedAllocator::new(AllocatorConfig::default())?;
/// let hints = allocator.hint(embeddings, 4)?;
/// let outcome = allocator.allocate(graph, &hints, 4)?;
/// println!("objective {}", outcome.solution.objective);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ConstrainedAllocator {
    config: AllocatorConfig,
}

impl ConstrainedAllocator {
    /// Create an allocator, validating the configuration
    pub fn new(config: AllocatorConfig) -> Result<Self, AllocatorError> {
        config.validate().map_err(AllocatorError::Config)?;
        Ok(Self { config })
    }

    /// Get configuration
    pub fn config(&self) -> &AllocatorConfig {
        &self.config
    }

    /// Policy selected by the configuration
    pub fn policy(&self) -> Box<dyn AllocationPolicy> {
        match self.config.policy {
            PolicyKind::Solver => Box::new(SolverPolicy::new(
                self.config.exact_search_limit,
                self.config.local_search_rounds,
                self.config.seed,
            )),
            PolicyKind::Greedy => Box::new(BalancedGreedyPolicy),
            PolicyKind::Random => Box::new(RandomPolicy::new(self.config.seed)),
        }
    }

    /// Cluster embeddings into advisory hint labels
    pub fn hint(&self, embeddings: &Embeddings, k: usize) -> Result<HintLabels, AllocatorError> {
        check_group_count(embeddings.len(), k)?;
        HintClusterer::new(
            self.config.hint_iterations,
            self.config.hint_restarts,
            self.config.seed,
        )
        .fit(embeddings, k)
    }

    /// Allocate the members of `graph` into `k` groups
    pub fn allocate(
        &self,
        graph: &CohortGraph,
        hints: &HintLabels,
        k: usize,
    ) -> Result<AllocationOutcome, AllocatorError> {
        let problem = AllocationProblem::new(graph, hints, k, &self.config.weights)?
            .with_balance_attribute(graph, &self.config.balance_attribute);
        let policy = self.policy();
        let deadline = Instant::now() + self.config.time_budget();

        let solution = policy.allocate(&problem, deadline)?;
        if !problem.is_feasible(&solution.labels) {
            return Err(AllocatorError::Infeasible(format!(
                "{} policy returned sizes {:?} outside {:?}",
                policy.name(),
                problem.group_sizes(&solution.labels),
                problem.bounds()
            )));
        }

        let assignment = problem.to_assignment(&solution.labels)?;
        info!(
            cohort = graph.cohort(),
            policy = policy.name(),
            k,
            objective = solution.objective,
            stats = %solution.stats.summary(),
            "Allocation complete"
        );
        Ok(AllocationOutcome {
            assignment,
            solution,
            policy: policy.name(),
        })
    }
}
