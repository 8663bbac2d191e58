//! Time-boxed combinatorial search
//!
//! Small cohorts are solved exactly by branch-and-bound. Larger cohorts get
//! a greedy construction followed by move/swap local search with seeded
//! perturbation restarts. Both keep the best feasible labelling seen so far,
//! so hitting the deadline degrades quality, never feasibility.

use crate::problem::{SizeTracker, EPSILON};
use crate::{AllocationPolicy, AllocationProblem, AllocatorError, SearchStats, Solution};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Instant;
use tracing::{debug, warn};

/// Deadline is polled every this many branch-and-bound nodes
const DEADLINE_POLL: u64 = 1024;

/// Solver-based policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolverPolicy {
    exact_search_limit: usize,
    local_search_rounds: usize,
    seed: u64,
}

impl SolverPolicy {
    /// Create a solver policy
    pub fn new(exact_search_limit: usize, local_search_rounds: usize, seed: u64) -> Self {
        Self {
            exact_search_limit,
            local_search_rounds,
            seed,
        }
    }
}

impl AllocationPolicy for SolverPolicy {
    fn name(&self) -> &'static str {
        "solver"
    }

    fn allocate(
        &self,
        problem: &AllocationProblem,
        deadline: Instant,
    ) -> Result<Solution, AllocatorError> {
        let start = Instant::now();
        if start >= deadline {
            return Err(AllocatorError::Infeasible(
                "time budget exhausted before a feasible allocation was found".to_string(),
            ));
        }

        let mut stats = SearchStats::default();
        let mut labels = construct(problem);
        local_search(problem, &mut labels, deadline, &mut stats);
        let mut best_value = problem.objective(&labels);

        if problem.len() <= self.exact_search_limit {
            let mut search = BranchAndBound::new(problem, labels.clone(), best_value, deadline);
            search.run(&mut stats);
            stats.proven_optimal = !search.timed_out;
            stats.timed_out = search.timed_out;
            labels = search.best;
            best_value = search.best_value;
        } else {
            let mut rng = StdRng::seed_from_u64(self.seed);
            for _ in 0..self.local_search_rounds {
                if Instant::now() >= deadline {
                    stats.timed_out = true;
                    break;
                }
                stats.record_restart();
                let mut candidate = labels.clone();
                perturb(problem, &mut candidate, &mut rng);
                local_search(problem, &mut candidate, deadline, &mut stats);
                let value = problem.objective(&candidate);
                if value > best_value + EPSILON {
                    labels = candidate;
                    best_value = value;
                }
            }
        }

        stats.elapsed = start.elapsed();
        if stats.timed_out {
            warn!(elapsed = ?stats.elapsed, "Solver time budget reached, returning best allocation found");
        }
        debug!(objective = best_value, stats = %stats.summary(), "Solver finished");
        Ok(Solution {
            labels,
            objective: best_value,
            stats,
        })
    }
}

/// Best-insertion construction in member order
fn construct(problem: &AllocationProblem) -> Vec<usize> {
    let n = problem.len();
    let k = problem.group_count();
    let mut tracker = SizeTracker::new(problem);
    let mut labels = vec![usize::MAX; n];

    for i in 0..n {
        let mut gain = vec![0.0; k];
        gain[problem.hint(i)] += problem.hint_weight();
        for &(j, w) in problem.neighbors(i) {
            if labels[j] != usize::MAX {
                gain[labels[j]] += w;
            }
        }

        let mut choice = None;
        for g in (0..k).filter(|&g| tracker.can_add(g)) {
            match choice {
                Some(best) if gain[g] <= gain[best] + EPSILON => {}
                _ => choice = Some(g),
            }
        }
        // The tracker always leaves room for every remaining member
        let g = choice.unwrap_or(0);
        tracker.add(g);
        labels[i] = g;
    }
    labels
}

/// First-improvement local search over moves and swaps
fn local_search(
    problem: &AllocationProblem,
    labels: &mut [usize],
    deadline: Instant,
    stats: &mut SearchStats,
) {
    let n = problem.len();
    let k = problem.group_count();
    let (floor, ceil) = problem.bounds();
    let mut sizes = problem.group_sizes(labels);

    let mut improved = true;
    while improved {
        improved = false;
        for i in 0..n {
            if Instant::now() >= deadline {
                stats.timed_out = true;
                return;
            }

            if floor < ceil && sizes[labels[i]] > floor {
                for to in 0..k {
                    if to != labels[i]
                        && sizes[to] < ceil
                        && problem.delta_move(labels, i, to) > EPSILON
                    {
                        sizes[labels[i]] -= 1;
                        sizes[to] += 1;
                        labels[i] = to;
                        stats.record_move();
                        improved = true;
                        break;
                    }
                }
            }

            for j in (i + 1)..n {
                if labels[i] != labels[j] && problem.delta_swap(labels, i, j) > EPSILON {
                    labels.swap(i, j);
                    stats.record_swap();
                    improved = true;
                }
            }
        }
    }
}

/// Random swaps of members in different groups
fn perturb(problem: &AllocationProblem, labels: &mut [usize], rng: &mut StdRng) {
    let n = problem.len();
    if n < 2 || problem.group_count() < 2 {
        return;
    }
    let swaps = (n / 10).max(2);
    for _ in 0..swaps {
        let i = rng.gen_range(0..n);
        let j = rng.gen_range(0..n);
        if labels[i] != labels[j] {
            labels.swap(i, j);
        }
    }
}

/// Exhaustive search with an optimistic bound
struct BranchAndBound<'a> {
    problem: &'a AllocationProblem,
    deadline: Instant,
    labels: Vec<usize>,
    tracker: SizeTracker,
    /// Positive pair weight of pairs whose later member is at index >= d
    positive_suffix: Vec<f64>,
    best: Vec<usize>,
    best_value: f64,
    nodes: u64,
    timed_out: bool,
}

impl<'a> BranchAndBound<'a> {
    fn new(problem: &'a AllocationProblem, best: Vec<usize>, best_value: f64, deadline: Instant) -> Self {
        let n = problem.len();
        let mut bucket = vec![0.0; n + 1];
        for i in 0..n {
            for &(j, w) in problem.neighbors(i) {
                if j > i && w > 0.0 {
                    bucket[j] += w;
                }
            }
        }
        let mut positive_suffix = vec![0.0; n + 1];
        for d in (0..n).rev() {
            positive_suffix[d] = positive_suffix[d + 1] + bucket[d];
        }

        Self {
            problem,
            deadline,
            labels: vec![usize::MAX; n],
            tracker: SizeTracker::new(problem),
            positive_suffix,
            best,
            best_value,
            nodes: 0,
            timed_out: false,
        }
    }

    fn run(&mut self, stats: &mut SearchStats) {
        self.branch(0, 0.0, stats);
    }

    fn branch(&mut self, depth: usize, value: f64, stats: &mut SearchStats) {
        if self.timed_out {
            return;
        }
        self.nodes += 1;
        stats.record_node();
        if self.nodes % DEADLINE_POLL == 0 && Instant::now() >= self.deadline {
            self.timed_out = true;
            return;
        }

        let n = self.problem.len();
        if depth == n {
            if value > self.best_value + EPSILON {
                self.best_value = value;
                self.best.copy_from_slice(&self.labels);
            }
            return;
        }

        let remaining = (n - depth) as f64;
        let bound = value + remaining * self.problem.hint_weight() + self.positive_suffix[depth];
        if bound <= self.best_value + EPSILON {
            return;
        }

        for g in 0..self.problem.group_count() {
            if !self.tracker.can_add(g) {
                continue;
            }
            let mut gain = if self.problem.hint(depth) == g {
                self.problem.hint_weight()
            } else {
                0.0
            };
            for &(j, w) in self.problem.neighbors(depth) {
                if j < depth && self.labels[j] == g {
                    gain += w;
                }
            }

            self.tracker.add(g);
            self.labels[depth] = g;
            self.branch(depth + 1, value + gain, stats);
            self.labels[depth] = usize::MAX;
            self.tracker.remove(g);
        }
    }
}
