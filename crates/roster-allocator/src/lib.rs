//! Roster Allocator
//!
//! Turns member embeddings and the typed relationship graph into a balanced
//! partition of the cohort into `k` groups.
//!
//! # Pipeline
//!
//! 1. [`HintClusterer`] clusters embeddings into advisory hint labels.
//! 2. [`AllocationProblem`] folds hints and typed edges into one weighted
//!    objective: `+hint` per member kept in its hinted group, `+w_pos` per
//!    positive edge kept inside a group, `-w_neg` per disrespect edge kept
//!    inside a group.
//! 3. An [`AllocationPolicy`] picks labels subject to every group size lying
//!    in `[⌊n/k⌋, ⌈n/k⌉]`:
//!    - [`SolverPolicy`]: branch-and-bound for small cohorts, local search
//!      with restarts otherwise, bounded by a wall-clock deadline
//!    - [`BalancedGreedyPolicy`]: balances a numeric attribute across groups
//!    - [`RandomPolicy`]: seeded baseline
//!
//! # Examples
//!
//! ```no_run
//! use roster_allocator::{AllocatorConfig, ConstrainedAllocator, PolicyKind};
//! # fn run(graph: &roster_graph::CohortGraph, embeddings: &roster_encoder::Embeddings)
//! #     -> Result<(), roster_allocator::AllocatorError> {
//! let config = AllocatorConfig {
//!     policy: PolicyKind::Greedy,
//!     ..AllocatorConfig::default()
//! };
//! let allocator = ConstrainedAllocator::new(config)?;
//! let hints = allocator.hint(embeddings, 3)?;
//! let outcome = allocator.allocate(graph, &hints, 3)?;
//! for (group, members) in outcome.assignment.groups() {
//!     println!("{}: {:?}", group, members);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod greedy;
mod hint;
mod metrics;
mod policy;
mod problem;
mod random;
mod solver;

pub use config::{AllocatorConfig, ObjectiveWeights, PolicyKind};
pub use error::AllocatorError;
pub use greedy::BalancedGreedyPolicy;
pub use hint::{HintClusterer, HintLabels};
pub use metrics::SearchStats;
pub use policy::{AllocationOutcome, AllocationPolicy, ConstrainedAllocator, Solution};
pub use problem::{check_group_count, AllocationProblem};
pub use random::RandomPolicy;
pub use solver::SolverPolicy;
