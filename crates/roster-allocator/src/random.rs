//! Seeded random baseline

use crate::{AllocationPolicy, AllocationProblem, AllocatorError, SearchStats, Solution};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::time::Instant;

/// Shuffles members with a fixed seed and deals them round-robin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RandomPolicy {
    seed: u64,
}

impl RandomPolicy {
    /// Create a random policy
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl AllocationPolicy for RandomPolicy {
    fn name(&self) -> &'static str {
        "random"
    }

    fn allocate(
        &self,
        problem: &AllocationProblem,
        _deadline: Instant,
    ) -> Result<Solution, AllocatorError> {
        let start = Instant::now();
        let k = problem.group_count();
        let mut order: Vec<usize> = (0..problem.len()).collect();
        order.shuffle(&mut StdRng::seed_from_u64(self.seed));

        let mut labels = vec![0; problem.len()];
        for (position, i) in order.into_iter().enumerate() {
            labels[i] = position % k;
        }

        Ok(Solution {
            objective: problem.objective(&labels),
            labels,
            stats: SearchStats {
                elapsed: start.elapsed(),
                ..SearchStats::default()
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{HintLabels, ObjectiveWeights};
    use roster_domain::{Member, MemberId};
    use roster_graph::GraphBuilder;

    fn problem(n: u64, k: usize) -> AllocationProblem {
        let members = (1..=n).map(|id| Member::new(MemberId::new(id), "c")).collect();
        let g = GraphBuilder::default_config()
            .build_snapshot("c", members, Vec::new())
            .unwrap()
            .0;
        let hints = HintLabels {
            labels: vec![0; n as usize],
            inertia: 0.0,
            iterations: 1,
        };
        AllocationProblem::new(&g, &hints, k, &ObjectiveWeights::default()).unwrap()
    }

    #[test]
    fn test_balanced_and_seeded() {
        let p = problem(11, 3);
        let a = RandomPolicy::new(5).allocate(&p, Instant::now()).unwrap();
        let b = RandomPolicy::new(5).allocate(&p, Instant::now()).unwrap();

        assert!(p.is_feasible(&a.labels));
        assert_eq!(a.labels, b.labels);
    }
}
