//! Attribute-balanced greedy policy

use crate::problem::SizeTracker;
use crate::{AllocationPolicy, AllocationProblem, AllocatorError, SearchStats, Solution};
use std::cmp::Ordering;
use std::time::Instant;

/// Deals members, strongest first, to the eligible group with the lowest
/// running total of the balance attribute
///
/// Ties between members go to the lower index; ties between groups go to
/// the lower group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BalancedGreedyPolicy;

impl AllocationPolicy for BalancedGreedyPolicy {
    fn name(&self) -> &'static str {
        "greedy"
    }

    fn allocate(
        &self,
        problem: &AllocationProblem,
        _deadline: Instant,
    ) -> Result<Solution, AllocatorError> {
        let start = Instant::now();
        let n = problem.len();
        let k = problem.group_count();

        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| {
            problem
                .balance_value(b)
                .partial_cmp(&problem.balance_value(a))
                .unwrap_or(Ordering::Equal)
                .then(a.cmp(&b))
        });

        let mut tracker = SizeTracker::new(problem);
        let mut totals = vec![0.0; k];
        let mut labels = vec![0; n];
        for i in order {
            let group = (0..k)
                .filter(|&g| tracker.can_add(g))
                .min_by(|&a, &b| {
                    totals[a]
                        .partial_cmp(&totals[b])
                        .unwrap_or(Ordering::Equal)
                        .then(a.cmp(&b))
                })
                .ok_or_else(|| {
                    AllocatorError::Infeasible(format!("no group has room for member {}", i))
                })?;
            tracker.add(group);
            totals[group] += problem.balance_value(i);
            labels[i] = group;
        }

        let stats = SearchStats {
            elapsed: start.elapsed(),
            ..SearchStats::default()
        };
        Ok(Solution {
            objective: problem.objective(&labels),
            labels,
            stats,
        })
    }
}
