//! Search statistics reported with every solution

use std::time::Duration;

/// Counters collected while a policy searches for an allocation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchStats {
    /// Branch-and-bound nodes visited
    pub nodes_explored: u64,

    /// Single-member moves that improved the objective
    pub improving_moves: u64,

    /// Pairwise swaps that improved the objective
    pub improving_swaps: u64,

    /// Perturbation restarts performed
    pub restarts: u64,

    /// Wall-clock time spent inside the policy
    pub elapsed: Duration,

    /// Exhaustive search completed without hitting the deadline
    pub proven_optimal: bool,

    /// The deadline cut the search short
    pub timed_out: bool,
}

impl SearchStats {
    /// Record one branch-and-bound node
    pub fn record_node(&mut self) {
        self.nodes_explored += 1;
    }

    /// Record an improving move
    pub fn record_move(&mut self) {
        self.improving_moves += 1;
    }

    /// Record an improving swap
    pub fn record_swap(&mut self) {
        self.improving_swaps += 1;
    }

    /// Record a perturbation restart
    pub fn record_restart(&mut self) {
        self.restarts += 1;
    }

    /// Get summary string
    pub fn summary(&self) -> String {
        format!(
            "nodes: {}, moves: {}, swaps: {}, restarts: {}, elapsed: {:.3}s{}{}",
            self.nodes_explored,
            self.improving_moves,
            self.improving_swaps,
            self.restarts,
            self.elapsed.as_secs_f64(),
            if self.proven_optimal { ", optimal" } else { "" },
            if self.timed_out { ", timed out" } else { "" },
        )
    }
}
