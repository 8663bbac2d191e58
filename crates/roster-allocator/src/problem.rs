//! The weighted allocation problem shared by every policy

use crate::{AllocatorError, HintLabels, ObjectiveWeights};
use roster_domain::{size_bounds, Assignment, MemberId, RelationType};
use roster_graph::CohortGraph;
use std::collections::BTreeMap;

/// Improvements smaller than this are treated as ties
pub(crate) const EPSILON: f64 = 1e-9;

/// Objective and hard constraints of one allocation request
///
/// Members are addressed by graph index. Directed edges of every relation
/// type are folded into one symmetric weight per unordered pair: each
/// positive edge adds its weight, each negative edge subtracts it. A pair's
/// weight counts towards the objective when both members share a group.
#[derive(Debug, Clone)]
pub struct AllocationProblem {
    member_ids: Vec<MemberId>,
    group_count: usize,
    floor: usize,
    ceil: usize,
    hints: Vec<usize>,
    hint_weight: f64,
    neighbors: Vec<Vec<(usize, f64)>>,
    balance: Vec<f64>,
}

impl AllocationProblem {
    /// Build the problem for `k` groups over `graph`
    pub fn new(
        graph: &CohortGraph,
        hints: &HintLabels,
        k: usize,
        weights: &ObjectiveWeights,
    ) -> Result<Self, AllocatorError> {
        let n = graph.len();
        check_group_count(n, k)?;
        if hints.len() != n {
            return Err(AllocatorError::InvalidInput(format!(
                "{} hint labels for {} members",
                hints.len(),
                n
            )));
        }
        if let Some(bad) = hints.labels.iter().find(|&&l| l >= k) {
            return Err(AllocatorError::InvalidInput(format!(
                "hint label {} outside 0..{}",
                bad, k
            )));
        }

        let mut pairs: BTreeMap<(usize, usize), f64> = BTreeMap::new();
        for relation in RelationType::ALL {
            let w = weights.signed_weight(relation);
            for &(s, t) in graph.edges(relation) {
                if s == t {
                    continue;
                }
                *pairs.entry((s.min(t), s.max(t))).or_insert(0.0) += w;
            }
        }

        let mut neighbors = vec![Vec::new(); n];
        for ((a, b), w) in pairs {
            if w != 0.0 {
                neighbors[a].push((b, w));
                neighbors[b].push((a, w));
            }
        }
        for list in &mut neighbors {
            list.sort_by_key(|(j, _)| *j);
        }

        let (floor, ceil) = size_bounds(n, k);
        Ok(Self {
            member_ids: graph.member_ids(),
            group_count: k,
            floor,
            ceil,
            hints: hints.labels.clone(),
            hint_weight: weights.hint,
            neighbors,
            balance: vec![0.0; n],
        })
    }

    /// Use the raw values of `attribute` as the greedy balance key
    pub fn with_balance_attribute(mut self, graph: &CohortGraph, attribute: &str) -> Self {
        self.balance = (0..self.len()).map(|i| graph.raw_value(i, attribute)).collect();
        self
    }

    /// Number of members
    pub fn len(&self) -> usize {
        self.member_ids.len()
    }

    /// Whether there are no members
    pub fn is_empty(&self) -> bool {
        self.member_ids.is_empty()
    }

    /// Number of groups
    pub fn group_count(&self) -> usize {
        self.group_count
    }

    /// Size bounds `(⌊n/k⌋, ⌈n/k⌉)`
    pub fn bounds(&self) -> (usize, usize) {
        (self.floor, self.ceil)
    }

    /// Member ids in index order
    pub fn member_ids(&self) -> &[MemberId] {
        &self.member_ids
    }

    /// Hint label of member `i`
    pub fn hint(&self, i: usize) -> usize {
        self.hints[i]
    }

    /// Reward per member placed in its hinted group
    pub fn hint_weight(&self) -> f64 {
        self.hint_weight
    }

    /// Weighted neighbors of member `i`, sorted by index
    pub fn neighbors(&self, i: usize) -> &[(usize, f64)] {
        &self.neighbors[i]
    }

    /// Aggregated pair weight between `i` and `j`
    pub fn pair_weight(&self, i: usize, j: usize) -> f64 {
        self.neighbors[i]
            .binary_search_by_key(&j, |(other, _)| *other)
            .map(|pos| self.neighbors[i][pos].1)
            .unwrap_or(0.0)
    }

    /// Greedy balance value of member `i`
    pub fn balance_value(&self, i: usize) -> f64 {
        self.balance[i]
    }

    /// Objective value of a complete labelling (higher is better)
    pub fn objective(&self, labels: &[usize]) -> f64 {
        let hint: f64 = labels
            .iter()
            .zip(&self.hints)
            .filter(|(l, h)| l == h)
            .count() as f64
            * self.hint_weight;

        let mut pairs = 0.0;
        for (i, list) in self.neighbors.iter().enumerate() {
            for &(j, w) in list {
                if j > i && labels[i] == labels[j] {
                    pairs += w;
                }
            }
        }
        hint + pairs
    }

    /// Size of each group under `labels`
    pub fn group_sizes(&self, labels: &[usize]) -> Vec<usize> {
        let mut sizes = vec![0; self.group_count];
        for &l in labels {
            if l < self.group_count {
                sizes[l] += 1;
            }
        }
        sizes
    }

    /// Whether `labels` is total and every group size is within bounds
    pub fn is_feasible(&self, labels: &[usize]) -> bool {
        labels.len() == self.len()
            && labels.iter().all(|&l| l < self.group_count)
            && self
                .group_sizes(labels)
                .iter()
                .all(|&s| s >= self.floor && s <= self.ceil)
    }

    /// Objective change from moving member `i` to group `to`
    pub fn delta_move(&self, labels: &[usize], i: usize, to: usize) -> f64 {
        let from = labels[i];
        if from == to {
            return 0.0;
        }
        let mut delta = 0.0;
        if self.hints[i] == to {
            delta += self.hint_weight;
        }
        if self.hints[i] == from {
            delta -= self.hint_weight;
        }
        for &(j, w) in &self.neighbors[i] {
            if labels[j] == to {
                delta += w;
            } else if labels[j] == from {
                delta -= w;
            }
        }
        delta
    }

    /// Objective change from exchanging the groups of `i` and `j`
    pub fn delta_swap(&self, labels: &[usize], i: usize, j: usize) -> f64 {
        let (a, b) = (labels[i], labels[j]);
        if a == b {
            return 0.0;
        }
        // Each single move counts the i-j pair as joined; after the swap they are still apart
        self.delta_move(labels, i, b) + self.delta_move(labels, j, a) - 2.0 * self.pair_weight(i, j)
    }

    /// Convert a labelling to an [`Assignment`]
    pub fn to_assignment(&self, labels: &[usize]) -> Result<Assignment, AllocatorError> {
        Assignment::from_labels(&self.member_ids, labels, self.group_count)
            .map_err(|e| AllocatorError::InvalidInput(e.to_string()))
    }
}

/// Reject `k` outside `1..=n`
pub fn check_group_count(n: usize, k: usize) -> Result<(), AllocatorError> {
    if k == 0 {
        return Err(AllocatorError::Config("group count must be at least 1".to_string()));
    }
    if k > n {
        return Err(AllocatorError::Config(format!(
            "group count {} exceeds cohort size {}",
            k, n
        )));
    }
    Ok(())
}

/// Tracks group sizes so that a partial labelling can always be completed
/// within `(⌊n/k⌋, ⌈n/k⌉)`
///
/// Only `n mod k` groups may grow past the floor.
#[derive(Debug, Clone)]
pub(crate) struct SizeTracker {
    sizes: Vec<usize>,
    floor: usize,
    ceil: usize,
    ceil_slots: usize,
}

impl SizeTracker {
    pub(crate) fn new(problem: &AllocationProblem) -> Self {
        let k = problem.group_count();
        Self {
            sizes: vec![0; k],
            floor: problem.floor,
            ceil: problem.ceil,
            ceil_slots: problem.len() - problem.floor * k,
        }
    }

    pub(crate) fn can_add(&self, group: usize) -> bool {
        let size = self.sizes[group];
        size < self.floor || (size == self.floor && self.floor < self.ceil && self.ceil_slots > 0)
    }

    pub(crate) fn add(&mut self, group: usize) {
        if self.sizes[group] == self.floor && self.floor < self.ceil {
            self.ceil_slots -= 1;
        }
        self.sizes[group] += 1;
    }

    pub(crate) fn remove(&mut self, group: usize) {
        self.sizes[group] -= 1;
        if self.sizes[group] == self.floor && self.floor < self.ceil {
            self.ceil_slots += 1;
        }
    }

    pub(crate) fn size(&self, group: usize) -> usize {
        self.sizes[group]
    }
}
