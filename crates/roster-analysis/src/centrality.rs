//! Degree and betweenness centrality over directed relationship edges
//!
//! Nodes are the endpoints of the edges passed in, so isolated members do
//! not appear. Parallel edges collapse into one; self-loops count towards
//! degree but never lie on a shortest path.

use roster_domain::MemberId;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// One entry of a top-N ranking
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedMember {
    /// Ranked member
    pub member: MemberId,

    /// Metric value
    pub value: f64,
}

/// Size and top-N centrality rankings of one directed network
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CentralitySummary {
    /// Distinct members touching an edge
    pub nodes: usize,

    /// Distinct directed edges
    pub edges: usize,

    /// Most nominated members
    pub top_in_degree: Vec<RankedMember>,

    /// Most nominating members
    pub top_out_degree: Vec<RankedMember>,

    /// Members most often on shortest paths between others
    pub top_betweenness: Vec<RankedMember>,
}

/// Summarize a directed network given as `(source, target)` pairs
///
/// Rankings are ordered by value descending, ties by member id.
pub fn summarize(edges: &[(MemberId, MemberId)], top_n: usize) -> CentralitySummary {
    let unique: BTreeSet<(MemberId, MemberId)> = edges.iter().copied().collect();
    let nodes: Vec<MemberId> = unique
        .iter()
        .flat_map(|(s, t)| [*s, *t])
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    if nodes.is_empty() {
        return CentralitySummary::default();
    }

    let mut in_degree: BTreeMap<MemberId, f64> = nodes.iter().map(|m| (*m, 0.0)).collect();
    let mut out_degree = in_degree.clone();
    for (s, t) in &unique {
        *out_degree.entry(*s).or_default() += 1.0;
        *in_degree.entry(*t).or_default() += 1.0;
    }

    let between = betweenness(&nodes, &unique);

    CentralitySummary {
        nodes: nodes.len(),
        edges: unique.len(),
        top_in_degree: top(in_degree, top_n),
        top_out_degree: top(out_degree, top_n),
        top_betweenness: top(between, top_n),
    }
}

/// Brandes betweenness for an unweighted directed graph
///
/// Normalized by `1 / ((n - 1)(n - 2))` when `n > 2`.
pub fn betweenness(
    nodes: &[MemberId],
    edges: &BTreeSet<(MemberId, MemberId)>,
) -> BTreeMap<MemberId, f64> {
    let n = nodes.len();
    let index: BTreeMap<MemberId, usize> = nodes.iter().enumerate().map(|(i, m)| (*m, i)).collect();
    let mut adjacency = vec![Vec::new(); n];
    for (s, t) in edges {
        if s == t {
            continue;
        }
        if let (Some(&a), Some(&b)) = (index.get(s), index.get(t)) {
            adjacency[a].push(b);
        }
    }

    let mut centrality = vec![0.0; n];
    for source in 0..n {
        let mut stack = Vec::with_capacity(n);
        let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut sigma = vec![0.0; n];
        let mut distance = vec![-1i64; n];
        sigma[source] = 1.0;
        distance[source] = 0;

        let mut queue = VecDeque::from([source]);
        while let Some(v) = queue.pop_front() {
            stack.push(v);
            for &w in &adjacency[v] {
                if distance[w] < 0 {
                    distance[w] = distance[v] + 1;
                    queue.push_back(w);
                }
                if distance[w] == distance[v] + 1 {
                    sigma[w] += sigma[v];
                    predecessors[w].push(v);
                }
            }
        }

        let mut delta = vec![0.0; n];
        while let Some(w) = stack.pop() {
            for &v in &predecessors[w] {
                delta[v] += sigma[v] / sigma[w] * (1.0 + delta[w]);
            }
            if w != source {
                centrality[w] += delta[w];
            }
        }
    }

    let scale = if n > 2 {
        1.0 / ((n - 1) * (n - 2)) as f64
    } else {
        1.0
    };
    nodes
        .iter()
        .zip(centrality)
        .map(|(m, c)| (*m, c * scale))
        .collect()
}

fn top(values: BTreeMap<MemberId, f64>, top_n: usize) -> Vec<RankedMember> {
    let mut ranked: Vec<RankedMember> = values
        .into_iter()
        .map(|(member, value)| RankedMember { member, value })
        .collect();
    ranked.sort_by(|a, b| {
        b.value
            .partial_cmp(&a.value)
            .unwrap_or(Ordering::Equal)
            .then(a.member.cmp(&b.member))
    });
    ranked.truncate(top_n);
    ranked
}
