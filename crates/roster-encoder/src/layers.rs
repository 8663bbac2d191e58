//! Message-passing layers
//!
//! Messages flow along edge direction: a node aggregates over the members
//! that nominated it.

use crate::linalg::{dot, mean_aggregate, Matrix};
use rand::Rng;
use roster_domain::RelationType;
use roster_graph::CohortGraph;

/// Incoming neighbor lists derived from a cohort graph
#[derive(Debug, Clone)]
pub struct Neighborhoods {
    /// Neighbors over all relation types combined (deduplicated, ascending)
    pub combined: Vec<Vec<usize>>,

    /// Neighbors per relation type, indexed by [`RelationType::index`]
    pub by_relation: Vec<Vec<Vec<usize>>>,
}

impl Neighborhoods {
    /// Build neighbor lists for every member of `graph`
    pub fn from_graph(graph: &CohortGraph) -> Self {
        let n = graph.len();
        let mut combined = vec![Vec::new(); n];
        let mut by_relation = vec![vec![Vec::new(); n]; RelationType::COUNT];

        for relation in RelationType::ALL {
            for (source, target) in graph.edges(relation) {
                combined[*target].push(*source);
                by_relation[relation.index()][*target].push(*source);
            }
        }
        for list in &mut combined {
            list.sort_unstable();
            list.dedup();
        }

        Self {
            combined,
            by_relation,
        }
    }
}

fn zero_bias(dim: usize) -> Vec<f64> {
    vec![0.0; dim]
}

/// Mean-aggregation neighborhood layer
///
/// `h_i = W_self x_i + W_neigh · mean_{j→i} x_j + b`
#[derive(Debug, Clone)]
pub struct SageLayer {
    w_self: Matrix,
    w_neigh: Matrix,
    bias: Vec<f64>,
}

impl SageLayer {
    /// Create a layer with Glorot-initialized weights
    pub fn new<R: Rng>(input: usize, output: usize, rng: &mut R) -> Self {
        Self {
            w_self: Matrix::glorot(input, output, rng),
            w_neigh: Matrix::glorot(input, output, rng),
            bias: zero_bias(output),
        }
    }

    /// Forward pass
    pub fn forward(&self, x: &Matrix, neighbors: &[Vec<usize>]) -> Matrix {
        let aggregated = mean_aggregate(x, neighbors);
        let mut out = x.matmul(&self.w_self);
        out.add(&aggregated.matmul(&self.w_neigh));
        out.add_row_vector(&self.bias);
        out
    }
}

#[derive(Debug, Clone)]
struct AttentionHead {
    weight: Matrix,
    att_src: Vec<f64>,
    att_dst: Vec<f64>,
}

/// Multi-head attention over neighbors (self included), heads averaged
#[derive(Debug, Clone)]
pub struct AttentionLayer {
    heads: Vec<AttentionHead>,
    bias: Vec<f64>,
    negative_slope: f64,
}

impl AttentionLayer {
    /// Create a layer with `heads` attention heads
    pub fn new<R: Rng>(
        input: usize,
        output: usize,
        heads: usize,
        negative_slope: f64,
        rng: &mut R,
    ) -> Self {
        let heads = (0..heads.max(1))
            .map(|_| {
                let weight = Matrix::glorot(input, output, rng);
                let att = Matrix::glorot(2, output, rng);
                AttentionHead {
                    weight,
                    att_src: att.row(0).to_vec(),
                    att_dst: att.row(1).to_vec(),
                }
            })
            .collect();
        Self {
            heads,
            bias: zero_bias(output),
            negative_slope,
        }
    }

    fn leaky_relu(&self, v: f64) -> f64 {
        if v >= 0.0 {
            v
        } else {
            self.negative_slope * v
        }
    }

    /// Forward pass
    pub fn forward(&self, x: &Matrix, neighbors: &[Vec<usize>]) -> Matrix {
        let n = x.rows();
        let out_dim = self.bias.len();
        let mut out = Matrix::zeros(n, out_dim);
        let head_scale = 1.0 / self.heads.len() as f64;

        for head in &self.heads {
            let z = x.matmul(&head.weight);
            let src_scores: Vec<f64> = (0..n).map(|j| dot(z.row(j), &head.att_src)).collect();
            let dst_scores: Vec<f64> = (0..n).map(|i| dot(z.row(i), &head.att_dst)).collect();

            for i in 0..n {
                let mut candidates: Vec<usize> = Vec::with_capacity(neighbors[i].len() + 1);
                candidates.push(i);
                candidates.extend(neighbors[i].iter().copied().filter(|j| *j != i));

                let logits: Vec<f64> = candidates
                    .iter()
                    .map(|j| self.leaky_relu(dst_scores[i] + src_scores[*j]))
                    .collect();
                let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                let exps: Vec<f64> = logits.iter().map(|l| (l - max).exp()).collect();
                let total: f64 = exps.iter().sum();

                let dst = out.row_mut(i);
                for (j, e) in candidates.iter().zip(&exps) {
                    let alpha = e / total * head_scale;
                    for (d, v) in dst.iter_mut().zip(z.row(*j)) {
                        *d += alpha * v;
                    }
                }
            }
        }

        out.add_row_vector(&self.bias);
        out
    }
}

/// Relation-aware layer with one transform per relation type
///
/// `h_i = W_root x_i + Σ_r W_r · mean_{j →_r i} x_j + b`
#[derive(Debug, Clone)]
pub struct RelationalLayer {
    w_root: Matrix,
    w_relation: Vec<Matrix>,
    bias: Vec<f64>,
}

impl RelationalLayer {
    /// Create a layer with one weight matrix per relation type
    pub fn new<R: Rng>(input: usize, output: usize, rng: &mut R) -> Self {
        Self {
            w_root: Matrix::glorot(input, output, rng),
            w_relation: (0..RelationType::COUNT)
                .map(|_| Matrix::glorot(input, output, rng))
                .collect(),
            bias: zero_bias(output),
        }
    }

    /// Forward pass
    pub fn forward(&self, x: &Matrix, neighborhoods: &Neighborhoods) -> Matrix {
        let mut out = x.matmul(&self.w_root);
        for (weight, neighbors) in self.w_relation.iter().zip(&neighborhoods.by_relation) {
            if neighbors.iter().all(Vec::is_empty) {
                continue;
            }
            out.add(&mean_aggregate(x, neighbors).matmul(weight));
        }
        out.add_row_vector(&self.bias);
        out
    }
}

/// Fully connected layer, trained by the encoder
#[derive(Debug, Clone)]
pub struct Linear {
    pub(crate) weight: Matrix,
    pub(crate) bias: Vec<f64>,
}

impl Linear {
    /// Create a layer with Glorot-initialized weights
    pub fn new<R: Rng>(input: usize, output: usize, rng: &mut R) -> Self {
        Self {
            weight: Matrix::glorot(input, output, rng),
            bias: zero_bias(output),
        }
    }

    /// Forward pass
    pub fn forward(&self, x: &Matrix) -> Matrix {
        let mut out = x.matmul(&self.weight);
        out.add_row_vector(&self.bias);
        out
    }
}

/// Rectified linear unit
pub fn relu(v: f64) -> f64 {
    v.max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn test_sage_isolated_node_uses_self_only() {
        let mut rng = rng();
        let layer = SageLayer::new(2, 3, &mut rng);
        let x = Matrix::from_rows(&[vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap();

        let isolated = layer.forward(&x, &[vec![], vec![]]);
        let expected = x.matmul(&layer.w_self);
        assert_eq!(isolated, expected);
    }

    #[test]
    fn test_attention_single_node_returns_projection() {
        let mut rng = rng();
        let layer = AttentionLayer::new(2, 2, 2, 0.2, &mut rng);
        let x = Matrix::from_rows(&[vec![1.0, -1.0]]).unwrap();

        // Only the node itself is attended to; averaged heads of its own projection
        let out = layer.forward(&x, &[vec![]]);
        let mut expected = Matrix::zeros(1, 2);
        for head in &layer.heads {
            let z = x.matmul(&head.weight);
            for (e, v) in expected.row_mut(0).iter_mut().zip(z.row(0)) {
                *e += v / 2.0;
            }
        }
        for (a, b) in out.row(0).iter().zip(expected.row(0)) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn test_attention_weights_convex() {
        // Identity projection keeps outputs inside the neighbors' hull
        let mut layer = AttentionLayer::new(1, 1, 1, 0.2, &mut rng());
        layer.heads[0].weight = Matrix::from_rows(&[vec![1.0]]).unwrap();
        let x = Matrix::from_rows(&[vec![0.0], vec![10.0], vec![-4.0]]).unwrap();

        let out = layer.forward(&x, &[vec![1, 2], vec![], vec![]]);
        assert!(out.get(0, 0) <= 10.0 && out.get(0, 0) >= -4.0);
        assert_eq!(out.get(1, 0), 10.0);
    }

    #[test]
    fn test_relational_layer_separates_relations() {
        let mut rng = rng();
        let layer = RelationalLayer::new(1, 1, &mut rng);
        let x = Matrix::from_rows(&[vec![1.0], vec![2.0]]).unwrap();

        let mut friend = Neighborhoods {
            combined: vec![vec![1], vec![]],
            by_relation: vec![vec![vec![], vec![]]; RelationType::COUNT],
        };
        let mut rival = friend.clone();
        friend.by_relation[RelationType::Friend.index()][0] = vec![1];
        rival.by_relation[RelationType::Disrespect.index()][0] = vec![1];

        let a = layer.forward(&x, &friend);
        let b = layer.forward(&x, &rival);
        assert_ne!(a.get(0, 0), b.get(0, 0));
        // Node 1 has no incoming edges in either case
        assert_eq!(a.get(1, 0), b.get(1, 0));
    }

    #[test]
    fn test_relu() {
        assert_eq!(relu(-1.0), 0.0);
        assert_eq!(relu(2.5), 2.5);
    }
}
