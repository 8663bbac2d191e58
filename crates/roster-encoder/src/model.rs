//! Relational graph encoder
//!
//! Four stages of message passing followed by a trained fusion layer:
//!
//! 1. two mean-aggregation layers smooth each member over its neighborhood
//! 2. an attention layer reweights neighbors by learned relevance
//! 3. a relation-aware layer keeps each relation type's transform separate
//! 4. the outputs of 1–3 are concatenated and projected by a linear fusion
//!    layer, then L2-normalized
//!
//! Only the fusion layer is trained. The objective is the mean squared norm
//! of the fused output, which acts as a regularizer rather than a
//! supervised signal: there are no group labels to learn from.

use crate::layers::{relu, AttentionLayer, Linear, Neighborhoods, RelationalLayer, SageLayer};
use crate::linalg::Matrix;
use crate::{EncoderConfig, EncoderError, Embeddings, GraphEncoder, TrainingSummary};
use rand::rngs::StdRng;
use rand::SeedableRng;
use roster_graph::CohortGraph;
use tracing::debug;

/// Deterministic relational graph encoder
///
/// # Examples
///
/// ```no_run
/// use roster_encoder::{EncoderConfig, GraphEncoder, RelationalGraphEncoder};
/// # fn encode(graph: &roster_graph::CohortGraph) -> Result<(), roster_encoder::EncoderError> {
/// let encoder = RelationalGraphEncoder::new(EncoderConfig::default())?;
/// let embeddings = encoder.encode(graph)?;
/// assert_eq!(embeddings.dimension(), 16);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RelationalGraphEncoder {
    config: EncoderConfig,
}

struct Network {
    sage1: SageLayer,
    sage2: SageLayer,
    attention: AttentionLayer,
    relational: RelationalLayer,
    fusion: Linear,
}

impl Network {
    fn new(input: usize, config: &EncoderConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let hidden = config.hidden_dim;
        Self {
            sage1: SageLayer::new(input, hidden, &mut rng),
            sage2: SageLayer::new(hidden, hidden, &mut rng),
            attention: AttentionLayer::new(
                hidden,
                hidden,
                config.attention_heads,
                config.negative_slope,
                &mut rng,
            ),
            relational: RelationalLayer::new(hidden, hidden, &mut rng),
            fusion: Linear::new(3 * hidden, config.embedding_dim, &mut rng),
        }
    }

    /// Concatenated stage outputs (n × 3·hidden); fixed during training
    fn propagate(&self, x: &Matrix, neighborhoods: &Neighborhoods) -> Matrix {
        let mut smoothed = self.sage1.forward(x, &neighborhoods.combined);
        smoothed.map_inplace(relu);
        let mut smoothed = self.sage2.forward(&smoothed, &neighborhoods.combined);
        smoothed.map_inplace(relu);

        let mut attended = self.attention.forward(&smoothed, &neighborhoods.combined);
        attended.map_inplace(relu);

        let relational = self.relational.forward(&attended, neighborhoods);

        Matrix::hstack(&[&smoothed, &attended, &relational])
    }
}

impl RelationalGraphEncoder {
    /// Create an encoder with the given configuration
    pub fn new(config: EncoderConfig) -> Result<Self, EncoderError> {
        config.validate().map_err(EncoderError::Config)?;
        Ok(Self { config })
    }

    /// Create an encoder with default configuration
    pub fn default_config() -> Self {
        Self {
            config: EncoderConfig::default(),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Gradient descent on the fusion layer minimizing `mean ||W z + b||²`
    fn train_fusion(&self, fusion: &mut Linear, fused: &Matrix) -> Result<TrainingSummary, EncoderError> {
        let n = fused.rows() as f64;
        let initial_loss = fusion.forward(fused).mean_squared_norm();

        for _ in 0..self.config.iterations {
            let out = fusion.forward(fused);

            // dL/dW = (2/n) Zᵀ·out, dL/db = (2/n) Σ out_i
            let mut grad_w = Matrix::zeros(fusion.weight.rows(), fusion.weight.cols());
            let mut grad_b = vec![0.0; fusion.bias.len()];
            for i in 0..fused.rows() {
                let z = fused.row(i);
                let o = out.row(i);
                for (k, zk) in z.iter().enumerate() {
                    if *zk == 0.0 {
                        continue;
                    }
                    for (g, ov) in grad_w.row_mut(k).iter_mut().zip(o) {
                        *g += 2.0 * zk * ov / n;
                    }
                }
                for (g, ov) in grad_b.iter_mut().zip(o) {
                    *g += 2.0 * ov / n;
                }
            }

            let norm = (grad_w.data().iter().map(|g| g * g).sum::<f64>()
                + grad_b.iter().map(|g| g * g).sum::<f64>())
            .sqrt();
            let scale = if norm > self.config.gradient_clip {
                self.config.gradient_clip / norm
            } else {
                1.0
            };
            let step = self.config.learning_rate * scale;

            for (w, g) in fusion.weight.data_mut().iter_mut().zip(grad_w.data()) {
                *w -= step * g;
            }
            for (b, g) in fusion.bias.iter_mut().zip(&grad_b) {
                *b -= step * g;
            }
        }

        let final_loss = fusion.forward(fused).mean_squared_norm();
        if !final_loss.is_finite() {
            return Err(EncoderError::TrainingFailed(format!(
                "loss is not finite after {} iterations",
                self.config.iterations
            )));
        }

        Ok(TrainingSummary {
            iterations: self.config.iterations,
            initial_loss,
            final_loss,
        })
    }
}

impl GraphEncoder for RelationalGraphEncoder {
    fn encode(&self, graph: &CohortGraph) -> Result<Embeddings, EncoderError> {
        if graph.is_empty() {
            return Err(EncoderError::EmptyGraph);
        }
        let x = Matrix::from_rows(graph.features())
            .ok_or_else(|| EncoderError::InvalidFeatures("ragged feature matrix".to_string()))?;
        if !x.is_finite() {
            return Err(EncoderError::InvalidFeatures(
                "feature matrix contains non-finite values".to_string(),
            ));
        }

        let neighborhoods = Neighborhoods::from_graph(graph);
        let mut network = Network::new(x.cols(), &self.config);
        let fused = network.propagate(&x, &neighborhoods);

        let training = self.train_fusion(&mut network.fusion, &fused)?;
        debug!(
            cohort = graph.cohort(),
            members = graph.len(),
            iterations = training.iterations,
            initial_loss = training.initial_loss,
            final_loss = training.final_loss,
            "Trained fusion layer"
        );

        let mut embeddings = network.fusion.forward(&fused);
        embeddings.l2_normalize_rows();

        Embeddings::new(graph.member_ids(), embeddings.to_rows(), training)
    }

    fn dimension(&self) -> usize {
        self.config.embedding_dim
    }

    fn cache_key(&self) -> String {
        self.config.cache_key()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roster_domain::member::attributes;
    use roster_domain::{Member, MemberId, RelationType, RelationshipEdge};
    use roster_graph::{GraphBuilder, GraphConfig};

    fn graph(n: u64, edges: &[(u64, u64, RelationType)]) -> CohortGraph {
        let members = (1..=n)
            .map(|id| {
                Member::new(MemberId::new(id), "2025")
                    .with_attribute(attributes::ACADEMIC, (id * 7 % 10) as f64)
                    .with_attribute(attributes::EFFORT, (id * 3 % 5) as f64)
            })
            .collect();
        let edges = edges
            .iter()
            .map(|(s, t, r)| RelationshipEdge::new(MemberId::new(*s), MemberId::new(*t), *r))
            .collect();
        let config = GraphConfig {
            numeric_attributes: vec![attributes::ACADEMIC.to_string(), attributes::EFFORT.to_string()],
            categorical_attributes: vec![],
            ..GraphConfig::default()
        };
        GraphBuilder::new(config)
            .unwrap()
            .build_snapshot("2025", members, edges)
            .unwrap()
            .0
    }

    fn encoder() -> RelationalGraphEncoder {
        RelationalGraphEncoder::new(EncoderConfig::fast()).unwrap()
    }

    #[test]
    fn test_output_shape_and_normalization() {
        let g = graph(6, &[(1, 2, RelationType::Friend), (3, 4, RelationType::Disrespect)]);
        let embeddings = encoder().encode(&g).unwrap();

        assert_eq!(embeddings.len(), 6);
        assert_eq!(embeddings.dimension(), 8);
        for v in embeddings.vectors() {
            let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt();
            assert!(norm == 0.0 || (norm - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let g = graph(5, &[(1, 2, RelationType::Friend), (2, 3, RelationType::Advice)]);
        let a = encoder().encode(&g).unwrap();
        let b = encoder().encode(&g).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_edges_change_embeddings() {
        let plain = graph(4, &[]);
        let linked = graph(4, &[(1, 2, RelationType::Friend), (2, 1, RelationType::Friend)]);
        let a = encoder().encode(&plain).unwrap();
        let b = encoder().encode(&linked).unwrap();
        assert_ne!(a.get(MemberId::new(2)), b.get(MemberId::new(2)));
    }

    #[test]
    fn test_training_summary_reported() {
        let g = graph(8, &[(1, 2, RelationType::Friend), (3, 4, RelationType::Influence)]);
        let embeddings = encoder().encode(&g).unwrap();
        let training = embeddings.training();
        assert_eq!(training.iterations, 50);
        assert!(training.initial_loss.is_finite());
        assert!(training.final_loss.is_finite());
    }

    #[test]
    fn test_fusion_training_reduces_norm() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut fusion = Linear::new(2, 2, &mut rng);
        let fused = Matrix::from_rows(&[vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap();

        let summary = encoder().train_fusion(&mut fusion, &fused).unwrap();
        assert!(summary.final_loss < summary.initial_loss);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = EncoderConfig {
            hidden_dim: 0,
            ..EncoderConfig::default()
        };
        assert!(matches!(RelationalGraphEncoder::new(config), Err(EncoderError::Config(_))));
    }

    #[test]
    fn test_single_member_graph() {
        let g = graph(1, &[]);
        let embeddings = encoder().encode(&g).unwrap();
        assert_eq!(embeddings.len(), 1);
    }
}
