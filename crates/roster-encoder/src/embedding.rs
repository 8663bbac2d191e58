//! Embedding output and the encoder trait

use crate::EncoderError;
use roster_domain::MemberId;
use roster_graph::CohortGraph;

/// Trait for graph encoders
///
/// An encoder is a pure function of the cohort graph: the same graph and
/// configuration always produce the same embeddings.
pub trait GraphEncoder {
    /// Produce one embedding per member of `graph`, in graph index order
    fn encode(&self, graph: &CohortGraph) -> Result<Embeddings, EncoderError>;

    /// Length of the produced vectors
    fn dimension(&self) -> usize;

    /// Identity of the encoder configuration, combined with the graph
    /// fingerprint to key cached embeddings
    fn cache_key(&self) -> String;
}

/// Loss trajectory of one training pass
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TrainingSummary {
    /// Iterations performed
    pub iterations: usize,

    /// Objective before the first step
    pub initial_loss: f64,

    /// Objective after the last step
    pub final_loss: f64,
}

/// Per-member embedding vectors, L2-normalized
///
/// A member whose encoded vector is exactly zero keeps the zero vector, so
/// not every row is guaranteed unit length. [`Embeddings::zero_members`]
/// lists those members; [`cosine_similarity`] treats them as unrelated to
/// everyone.
#[derive(Debug, Clone, PartialEq)]
pub struct Embeddings {
    member_ids: Vec<MemberId>,
    vectors: Vec<Vec<f64>>,
    dimension: usize,
    training: TrainingSummary,
}

impl Embeddings {
    /// Create embeddings aligned with `member_ids`
    pub fn new(
        member_ids: Vec<MemberId>,
        vectors: Vec<Vec<f64>>,
        training: TrainingSummary,
    ) -> Result<Self, EncoderError> {
        if member_ids.len() != vectors.len() {
            return Err(EncoderError::InvalidFeatures(format!(
                "{} members but {} vectors",
                member_ids.len(),
                vectors.len()
            )));
        }
        let dimension = vectors.first().map(Vec::len).unwrap_or(0);
        if vectors.iter().any(|v| v.len() != dimension) {
            return Err(EncoderError::InvalidFeatures(
                "embedding vectors differ in length".to_string(),
            ));
        }
        Ok(Self {
            member_ids,
            vectors,
            dimension,
            training,
        })
    }

    /// Number of embedded members
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Whether there are no embeddings
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Vector length
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Member ids in index order
    pub fn member_ids(&self) -> &[MemberId] {
        &self.member_ids
    }

    /// All vectors in index order
    pub fn vectors(&self) -> &[Vec<f64>] {
        &self.vectors
    }

    /// Vector of a member
    pub fn get(&self, member: MemberId) -> Option<&[f64]> {
        self.member_ids
            .iter()
            .position(|m| *m == member)
            .map(|i| self.vectors[i].as_slice())
    }

    /// Members whose vector is zero and therefore not unit length
    pub fn zero_members(&self) -> Vec<MemberId> {
        self.member_ids
            .iter()
            .zip(&self.vectors)
            .filter(|(_, v)| v.iter().all(|x| x.abs() <= 1e-12))
            .map(|(id, _)| *id)
            .collect()
    }

    /// Training summary of the pass that produced these vectors
    pub fn training(&self) -> TrainingSummary {
        self.training
    }
}

/// Calculate cosine similarity between two embedding vectors
///
/// Returns 0.0 for zero vectors or mismatched lengths.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot_product: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let magnitude_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let magnitude_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }
    dot_product / (magnitude_a * magnitude_b)
}
