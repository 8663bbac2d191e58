//! Roster Encoder
//!
//! Maps every cohort member to a fixed-length, L2-normalized embedding that
//! reflects its own attributes and its relationship neighborhood.
//!
//! # Architecture
//!
//! - **Neighborhood aggregation**: two mean-aggregation layers over all ties
//! - **Attention refinement**: multi-head attention over each member's nominators
//! - **Relation-aware transform**: a separate weight matrix per relation type
//! - **Fusion**: concatenation of the stages, a linear projection, L2 normalization
//!
//! Weights are initialized from a fixed seed, so encoding is deterministic
//! for a given graph and configuration. No model state outlives a call;
//! [`EmbeddingCache`] can be layered on top to skip recomputation for an
//! unchanged cohort snapshot.
//!
//! # Examples
//!
//! ```no_run
//! use roster_encoder::{EmbeddingCache, RelationalGraphEncoder};
//! # fn run(graph: &roster_graph::CohortGraph) -> Result<(), roster_encoder::EncoderError> {
//! let encoder = RelationalGraphEncoder::default_config();
//! let mut cache = EmbeddingCache::new(16);
//!
//! let embeddings = cache.get_or_encode(graph, &encoder)?;
//! println!("{} x {}", embeddings.len(), embeddings.dimension());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod cache;
mod config;
mod embedding;
mod error;
pub mod layers;
pub mod linalg;
mod model;

pub use cache::{CacheStats, EmbeddingCache};
pub use config::EncoderConfig;
pub use embedding::{cosine_similarity, Embeddings, GraphEncoder, TrainingSummary};
pub use error::EncoderError;
pub use model::RelationalGraphEncoder;
