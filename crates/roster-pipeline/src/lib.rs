//! Roster Pipeline
//!
//! Orchestrates one allocation run through five stages:
//!
//! 1. **Graph**: load a cohort snapshot and build the relational graph
//! 2. **Encode**: learn member embeddings (cached per snapshot)
//! 3. **Hint**: cluster embeddings into advisory group labels
//! 4. **Allocate**: search for a balanced assignment under the objective
//! 5. **Analyze**: compute preservation and group averages, then persist
//!
//! Each stage advances the run's lifecycle; the run is written in a single
//! transaction only after all five succeed. [`Pipeline::reallocate`] applies
//! a manual correction as a new run, and [`PipelineWorker`] runs several
//! allocations in parallel.
//!
//! # Examples
//!
//! ```no_run
//! use roster_pipeline::{AllocationRequest, Pipeline, PipelineConfig};
//! use roster_store::SqliteStore;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut store = SqliteStore::new("roster.db")?;
//! let pipeline = Pipeline::new(PipelineConfig::fast())?;
//!
//! let result = pipeline.allocate(&mut store, &AllocationRequest::new("2025", 4))?;
//! for (group, members) in &result.groups {
//!     println!("{}: {} members", group, members.len());
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod pipeline;
mod types;
mod worker;

pub use config::PipelineConfig;
pub use error::PipelineError;
pub use pipeline::Pipeline;
pub use types::{AllocationRequest, AllocationResult, AnalysisResult, ReallocationResult};
pub use worker::PipelineWorker;
