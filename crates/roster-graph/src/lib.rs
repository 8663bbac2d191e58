//! Roster Graph
//!
//! Turns a cohort snapshot into a validated, normalized relationship graph.
//!
//! # Overview
//!
//! The builder:
//! - **Loads** members and one edge list per relation type through a [`CohortSource`](roster_domain::traits::CohortSource)
//! - **Coerces** missing or non-numeric attributes to a configurable default
//! - **Encodes** categorical attributes as small integer codes
//! - **Standardizes** feature columns across the cohort
//! - **Drops** edges with unknown endpoints, self-nominations and duplicates,
//!   recording every drop in [`GraphDiagnostics`]
//!
//! # Usage
//!
//! ```no_run
//! use roster_graph::GraphBuilder;
//! use roster_store::SqliteStore;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = SqliteStore::new("roster.db")?;
//! let builder = GraphBuilder::default_config();
//!
//! let (graph, diagnostics) = builder.build(&store, "2025")?;
//! println!("{} members, {} edges", graph.len(), graph.edge_count());
//! println!("{}", diagnostics.summary());
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! ```toml
//! numeric_attributes = ["perc_academic", "perc_effort", "attendance", "complete_years"]
//! categorical_attributes = ["house"]
//! missing_value = 0.0
//! standardize = true
//! ```

#![warn(missing_docs)]

mod builder;
mod config;
mod diagnostics;
mod error;
mod graph;

pub use builder::{standardize_columns, GraphBuilder};
pub use config::GraphConfig;
pub use diagnostics::GraphDiagnostics;
pub use error::GraphError;
pub use graph::CohortGraph;
