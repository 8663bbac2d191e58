//! Roster Analysis
//!
//! Validates and reports on a finished assignment:
//!
//! - **Preservation**: per relation type and group, how many edges kept both
//!   endpoints together ([`PreservationAnalyzer`])
//! - **Centrality**: in-degree, out-degree and betweenness rankings for the
//!   whole cohort and for each group's induced subgraph ([`centrality`])
//! - **Profiles**: group sizes, attribute means and tie counts
//!   ([`group_profiles`])
//!
//! Everything is recomputed from the graph and the assignment, so a
//! reallocated run is analyzed exactly like a fresh one.
//!
//! # Examples
//!
//! ```no_run
//! use roster_analysis::PreservationAnalyzer;
//! # fn run(graph: &roster_graph::CohortGraph, assignment: &roster_domain::Assignment)
//! #     -> Result<(), roster_analysis::AnalysisError> {
//! let report = PreservationAnalyzer::default_config().analyze(graph, assignment)?;
//! for record in &report.records {
//!     println!("{} {} {:.1}%", record.group, record.relation, record.percentage());
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod centrality;
mod config;
mod error;
mod preservation;
mod profile;

pub use centrality::{CentralitySummary, RankedMember};
pub use config::AnalysisConfig;
pub use error::AnalysisError;
pub use preservation::{PreservationAnalyzer, PreservationReport, RelationPreservation};
pub use profile::{group_averages, group_profiles, GroupProfile};
