//! Roster Domain Layer
//!
//! This crate contains the core data model for Roster, the cohort-to-group
//! allocation system. It has no external dependencies besides `uuid` and
//! defines the fundamental concepts, value objects, and trait interfaces that
//! all other layers depend upon.
//!
//! ## Key Concepts
//!
//! - **Member**: A cohort member (student) with a numeric/categorical attribute set
//! - **Relationship edge**: A directed, typed tie between two members
//! - **Run**: One immutable execution of the allocation pipeline
//! - **Assignment**: Total function from member to group for a run
//! - **Preservation record**: Per group, per relation type edge retention
//!
//! ## Architecture
//!
//! - Pure data model and invariants only
//! - Infrastructure (SQLite, encoders, solvers) lives in other crates
//! - Trait definitions for all data access, injected explicitly into every stage

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod assignment;
pub mod error;
pub mod group;
pub mod member;
pub mod preservation;
pub mod relationship;
pub mod run;
pub mod traits;

// Re-exports for convenience
pub use assignment::{size_bounds, Assignment, AssignmentError};
pub use error::ErrorKind;
pub use group::GroupId;
pub use member::{AttributeValue, Member, MemberId};
pub use preservation::{IntraGroupEdge, PreservationRecord};
pub use relationship::{Polarity, RelationType, RelationshipEdge};
pub use run::{Run, RunId, RunRecord, RunStage, StageError, MANUAL_POLICY};
