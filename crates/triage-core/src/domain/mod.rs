//! Domain models for the triage planner.
//!
//! - `Incident`: one recorded test failure, as ingested
//! - `ScoredIncident`: an incident with its minute estimate and priority
//! - error taxonomy shared by every pipeline stage

pub mod error;
pub mod incident;

pub use error::{ConsistencyError, PolicyLoadError, RecordParseWarning, Result, TriageError};
pub use incident::{Incident, ScoredIncident, REQUIRED_FIELDS};
