//! Error taxonomy for the triage pipeline.
//!
//! Two error families are fatal: [`PolicyLoadError`] (bad configuration) and
//! [`ConsistencyError`] (a scored plan that does not match its independent
//! re-derivation). Malformed input lines are recovered as
//! [`RecordParseWarning`] values and never abort a run.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// The policy document could not be read or is not a structured mapping.
#[derive(Debug, thiserror::Error)]
pub enum PolicyLoadError {
    #[error("failed to read policy {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("policy is not valid YAML or has a malformed section: {0}")]
    Parse(#[from] serde_yaml_ng::Error),

    #[error("policy must be a mapping at the top level, found {found}")]
    NotAMapping { found: String },
}

/// A single input line that was skipped during ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordParseWarning {
    /// 1-based line number in the input stream.
    pub line: usize,
    /// Parser message for the rejected line.
    pub reason: String,
}

impl std::fmt::Display for RecordParseWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "skipping malformed record on line {}: {}", self.line, self.reason)
    }
}

/// A scored plan failed an internal-consistency check.
///
/// This always indicates a defect in scoring or ranking (or a tampered plan
/// file); the pipeline halts instead of correcting the record.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConsistencyError {
    #[error("plan contains no incidents")]
    EmptyPlan,

    #[error("plan document must be a JSON array of incidents")]
    NotAnArray,

    #[error("incident {index}: missing required field {field}")]
    MissingField { index: usize, field: &'static str },

    #[error("incident {index}: malformed record: {reason}")]
    MalformedRecord { index: usize, reason: String },

    #[error("incident {index}: {field} must be non-negative, got {value}")]
    NegativeValue {
        index: usize,
        field: &'static str,
        value: f64,
    },

    #[error("incident {index}: final_minutes {final_minutes} exceeds cap {cap}")]
    CapExceeded {
        index: usize,
        final_minutes: f64,
        cap: f64,
    },

    #[error("incident {index}: {field} calculation incorrect, expected {expected}, got {actual}")]
    FieldMismatch {
        index: usize,
        field: &'static str,
        expected: f64,
        actual: f64,
    },

    #[error("sorting error at index {index}: {reason}")]
    OrderViolation { index: usize, reason: String },
}

/// Top-level error for pipeline operations.
#[derive(Debug, thiserror::Error)]
pub enum TriageError {
    #[error("policy load error: {0}")]
    Policy(#[from] PolicyLoadError),

    #[error("consistency error: {0}")]
    Consistency(#[from] ConsistencyError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("emit error: {0}")]
    Emit(anyhow::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for triage operations.
pub type Result<T> = std::result::Result<T, TriageError>;
