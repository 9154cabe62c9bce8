//! Triage Core Library
//!
//! Policy-driven scoring, validation and ranking of recorded test-failure
//! incidents. Re-exports the pipeline components for programmatic access.

pub mod domain;
pub mod emit;
pub mod ingest;
pub mod obs;
pub mod pipeline;
pub mod policy;
pub mod rank;
pub mod reporting;
pub mod scoring;
pub mod telemetry;
pub mod validate;

pub use domain::{
    ConsistencyError, Incident, PolicyLoadError, RecordParseWarning, Result, ScoredIncident,
    TriageError, REQUIRED_FIELDS,
};

pub use emit::{JsonFileSink, MemorySink, PlanSink};
pub use ingest::{ingest_lines, ingest_reader, parse_record, IngestReport};
pub use pipeline::{build_plan, run_pipeline, PlanOutcome};
pub use policy::{Policy, DEFAULT_LAYER_MINUTES, DEFAULT_MODULE_PRIORITY, DEFAULT_MULTIPLIER};
pub use rank::{rank, triage_order};
pub use reporting::{
    render_summary_md, write_summary_json, write_summary_md, CountEntry, PlanSummary, TopIncident,
};
pub use scoring::{score_all, score_incident};
pub use validate::{validate_plan, validate_plan_document, TOLERANCE};

pub use obs::{
    emit_plan_emitted, emit_plan_ingested, emit_plan_scored, emit_plan_validated,
    emit_plan_validation_failed, PlanSpan,
};
pub use telemetry::{init_tracing, init_tracing_to_file};

/// Triage planner version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
