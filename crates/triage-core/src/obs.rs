//! Structured observability hooks for the triage pipeline.
//!
//! This module provides:
//! - Run-scoped tracing spans via the `PlanSpan` RAII guard
//! - Emission functions for pipeline milestones: ingest, score, validate, emit
//!
//! Events are emitted at `info!` level (filter with `RUST_LOG`).
//! Validation failures are emitted at `error!`.

use tracing::{error, info};

use crate::domain::ConsistencyError;

/// RAII guard that enters a plan-scoped tracing span for the duration of a run.
///
/// # Example
///
/// ```ignore
/// let _span = PlanSpan::enter("3f1c9a0b");
/// // Every event inside is tagged with policy_digest = "3f1c9a0b"
/// ```
pub struct PlanSpan {
    _span: tracing::span::EnteredSpan,
}

impl PlanSpan {
    /// Create and enter a span tagged with the policy digest.
    pub fn enter(policy_digest: &str) -> Self {
        let span = tracing::info_span!("triage.plan", policy_digest = %policy_digest);
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: record stream ingested.
pub fn emit_plan_ingested(incidents: usize, skipped: usize) {
    info!(event = "plan.ingested", incidents = incidents, skipped = skipped);
}

/// Emit event: every incident scored.
pub fn emit_plan_scored(incidents: usize, total_final_minutes: f64) {
    info!(
        event = "plan.scored",
        incidents = incidents,
        total_final_minutes = total_final_minutes,
    );
}

/// Emit event: ranked plan passed validation.
pub fn emit_plan_validated(incidents: usize) {
    info!(event = "plan.validated", incidents = incidents);
}

/// Emit event: ranked plan failed validation (error level).
pub fn emit_plan_validation_failed(error: &ConsistencyError) {
    error!(event = "plan.validation_failed", error = %error);
}

/// Emit event: plan handed to the output sink.
pub fn emit_plan_emitted(incidents: usize) {
    info!(event = "plan.emitted", incidents = incidents);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_span_create() {
        let _span = PlanSpan::enter("test-policy-digest");
    }
}
