//! End-to-end plan construction: score → rank → validate → emit.
//!
//! The sink is only invoked once the ranked plan has passed validation, so a
//! fatal error never reaches the output collaborator with partial data.

use serde::Serialize;

use crate::domain::{ConsistencyError, Incident, RecordParseWarning, Result, ScoredIncident, TriageError};
use crate::emit::PlanSink;
use crate::ingest::IngestReport;
use crate::obs::{
    emit_plan_emitted, emit_plan_ingested, emit_plan_scored, emit_plan_validated,
    emit_plan_validation_failed, PlanSpan,
};
use crate::policy::Policy;
use crate::rank::rank;
use crate::scoring::score_all;
use crate::validate::validate_plan;

/// A validated plan plus the input lines that were skipped to build it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanOutcome {
    pub plan: Vec<ScoredIncident>,
    pub warnings: Vec<RecordParseWarning>,
}

/// Score, rank and validate incidents.
///
/// # Errors
///
/// Any [`ConsistencyError`] from validation, including `EmptyPlan` when
/// there are no incidents.
pub fn build_plan(
    policy: &Policy,
    incidents: &[Incident],
) -> std::result::Result<Vec<ScoredIncident>, ConsistencyError> {
    let scored = score_all(policy, incidents);
    emit_plan_scored(
        scored.len(),
        scored.iter().fold(0.0, |total, s| total + s.final_minutes),
    );

    let ranked = rank(scored);
    if let Err(e) = validate_plan(policy, &ranked) {
        emit_plan_validation_failed(&e);
        return Err(e);
    }
    emit_plan_validated(ranked.len());
    Ok(ranked)
}

/// Build a plan from an ingest report and hand it to `sink`.
pub fn run_pipeline<S>(policy: &Policy, ingest: IngestReport, sink: &mut S) -> Result<PlanOutcome>
where
    S: PlanSink + ?Sized,
{
    let _span = PlanSpan::enter(&policy.digest());
    emit_plan_ingested(ingest.incidents.len(), ingest.skipped());

    let plan = build_plan(policy, &ingest.incidents)?;
    sink.emit(&plan).map_err(TriageError::Emit)?;
    emit_plan_emitted(plan.len());

    Ok(PlanOutcome {
        plan,
        warnings: ingest.warnings,
    })
}
