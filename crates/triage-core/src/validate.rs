//! Internal-consistency checks for a ranked plan.
//!
//! Every derived field is recomputed from the policy and the raw incident
//! fields without going through [`crate::scoring::score_incident`], then
//! compared against the stored value. Only the rounding helper is shared. Global invariants (non-empty,
//! non-negative, cap respected, sorted) are checked over the whole plan.
//! Any failure is fatal: nothing is corrected or dropped.

use serde_json::Value;

use crate::domain::{ConsistencyError, ScoredIncident, REQUIRED_FIELDS};
use crate::policy::Policy;
use crate::scoring::round3;

/// Maximum absolute difference tolerated between stored and recomputed values.
pub const TOLERANCE: f64 = 0.001;

/// Validate a ranked plan against the policy that produced it.
///
/// # Errors
///
/// Returns the first [`ConsistencyError`] found, in this order per incident:
/// non-negativity, cap, `base_minutes`, `final_minutes`, `priority_score`;
/// then the pairwise ordering across the plan.
pub fn validate_plan(policy: &Policy, plan: &[ScoredIncident]) -> Result<(), ConsistencyError> {
    if plan.is_empty() {
        return Err(ConsistencyError::EmptyPlan);
    }

    for (index, scored) in plan.iter().enumerate() {
        validate_incident(policy, index, scored)?;
    }

    validate_order(plan)
}

/// Validate a serialized plan (as written by a JSON sink) and return the
/// decoded incidents.
///
/// Checks the document shape first: a top-level array whose elements are
/// objects carrying every field in [`REQUIRED_FIELDS`].
pub fn validate_plan_document(
    policy: &Policy,
    document: &Value,
) -> Result<Vec<ScoredIncident>, ConsistencyError> {
    let records = document.as_array().ok_or(ConsistencyError::NotAnArray)?;

    let mut plan = Vec::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        let obj = record
            .as_object()
            .ok_or_else(|| ConsistencyError::MalformedRecord {
                index,
                reason: "incident must be a JSON object".to_string(),
            })?;
        if let Some(field) = REQUIRED_FIELDS
            .iter()
            .copied()
            .find(|f| !obj.contains_key(*f))
        {
            return Err(ConsistencyError::MissingField { index, field });
        }
        let scored: ScoredIncident = serde_json::from_value(record.clone()).map_err(|e| {
            ConsistencyError::MalformedRecord {
                index,
                reason: e.to_string(),
            }
        })?;
        plan.push(scored);
    }

    validate_plan(policy, &plan)?;
    Ok(plan)
}

fn validate_incident(
    policy: &Policy,
    index: usize,
    scored: &ScoredIncident,
) -> Result<(), ConsistencyError> {
    for (field, value) in [
        ("base_minutes", scored.base_minutes),
        ("final_minutes", scored.final_minutes),
        ("priority_score", scored.priority_score),
    ] {
        // NaN fails this comparison and is reported as negative.
        if !(value >= 0.0) {
            return Err(ConsistencyError::NegativeValue { index, field, value });
        }
    }

    let cap = policy.cap();
    if let Some(cap) = cap {
        if scored.final_minutes > cap {
            return Err(ConsistencyError::CapExceeded {
                index,
                final_minutes: scored.final_minutes,
                cap,
            });
        }
    }

    let incident = &scored.incident;
    let mut expected_base = 0.0;
    for layer in &incident.impacted_layers {
        expected_base += policy.layer_cost(layer);
    }
    check_field(index, "base_minutes", expected_base, scored.base_minutes)?;

    let env_mult = policy.env_multiplier(incident.environment.as_deref());
    let fail_mult = policy.failure_multiplier(incident.failure_type.as_deref());
    let mut expected_final = scored.base_minutes * env_mult * fail_mult;
    if let Some(cap) = cap {
        if expected_final > cap {
            expected_final = cap;
        }
    }
    check_field(index, "final_minutes", expected_final, scored.final_minutes)?;

    let module_priority = policy.module_priority(incident.module.as_deref());
    let expected_priority = round3(module_priority * env_mult * fail_mult);
    check_field(index, "priority_score", expected_priority, scored.priority_score)
}

fn check_field(
    index: usize,
    field: &'static str,
    expected: f64,
    actual: f64,
) -> Result<(), ConsistencyError> {
    if (actual - expected).abs() < TOLERANCE {
        Ok(())
    } else {
        Err(ConsistencyError::FieldMismatch {
            index,
            field,
            expected,
            actual,
        })
    }
}

fn validate_order(plan: &[ScoredIncident]) -> Result<(), ConsistencyError> {
    for (index, pair) in plan.windows(2).enumerate() {
        let (current, next) = (&pair[0], &pair[1]);
        if current.priority_score == next.priority_score {
            if current.module_key() > next.module_key() {
                return Err(ConsistencyError::OrderViolation {
                    index,
                    reason: format!(
                        "modules not ascending for equal priority {}: {:?} before {:?}",
                        current.priority_score,
                        current.module_key(),
                        next.module_key()
                    ),
                });
            }
        } else if !(current.priority_score >= next.priority_score) {
            return Err(ConsistencyError::OrderViolation {
                index,
                reason: format!(
                    "priority scores not descending: {} before {}",
                    current.priority_score, next.priority_score
                ),
            });
        }
    }
    Ok(())
}
