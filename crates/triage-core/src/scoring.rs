//! Cost and priority model.
//!
//! For every incident, independently:
//!
//! ```text
//! base_minutes   = Σ layer_cost(l)                      for l in impacted_layers
//! final_minutes  = min(base × env_mult × fail_mult, cap)  (cap only if set)
//! priority_score = round3(module_priority × env_mult × fail_mult)
//! ```
//!
//! The priority uses the same multipliers as the minute estimate but is
//! neither capped nor scaled by `base_minutes`.

use crate::domain::{Incident, ScoredIncident};
use crate::policy::Policy;

/// Round to three decimal places, ties to even.
///
/// The decision is made on the exact binary value, so `2.0625` (a true tie)
/// becomes `2.062` while `1.2345` (stored just below the tie) becomes `1.234`.
pub fn round3(value: f64) -> f64 {
    let scaled = value * 1000.0;
    if !scaled.is_finite() {
        return value;
    }
    // Exact error of the scaling product.
    let residual = value.mul_add(1000.0, -scaled);
    let floor = scaled.floor();
    let rounded = if scaled - floor == 0.5 {
        if residual > 0.0 {
            floor + 1.0
        } else if residual < 0.0 {
            floor
        } else {
            scaled.round_ties_even()
        }
    } else {
        scaled.round()
    };
    rounded / 1000.0 + 0.0
}

/// Sum of per-layer minute costs; unknown layers cost nothing.
pub fn base_minutes(policy: &Policy, layers: &[String]) -> f64 {
    // Folding from +0.0 keeps an empty layer list at 0.0 rather than -0.0.
    layers
        .iter()
        .fold(0.0, |total, layer| total + policy.layer_cost(layer))
}

/// Apply multipliers and the optional cap to a base estimate.
pub fn final_minutes(base: f64, env_mult: f64, fail_mult: f64, cap: Option<f64>) -> f64 {
    // `+ 0.0` turns a negative zero into a positive one.
    let minutes = base * env_mult * fail_mult + 0.0;
    match cap {
        Some(cap) if minutes > cap => cap,
        _ => minutes,
    }
}

/// Module weight times the uncapped multipliers, rounded to 3 decimals.
pub fn priority_score(module_priority: f64, env_mult: f64, fail_mult: f64) -> f64 {
    round3(module_priority * env_mult * fail_mult)
}

/// Score a single incident. Pure; the input is cloned into the result.
pub fn score_incident(policy: &Policy, incident: &Incident) -> ScoredIncident {
    let base = base_minutes(policy, &incident.impacted_layers);
    let env_mult = policy.env_multiplier(incident.environment.as_deref());
    let fail_mult = policy.failure_multiplier(incident.failure_type.as_deref());
    let module_priority = policy.module_priority(incident.module.as_deref());

    ScoredIncident {
        incident: incident.clone(),
        base_minutes: base,
        final_minutes: final_minutes(base, env_mult, fail_mult, policy.cap()),
        priority_score: priority_score(module_priority, env_mult, fail_mult),
    }
}

/// Score every incident, preserving input order.
pub fn score_all(policy: &Policy, incidents: &[Incident]) -> Vec<ScoredIncident> {
    incidents
        .iter()
        .map(|incident| score_incident(policy, incident))
        .collect()
}
