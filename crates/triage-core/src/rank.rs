//! Triage ordering.

use std::cmp::Ordering;

use crate::domain::ScoredIncident;

/// Ordering used for the plan: `priority_score` descending, then `module`
/// ascending with a missing module treated as `""`.
///
/// `-0.0` and `0.0` compare equal, matching the validator's tie rule.
pub fn triage_order(a: &ScoredIncident, b: &ScoredIncident) -> Ordering {
    (b.priority_score + 0.0)
        .total_cmp(&(a.priority_score + 0.0))
        .then_with(|| a.module_key().cmp(b.module_key()))
}

/// Sort scored incidents into triage order.
///
/// The sort is stable, so incidents that tie on both keys keep their
/// ingestion order.
pub fn rank(mut scored: Vec<ScoredIncident>) -> Vec<ScoredIncident> {
    scored.sort_by(triage_order);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Incident;
    use serde_json::json;

    fn scored(id: &str, module: Option<&str>, priority: f64) -> ScoredIncident {
        ScoredIncident {
            incident: Incident {
                test_id: Some(json!(id)),
                module: module.map(str::to_string),
                environment: None,
                failure_type: None,
                impacted_layers: vec![],
            },
            base_minutes: 0.0,
            final_minutes: 0.0,
            priority_score: priority,
        }
    }

    fn ids(plan: &[ScoredIncident]) -> Vec<String> {
        plan.iter()
            .map(|s| s.incident.test_id.as_ref().and_then(|v| v.as_str()).unwrap_or("").to_string())
            .collect()
    }

    #[test]
    fn test_priority_descending() {
        let plan = rank(vec![
            scored("low", Some("a"), 1.0),
            scored("high", Some("a"), 30.0),
            scored("mid", Some("a"), 5.5),
        ]);
        assert_eq!(ids(&plan), ["high", "mid", "low"]);
    }

    #[test]
    fn test_equal_priority_orders_by_module() {
        let plan = rank(vec![scored("z", Some("zeta"), 2.0), scored("a", Some("alpha"), 2.0)]);
        assert_eq!(ids(&plan), ["a", "z"]);
    }

    #[test]
    fn test_missing_module_sorts_first_among_ties() {
        let plan = rank(vec![
            scored("named", Some("auth"), 2.0),
            scored("anon", None, 2.0),
            scored("empty", Some(""), 2.0),
        ]);
        assert_eq!(ids(&plan), ["anon", "empty", "named"]);
    }

    #[test]
    fn test_full_ties_keep_ingestion_order() {
        let plan = rank(vec![
            scored("first", Some("auth"), 3.0),
            scored("second", Some("auth"), 3.0),
            scored("third", Some("auth"), 3.0),
        ]);
        assert_eq!(ids(&plan), ["first", "second", "third"]);
    }

    #[test]
    fn test_signed_zero_priorities_tie() {
        let plan = rank(vec![scored("z", Some("zeta"), 0.0), scored("r", Some("report"), -0.0)]);
        assert_eq!(ids(&plan), ["r", "z"]);
    }

    #[test]
    fn test_rank_empty_is_empty() {
        assert!(rank(Vec::new()).is_empty());
    }
}
