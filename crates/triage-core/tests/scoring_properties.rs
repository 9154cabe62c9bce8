//! Property tests for the scoring model and the triage order.

use proptest::prelude::*;
use triage_core::{
    ingest_lines, rank, score_all, score_incident, validate_plan, Incident, Policy,
};

const LAYERS: &[&str] = &["UI", "API", "DB", "Unknown", "Legacy"];
const ENVS: &[&str] = &["prod", "dev", "qa", "", "mars"];
const KINDS: &[&str] = &["crash", "timeout", "error", "", "gremlins"];
const MODULES: &[&str] = &["auth", "payment", "report", "alpha", "zeta", ""];

fn policy(cap: Option<f64>) -> Policy {
    Policy::default()
        .with_layer_minutes("UI", 10.0)
        .with_layer_minutes("API", 20.0)
        .with_layer_minutes("DB", 15.0)
        .with_environment_multiplier("prod", 2.0)
        .with_environment_multiplier("qa", 1.5)
        .with_failure_type_multiplier("crash", 3.0)
        .with_failure_type_multiplier("timeout", 2.0)
        .with_failure_type_multiplier("error", 1.5)
        .with_module_priority("auth", 5.0)
        .with_module_priority("payment", 10.0)
        .with_module_priority("report", 0.0)
        .with_cap(cap)
}

fn pick(options: &'static [&'static str]) -> impl Strategy<Value = Option<String>> {
    prop::option::of(prop::sample::select(options).prop_map(str::to_string))
}

fn incident_strategy() -> impl Strategy<Value = Incident> {
    (
        pick(MODULES),
        pick(ENVS),
        pick(KINDS),
        prop::collection::vec(prop::sample::select(LAYERS).prop_map(str::to_string), 0..6),
    )
        .prop_map(|(module, environment, failure_type, impacted_layers)| Incident {
            test_id: None,
            module,
            environment,
            failure_type,
            impacted_layers,
        })
}

fn known_cost(layer: &str) -> f64 {
    match layer {
        "UI" => 10.0,
        "API" => 20.0,
        "DB" => 15.0,
        _ => 0.0,
    }
}

proptest! {
    #[test]
    fn base_minutes_is_sum_of_known_layers(incident in incident_strategy()) {
        let scored = score_incident(&policy(None), &incident);
        let expected: f64 = incident.impacted_layers.iter().map(|l| known_cost(l)).sum();
        prop_assert_eq!(scored.base_minutes, expected);
    }

    #[test]
    fn final_minutes_respects_cap(incident in incident_strategy(), cap in 0.0f64..500.0) {
        let uncapped = score_incident(&policy(None), &incident);
        let capped = score_incident(&policy(Some(cap)), &incident);
        prop_assert!(capped.final_minutes <= cap);
        if uncapped.final_minutes <= cap {
            prop_assert_eq!(capped.final_minutes, uncapped.final_minutes);
        } else {
            prop_assert_eq!(capped.final_minutes, cap);
        }
    }

    #[test]
    fn priority_ignores_layers_and_cap(incident in incident_strategy(), cap in 0.0f64..50.0) {
        let a = score_incident(&policy(None), &incident);
        let stripped = Incident { impacted_layers: Vec::new(), ..incident.clone() };
        let b = score_incident(&policy(Some(cap)), &stripped);
        prop_assert_eq!(a.priority_score, b.priority_score);
    }

    #[test]
    fn ranked_plans_always_validate(
        incidents in prop::collection::vec(incident_strategy(), 1..40),
        cap in prop::option::of(0.0f64..200.0),
    ) {
        let p = policy(cap);
        let plan = rank(score_all(&p, &incidents));
        prop_assert_eq!(plan.len(), incidents.len());
        prop_assert!(validate_plan(&p, &plan).is_ok());
        for pair in plan.windows(2) {
            prop_assert!(pair[0].priority_score >= pair[1].priority_score);
            if pair[0].priority_score == pair[1].priority_score {
                prop_assert!(pair[0].module_key() <= pair[1].module_key());
            }
        }
    }

    #[test]
    fn n_valid_and_m_malformed_lines_yield_n_records(valid in 0usize..20, malformed in 0usize..20) {
        let mut lines = Vec::new();
        for i in 0..valid {
            lines.push(format!(r#"{{"test_id": {i}, "module": "auth"}}"#));
        }
        for i in 0..malformed {
            lines.insert((i * 7) % (lines.len() + 1), format!("{{broken {i}"));
        }
        let report = ingest_lines(&lines);
        prop_assert_eq!(report.incidents.len(), valid);
        prop_assert_eq!(report.warnings.len(), malformed);
    }
}

#[test]
fn unknown_keys_resolve_to_defaults() {
    let p = policy(None);
    for key in [None, Some(""), Some("unknown")] {
        assert_eq!(p.env_multiplier(key), 1.0);
        assert_eq!(p.failure_multiplier(key), 1.0);
        assert_eq!(p.module_priority(key), 1.0);
    }
}
