//! Incident records as ingested and as scored.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One recorded test failure.
///
/// Only the five recognised fields are kept; anything else on the input
/// record is discarded during deserialization. An absent string field is a
/// distinct value from an unrecognised one and is preserved as `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    /// Opaque identifier, passed through untouched.
    #[serde(default)]
    pub test_id: Option<Value>,
    #[serde(default)]
    pub module: Option<String>,
    #[serde(default)]
    pub environment: Option<String>,
    #[serde(default)]
    pub failure_type: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub impacted_layers: Vec<String>,
}

impl Incident {
    /// Module name used for ordering; a missing module sorts as `""`.
    pub fn module_key(&self) -> &str {
        self.module.as_deref().unwrap_or("")
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// An [`Incident`] annotated with its time estimate and priority.
///
/// Serializes as a flat record:
/// `test_id, module, environment, failure_type, impacted_layers,
/// base_minutes, final_minutes, priority_score`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredIncident {
    #[serde(flatten)]
    pub incident: Incident,
    /// Sum of per-layer minute costs, before multipliers and cap.
    pub base_minutes: f64,
    /// Base minutes after environment/failure multipliers and the cap.
    pub final_minutes: f64,
    /// Module weight times the uncapped multipliers, rounded to 3 decimals.
    pub priority_score: f64,
}

impl ScoredIncident {
    pub fn module_key(&self) -> &str {
        self.incident.module_key()
    }
}

/// Field names every serialized [`ScoredIncident`] must carry.
pub const REQUIRED_FIELDS: &[&str] = &[
    "test_id",
    "module",
    "environment",
    "failure_type",
    "impacted_layers",
    "base_minutes",
    "final_minutes",
    "priority_score",
];
