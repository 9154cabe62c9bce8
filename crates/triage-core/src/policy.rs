//! Scoring policy.
//!
//! A [`Policy`] is a typed, read-only view over the policy document:
//!
//! ```yaml
//! minutes_per_impacted_layer: { UI: 10, API: 20 }
//! multipliers:
//!   by_environment: { prod: 2.0 }
//!   by_failure_type: { crash: 3.0 }
//! module_priority_score: { auth: 5 }
//! caps:
//!   per_incident_minutes_max: 100
//! ```
//!
//! Every section is optional. Lookups never fail: unknown or absent keys
//! resolve to neutral values (`0` minutes, `1.0` multiplier, `1` priority).

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::domain::PolicyLoadError;

/// Minute cost of a layer missing from `minutes_per_impacted_layer`.
pub const DEFAULT_LAYER_MINUTES: f64 = 0.0;
/// Multiplier for an environment or failure type missing from the policy.
pub const DEFAULT_MULTIPLIER: f64 = 1.0;
/// Weight of a module missing from `module_priority_score`.
pub const DEFAULT_MODULE_PRIORITY: f64 = 1.0;

// ---------------------------------------------------------------------------
// Document shape
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
struct PolicyDocument {
    #[serde(default)]
    minutes_per_impacted_layer: Option<ScalarKeyMap>,
    #[serde(default)]
    multipliers: Option<MultipliersSection>,
    #[serde(default)]
    module_priority_score: Option<ScalarKeyMap>,
    #[serde(default)]
    caps: Option<CapsSection>,
}

#[derive(Debug, Default, Deserialize)]
struct MultipliersSection {
    #[serde(default)]
    by_environment: Option<ScalarKeyMap>,
    #[serde(default)]
    by_failure_type: Option<ScalarKeyMap>,
}

#[derive(Debug, Default, Deserialize)]
struct CapsSection {
    #[serde(default)]
    per_incident_minutes_max: Option<f64>,
}

/// A policy section keyed by any YAML scalar.
///
/// Keys such as `500` or `true` are stored in their string form so that a
/// record carrying `failure_type: "500"` resolves against them.
#[derive(Debug, Default)]
struct ScalarKeyMap(BTreeMap<String, f64>);

impl<'de> Deserialize<'de> for ScalarKeyMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MapVisitor;

        impl<'de> Visitor<'de> for MapVisitor {
            type Value = ScalarKeyMap;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a mapping of scalar keys to numbers")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = BTreeMap::new();
                while let Some((ScalarKey(key), value)) = map.next_entry::<ScalarKey, f64>()? {
                    entries.insert(key, value);
                }
                Ok(ScalarKeyMap(entries))
            }
        }

        deserializer.deserialize_map(MapVisitor)
    }
}

struct ScalarKey(String);

impl<'de> Deserialize<'de> for ScalarKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct KeyVisitor;

        impl<'de> Visitor<'de> for KeyVisitor {
            type Value = ScalarKey;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a string, number or boolean key")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(ScalarKey(v.to_string()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
                Ok(ScalarKey(v))
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
                Ok(ScalarKey(v.to_string()))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                Ok(ScalarKey(v.to_string()))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(ScalarKey(v.to_string()))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
                Ok(ScalarKey(v.to_string()))
            }
        }

        deserializer.deserialize_any(KeyVisitor)
    }
}

fn entries(section: Option<ScalarKeyMap>) -> BTreeMap<String, f64> {
    section.map(|m| m.0).unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// Cost and weighting rules applied to every incident.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Policy {
    layer_minutes: BTreeMap<String, f64>,
    environment_multipliers: BTreeMap<String, f64>,
    failure_type_multipliers: BTreeMap<String, f64>,
    module_priority: BTreeMap<String, f64>,
    per_incident_minutes_cap: Option<f64>,
}

impl Policy {
    /// Parse a policy document. JSON documents are accepted as well.
    ///
    /// # Errors
    ///
    /// - `PolicyLoadError::Parse` — invalid YAML, or a section has the wrong shape.
    /// - `PolicyLoadError::NotAMapping` — the top level is not a mapping.
    pub fn from_yaml_str(raw: &str) -> Result<Self, PolicyLoadError> {
        let value: serde_yaml_ng::Value = serde_yaml_ng::from_str(raw)?;
        if !value.is_mapping() {
            return Err(PolicyLoadError::NotAMapping {
                found: yaml_kind(&value).to_string(),
            });
        }

        let doc: PolicyDocument = serde_yaml_ng::from_value(value)?;
        let multipliers = doc.multipliers.unwrap_or_default();
        let policy = Self {
            layer_minutes: entries(doc.minutes_per_impacted_layer),
            environment_multipliers: entries(multipliers.by_environment),
            failure_type_multipliers: entries(multipliers.by_failure_type),
            module_priority: entries(doc.module_priority_score),
            per_incident_minutes_cap: doc.caps.and_then(|c| c.per_incident_minutes_max),
        };
        policy.warn_on_suspicious_values();
        Ok(policy)
    }

    /// Read and parse a policy file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PolicyLoadError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| PolicyLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&raw)
    }

    // -- builders -----------------------------------------------------------

    pub fn with_layer_minutes(mut self, layer: impl Into<String>, minutes: f64) -> Self {
        self.layer_minutes.insert(layer.into(), minutes);
        self
    }

    pub fn with_environment_multiplier(mut self, env: impl Into<String>, mult: f64) -> Self {
        self.environment_multipliers.insert(env.into(), mult);
        self
    }

    pub fn with_failure_type_multiplier(mut self, kind: impl Into<String>, mult: f64) -> Self {
        self.failure_type_multipliers.insert(kind.into(), mult);
        self
    }

    pub fn with_module_priority(mut self, module: impl Into<String>, weight: f64) -> Self {
        self.module_priority.insert(module.into(), weight);
        self
    }

    pub fn with_cap(mut self, cap: Option<f64>) -> Self {
        self.per_incident_minutes_cap = cap;
        self
    }

    // -- lookups ------------------------------------------------------------

    /// Minute cost of one impacted layer (`0` when unknown).
    pub fn layer_cost(&self, layer: &str) -> f64 {
        self.layer_minutes
            .get(layer)
            .copied()
            .unwrap_or(DEFAULT_LAYER_MINUTES)
    }

    /// Environment multiplier (`1.0` when absent or unknown).
    pub fn env_multiplier(&self, env: Option<&str>) -> f64 {
        lookup(&self.environment_multipliers, env, DEFAULT_MULTIPLIER)
    }

    /// Failure-type multiplier (`1.0` when absent or unknown).
    pub fn failure_multiplier(&self, failure_type: Option<&str>) -> f64 {
        lookup(&self.failure_type_multipliers, failure_type, DEFAULT_MULTIPLIER)
    }

    /// Module priority weight (`1` when absent or unknown).
    pub fn module_priority(&self, module: Option<&str>) -> f64 {
        lookup(&self.module_priority, module, DEFAULT_MODULE_PRIORITY)
    }

    /// Upper bound on `final_minutes`, if configured.
    pub fn cap(&self) -> Option<f64> {
        self.per_incident_minutes_cap
    }

    /// SHA-256 hex digest of the canonical JSON encoding of this policy.
    ///
    /// Maps are ordered, so equal policies always share a digest regardless
    /// of key order in the source document.
    pub fn digest(&self) -> String {
        let canonical = serde_json::to_vec(self).unwrap_or_default();
        hex::encode(Sha256::digest(&canonical))
    }

    fn warn_on_suspicious_values(&self) {
        let sections = [
            ("minutes_per_impacted_layer", &self.layer_minutes),
            ("multipliers.by_environment", &self.environment_multipliers),
            ("multipliers.by_failure_type", &self.failure_type_multipliers),
            ("module_priority_score", &self.module_priority),
        ];
        for (section, map) in sections {
            for (key, value) in map {
                if !value.is_finite() || *value < 0.0 {
                    warn!(section, key = %key, value, "policy value is negative or not finite");
                }
            }
        }
        if let Some(cap) = self.per_incident_minutes_cap {
            if !cap.is_finite() || cap < 0.0 {
                warn!(section = "caps.per_incident_minutes_max", value = cap, "policy cap is negative or not finite");
            }
        }
    }
}

fn lookup(map: &BTreeMap<String, f64>, key: Option<&str>, default: f64) -> f64 {
    key.and_then(|k| map.get(k)).copied().unwrap_or(default)
}

fn yaml_kind(value: &serde_yaml_ng::Value) -> &'static str {
    use serde_yaml_ng::Value;
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}
