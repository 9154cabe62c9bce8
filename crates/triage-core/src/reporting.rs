use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::ScoredIncident;
use crate::emit::write_json_atomic;

/// Schema version of the summary artifact.
pub const SUMMARY_SCHEMA_VERSION: &str = "1.0";
/// Entries kept in each `top_*` breakdown.
pub const TOP_BREAKDOWN_LEN: usize = 5;
/// Incidents listed in `top_incidents`.
pub const TOP_INCIDENTS_LEN: usize = 10;
/// Label used for an absent module, environment or failure type.
pub const NONE_LABEL: &str = "(none)";

/// One row of a count breakdown.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CountEntry {
    pub name: String,
    pub count: usize,
}

/// Compact line for one incident in the summary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TopIncident {
    pub rank: usize,
    pub test_id: Option<Value>,
    pub module: Option<String>,
    pub final_minutes: f64,
    pub priority_score: f64,
}

/// Summary artifact written next to the plan for dashboards and CI comments.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanSummary {
    pub schema_version: String,
    pub generated_at: DateTime<Utc>,
    pub policy_digest: String,
    pub total_incidents: usize,
    pub skipped_lines: usize,
    pub total_final_minutes: f64,
    pub top_modules: Vec<CountEntry>,
    pub top_failure_types: Vec<CountEntry>,
    pub top_environments: Vec<CountEntry>,
    pub top_incidents: Vec<TopIncident>,
}

impl PlanSummary {
    /// Build a summary from a ranked plan.
    pub fn from_plan(plan: &[ScoredIncident], skipped_lines: usize, policy_digest: &str) -> Self {
        Self {
            schema_version: SUMMARY_SCHEMA_VERSION.to_string(),
            generated_at: Utc::now(),
            policy_digest: policy_digest.to_string(),
            total_incidents: plan.len(),
            skipped_lines,
            total_final_minutes: plan.iter().fold(0.0, |total, s| total + s.final_minutes),
            top_modules: top_counts(plan.iter().map(|s| s.incident.module.as_deref())),
            top_failure_types: top_counts(plan.iter().map(|s| s.incident.failure_type.as_deref())),
            top_environments: top_counts(plan.iter().map(|s| s.incident.environment.as_deref())),
            top_incidents: plan
                .iter()
                .take(TOP_INCIDENTS_LEN)
                .enumerate()
                .map(|(i, s)| TopIncident {
                    rank: i + 1,
                    test_id: s.incident.test_id.clone(),
                    module: s.incident.module.clone(),
                    final_minutes: s.final_minutes,
                    priority_score: s.priority_score,
                })
                .collect(),
        }
    }
}

/// Count occurrences, most common first; ties keep first-seen order.
fn top_counts<'a>(values: impl Iterator<Item = Option<&'a str>>) -> Vec<CountEntry> {
    let mut counts: Vec<CountEntry> = Vec::new();
    for value in values {
        let name = value.unwrap_or(NONE_LABEL);
        match counts.iter_mut().find(|c| c.name == name) {
            Some(entry) => entry.count += 1,
            None => counts.push(CountEntry {
                name: name.to_string(),
                count: 1,
            }),
        }
    }
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(TOP_BREAKDOWN_LEN);
    counts
}

/// Write the summary as pretty JSON.
pub fn write_summary_json(path: &Path, summary: &PlanSummary) -> Result<()> {
    write_json_atomic(path, summary).context("write plan summary")
}

/// Render a markdown summary for PR comments and CI check output.
///
/// Minutes are shown with one decimal and priorities with three.
pub fn render_summary_md(summary: &PlanSummary) -> String {
    let mut out = String::new();
    out.push_str("# Incident Plan Summary\n\n");
    out.push_str(&format!(
        "- incidents: {}\n- skipped lines: {}\n- total minutes: {:.1}\n- policy: `{}`\n\n",
        summary.total_incidents,
        summary.skipped_lines,
        summary.total_final_minutes,
        short_digest(&summary.policy_digest),
    ));

    for (title, entries) in [
        ("Modules", &summary.top_modules),
        ("Failure Types", &summary.top_failure_types),
        ("Environments", &summary.top_environments),
    ] {
        out.push_str(&format!("## {}\n", title));
        for entry in entries {
            out.push_str(&format!("- {}: {}\n", entry.name, entry.count));
        }
        out.push('\n');
    }

    if !summary.top_incidents.is_empty() {
        out.push_str("## Top Incidents\n");
        out.push_str("| # | test | module | minutes | priority |\n");
        out.push_str("|---|------|--------|---------|----------|\n");
        for top in &summary.top_incidents {
            out.push_str(&format!(
                "| {} | {} | {} | {:.1} | {:.3} |\n",
                top.rank,
                display_test_id(top.test_id.as_ref()),
                top.module.as_deref().unwrap_or(NONE_LABEL),
                top.final_minutes,
                top.priority_score,
            ));
        }
    }
    out
}

/// Write the markdown summary.
pub fn write_summary_md(path: &Path, summary: &PlanSummary) -> Result<()> {
    let md = render_summary_md(summary);
    std::fs::write(path, md).with_context(|| format!("write {:?}", path))?;
    Ok(())
}

fn short_digest(digest: &str) -> &str {
    digest.get(..12).unwrap_or(digest)
}

fn display_test_id(test_id: Option<&Value>) -> String {
    match test_id {
        None => NONE_LABEL.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
