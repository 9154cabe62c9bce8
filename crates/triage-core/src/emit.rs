//! Output seam for validated plans.
//!
//! A [`PlanSink`] receives the ranked plan only after validation succeeded;
//! it owns presentation and export and must not reorder or alter records.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::NamedTempFile;

use crate::domain::ScoredIncident;

/// Consumer of a finalized, ranked plan.
pub trait PlanSink {
    /// Receive the plan in triage order.
    fn emit(&mut self, plan: &[ScoredIncident]) -> Result<()>;
}

/// Writes the plan as a pretty-printed JSON array.
///
/// The file is written to a temporary sibling and renamed into place, so a
/// failed run never leaves a partial plan behind.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PlanSink for JsonFileSink {
    fn emit(&mut self, plan: &[ScoredIncident]) -> Result<()> {
        write_json_atomic(&self.path, plan)
    }
}

/// Collects emitted plans in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub plans: Vec<Vec<ScoredIncident>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently emitted plan, if any.
    pub fn last(&self) -> Option<&[ScoredIncident]> {
        self.plans.last().map(Vec::as_slice)
    }
}

impl PlanSink for MemorySink {
    fn emit(&mut self, plan: &[ScoredIncident]) -> Result<()> {
        self.plans.push(plan.to_vec());
        Ok(())
    }
}

/// Serialize `value` as pretty JSON and atomically replace `path`.
pub(crate) fn write_json_atomic<T: serde::Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let content = serde_json::to_string_pretty(value).context("serialize plan")?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).with_context(|| format!("create {:?}", dir))?;

    let mut tmp = NamedTempFile::new_in(dir).with_context(|| format!("create temp file in {:?}", dir))?;
    tmp.write_all(content.as_bytes())
        .with_context(|| format!("write {:?}", tmp.path()))?;
    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("write {:?}", path))?;
    Ok(())
}
