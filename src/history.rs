//! Append-only score history.
//!
//! One JSONL line per run, written after the report is emitted. Nothing
//! in the scoring path ever reads this file; it exists purely so teams
//! can chart compliance over time.

use crate::models::ComplianceReport;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub scope: String,
    pub mean: f64,
    /// Component name to total score.
    pub components: BTreeMap<String, u32>,
}

impl HistoryEntry {
    pub fn from_report(report: &ComplianceReport) -> Self {
        Self {
            timestamp: report.timestamp,
            scope: report.scope.clone(),
            mean: report.aggregate.mean,
            components: report
                .components
                .iter()
                .map(|s| (s.name.clone(), s.total))
                .collect(),
        }
    }
}

/// Append one entry to the history file, creating parent directories as
/// needed. Failures are reported, not fatal; callers downgrade to a warn.
pub fn append(repo_path: &Path, history_path: &str, entry: &HistoryEntry) -> anyhow::Result<()> {
    let full = repo_path.join(history_path);
    if let Some(parent) = full.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(&full)?;
    let line = serde_json::to_string(entry)?;
    writeln!(file, "{line}")?;
    debug!("Appended history entry to {}", full.display());
    Ok(())
}
