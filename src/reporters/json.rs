//! JSON reporter
//!
//! Pretty-prints the full report with stable field names, suitable for CI
//! consumption and piping to jq.

use crate::models::ComplianceReport;
use anyhow::Result;

pub fn render(report: &ComplianceReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}
