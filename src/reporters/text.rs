//! Text (terminal) reporter with colors and formatting

use crate::engine::INTERNAL_ERROR_RULE;
use crate::fixes::FixStatus;
use crate::models::{ComplianceReport, Severity};
use anyhow::Result;

/// Reset ANSI color
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const LIGHT_RED: &str = "\x1b[91m";

fn severity_color(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical => RED,
        Severity::Major => LIGHT_RED,
        Severity::Minor => YELLOW,
    }
}

fn severity_tag(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical => "[C]",
        Severity::Major => "[M]",
        Severity::Minor => "[m]",
    }
}

fn score_color(total: u32) -> &'static str {
    if total >= 90 {
        GREEN
    } else if total >= 70 {
        YELLOW
    } else {
        RED
    }
}

/// Render the report as formatted terminal output. Without `verbose`,
/// internal-error violations and fix outcomes are summarized; with it,
/// each one gets a line.
pub fn render(report: &ComplianceReport, verbose: bool) -> Result<String> {
    let mut out = String::new();

    out.push_str(&format!("\n{BOLD}Component Compliance{RESET}\n"));
    out.push_str(&format!(
        "{DIM}──────────────────────────────────────{RESET}\n"
    ));
    out.push_str(&format!(
        "Scope: {}  Components: {}  Mean: {BOLD}{:.1}/100{RESET}\n\n",
        report.scope,
        report.components.len(),
        report.aggregate.mean
    ));

    // Severity counts
    let s = &report.summary;
    out.push_str(&format!("{BOLD}VIOLATIONS{RESET} ({} total)\n", s.total));
    let mut parts = Vec::new();
    if s.critical > 0 {
        parts.push(format!("{RED}{} critical{RESET}", s.critical));
    }
    if s.major > 0 {
        parts.push(format!("{LIGHT_RED}{} major{RESET}", s.major));
    }
    if s.minor > 0 {
        parts.push(format!("{YELLOW}{} minor{RESET}", s.minor));
    }
    if !parts.is_empty() {
        out.push_str(&format!("  {}\n", parts.join(" | ")));
    }
    out.push('\n');

    // Per-component score table, already ordered by descending score.
    if !report.components.is_empty() {
        out.push_str(&format!(
            "{DIM}  COMPONENT             TIER          SCORE  GATE{RESET}\n"
        ));
        out.push_str(&format!(
            "{DIM}  ─────────────────────────────────────────────────{RESET}\n"
        ));
        for score in &report.components {
            let verdict = report.gates.iter().find(|g| g.component == score.name);
            let gate_cell = match verdict {
                Some(v) if v.passed => format!("{GREEN}pass{RESET}"),
                Some(_) => format!("{RED}FAIL{RESET}"),
                None => String::new(),
            };
            out.push_str(&format!(
                "  {:<20}  {:<12}  {}{:>5}{RESET}  {}\n",
                truncate(&score.name, 20),
                score.tier.to_string(),
                score_color(score.total),
                score.total,
                gate_cell
            ));
        }
        out.push('\n');
    }

    // Failing gates with reasons
    let failures: Vec<_> = report.gates.iter().filter(|g| !g.passed).collect();
    if !failures.is_empty() {
        out.push_str(&format!("{BOLD}GATE FAILURES{RESET}\n"));
        for gate in failures {
            let reason = gate.reason.as_deref().unwrap_or("gate failed");
            out.push_str(&format!("  {RED}✗{RESET} {}: {}\n", gate.component, reason));
        }
        out.push('\n');
    }

    // Violation detail; internal errors stay behind --verbose.
    let visible: Vec<_> = report
        .violations
        .iter()
        .filter(|v| verbose || v.rule_id != INTERNAL_ERROR_RULE)
        .collect();
    if !visible.is_empty() {
        let limit = if verbose { usize::MAX } else { 10 };
        for violation in visible.iter().take(limit) {
            let color = severity_color(violation.severity);
            let location = if violation.line > 0 {
                format!("{}:{}", violation.file, violation.line)
            } else {
                violation.file.clone()
            };
            out.push_str(&format!(
                "  {color}{}{RESET} {:<24} {DIM}{}{RESET}  {}\n",
                severity_tag(violation.severity),
                violation.rule_id,
                location,
                violation.message
            ));
        }
        let remaining = visible.len().saturating_sub(limit);
        if remaining > 0 {
            out.push_str(&format!(
                "  {DIM}...and {} more (use --verbose){RESET}\n",
                remaining
            ));
        }
        out.push('\n');
    }

    // Fix outcomes
    if !report.fixes.is_empty() {
        let applied = report
            .fixes
            .iter()
            .filter(|f| f.status == FixStatus::Applied)
            .count();
        let failed = report.fixes.len() - applied;
        out.push_str(&format!(
            "{BOLD}FIXES{RESET}  {GREEN}{} applied{RESET}",
            applied
        ));
        if failed > 0 {
            out.push_str(&format!("  {RED}{} failed{RESET}", failed));
        }
        out.push('\n');
        if verbose {
            for fix in &report.fixes {
                let mark = match fix.status {
                    FixStatus::Applied => format!("{GREEN}✓{RESET}"),
                    FixStatus::FixFailed => format!("{RED}✗{RESET}"),
                };
                out.push_str(&format!(
                    "  {mark} {} on {} ({})\n",
                    fix.rule_id, fix.component, fix.file
                ));
            }
        }
        out.push('\n');
    }

    Ok(out)
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}
