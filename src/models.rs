//! Core data models for comphealth
//!
//! These models are shared across the whole crate: rule violations,
//! per-component scores, and the final compliance report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Process exit codes (stable contract for CI callers).
pub const EXIT_OK: i32 = 0;
pub const EXIT_GATE_FAILED: i32 = 1;
pub const EXIT_CANCELLED: i32 = 2;
pub const EXIT_FATAL: i32 = 3;

/// Generate a deterministic violation ID based on content hash.
///
/// Stable IDs across runs enable suppression, deduplication, and tracking
/// a violation over time. The ID is the first 16 hex chars of a SHA-256
/// over the fields that locate the violation.
pub fn deterministic_violation_id(
    rule_id: &str,
    component: &str,
    file: &str,
    line: u32,
    message: &str,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{rule_id}\n{component}\n{file}\n{line}\n{message}"));
    let digest = hasher.finalize();
    format!("{:x}", digest)[..16].to_string()
}

/// Severity levels for violations
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Minor,
    Major,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Minor => write!(f, "minor"),
            Severity::Major => write!(f, "major"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

/// Rule categories. Weights are fixed and sum to 100.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    #[default]
    Structure,
    Styling,
    ScriptIntegration,
    Accessibility,
    Architecture,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Structure,
        Category::Styling,
        Category::ScriptIntegration,
        Category::Accessibility,
        Category::Architecture,
    ];

    /// Fixed score weight for this category.
    pub fn weight(&self) -> u32 {
        match self {
            Category::Structure => 30,
            Category::Styling => 20,
            Category::ScriptIntegration => 20,
            Category::Accessibility => 20,
            Category::Architecture => 10,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Structure => "structure",
            Category::Styling => "styling",
            Category::ScriptIntegration => "script-integration",
            Category::Accessibility => "accessibility",
            Category::Architecture => "architecture",
        }
    }
}

impl std::str::FromStr for Category {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "structure" => Ok(Category::Structure),
            "styling" => Ok(Category::Styling),
            "script-integration" => Ok(Category::ScriptIntegration),
            "accessibility" => Ok(Category::Accessibility),
            "architecture" => Ok(Category::Architecture),
            _ => Err(anyhow::anyhow!(
                "Unknown category '{}'. Valid categories: structure, styling, \
                 script-integration, accessibility, architecture",
                s
            )),
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Criticality tier of a component. Drives gate strictness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Critical,
    #[default]
    Standard,
    Experimental,
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tier::Critical => write!(f, "critical"),
            Tier::Standard => write!(f, "standard"),
            Tier::Experimental => write!(f, "experimental"),
        }
    }
}

/// One recorded rule failure against a component file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Violation {
    #[serde(default)]
    pub id: String,
    pub rule_id: String,
    pub component: String,
    /// Component-relative file path; empty when the violation is not tied
    /// to a single file (e.g. a missing artifact).
    #[serde(default)]
    pub file: String,
    /// 1-based line number, 0 if unknown.
    #[serde(default)]
    pub line: u32,
    pub category: Category,
    pub severity: Severity,
    pub message: String,
    #[serde(default)]
    pub auto_fix_available: bool,
}

impl Violation {
    pub fn new(
        rule_id: impl Into<String>,
        component: impl Into<String>,
        file: impl Into<String>,
        line: u32,
        category: Category,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        let rule_id = rule_id.into();
        let component = component.into();
        let file = file.into();
        let message = message.into();
        let id = deterministic_violation_id(&rule_id, &component, &file, line, &message);
        Self {
            id,
            rule_id,
            component,
            file,
            line,
            category,
            severity,
            message,
            auto_fix_available: false,
        }
    }

    pub fn with_auto_fix(mut self) -> Self {
        self.auto_fix_available = true;
        self
    }
}

/// Sort violations into the total display order: (component, file, line,
/// rule_id). Downstream stages rely on this to make reports byte-identical
/// regardless of worker count.
pub fn sort_violations(violations: &mut [Violation]) {
    violations.sort_by(|a, b| {
        a.component
            .cmp(&b.component)
            .then_with(|| a.file.cmp(&b.file))
            .then_with(|| a.line.cmp(&b.line))
            .then_with(|| a.rule_id.cmp(&b.rule_id))
    });
}

/// Summary of violations by severity
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ViolationsSummary {
    pub critical: usize,
    pub major: usize,
    pub minor: usize,
    pub total: usize,
}

impl ViolationsSummary {
    pub fn from_violations(violations: &[Violation]) -> Self {
        let mut summary = Self::default();
        for v in violations {
            match v.severity {
                Severity::Critical => summary.critical += 1,
                Severity::Major => summary.major += 1,
                Severity::Minor => summary.minor += 1,
            }
            summary.total += 1;
        }
        summary
    }
}

/// Weighted health score for one component.
///
/// Derived deterministically from the component's violation set; `total`
/// is always the sum of `category_scores`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentScore {
    pub name: String,
    pub tier: Tier,
    pub category_scores: BTreeMap<Category, u32>,
    pub total: u32,
}

/// Run scope: everything, a git diff, or one named component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    Full,
    Diff(String),
    Component(String),
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scope::Full => write!(f, "full"),
            Scope::Diff(r) => write!(f, "diff:{}", r),
            Scope::Component(c) => write!(f, "component:{}", c),
        }
    }
}

/// Aggregate run statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Aggregate {
    /// Mean component score (0.0 when the scope is empty).
    pub mean: f64,
    /// Count of components that failed their tier gate.
    pub below_threshold: usize,
}

/// The sole artifact written to disk/stdout. No mutation after emission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceReport {
    pub timestamp: DateTime<Utc>,
    pub scope: String,
    /// Ordered by descending score, ties broken alphabetically.
    pub components: Vec<ComponentScore>,
    /// Flat list in the deterministic display order.
    pub violations: Vec<Violation>,
    pub summary: ViolationsSummary,
    pub aggregate: Aggregate,
    /// One verdict per component, in the same order as `components`.
    pub gates: Vec<crate::gate::GateVerdict>,
    /// Fix attempts from this run; empty unless `--fix` was given.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fixes: Vec<crate::fixes::FixOutcome>,
    pub exit_code: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_weights_sum_to_100() {
        let total: u32 = Category::ALL.iter().map(|c| c.weight()).sum();
        assert_eq!(total, 100);
    }

    #[test]
    fn severity_ordering() {
        assert!(Severity::Critical > Severity::Major);
        assert!(Severity::Major > Severity::Minor);
    }

    #[test]
    fn deterministic_ids_are_stable() {
        let a = deterministic_violation_id("r", "c", "f.ts", 3, "msg");
        let b = deterministic_violation_id("r", "c", "f.ts", 3, "msg");
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
        let c = deterministic_violation_id("r", "c", "f.ts", 4, "msg");
        assert_ne!(a, c);
    }

    #[test]
    fn violation_sort_is_total() {
        let mut violations = vec![
            Violation::new("z", "beta", "b.ts", 1, Category::Styling, Severity::Minor, "m"),
            Violation::new("a", "alpha", "a.ts", 9, Category::Styling, Severity::Minor, "m"),
            Violation::new("a", "alpha", "a.ts", 2, Category::Styling, Severity::Minor, "m"),
            Violation::new("b", "alpha", "a.ts", 2, Category::Styling, Severity::Minor, "m"),
        ];
        sort_violations(&mut violations);
        let keys: Vec<(&str, u32, &str)> = violations
            .iter()
            .map(|v| (v.component.as_str(), v.line, v.rule_id.as_str()))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("alpha", 2, "a"),
                ("alpha", 2, "b"),
                ("alpha", 9, "a"),
                ("beta", 1, "z"),
            ]
        );
    }

    #[test]
    fn category_serializes_kebab_case() {
        let json = serde_json::to_string(&Category::ScriptIntegration).unwrap();
        assert_eq!(json, "\"script-integration\"");
    }

    #[test]
    fn summary_counts() {
        let violations = vec![
            Violation::new("a", "c", "f", 1, Category::Structure, Severity::Critical, "x"),
            Violation::new("b", "c", "f", 2, Category::Styling, Severity::Major, "y"),
            Violation::new("c", "c", "f", 3, Category::Styling, Severity::Minor, "z"),
        ];
        let s = ViolationsSummary::from_violations(&violations);
        assert_eq!((s.critical, s.major, s.minor, s.total), (1, 1, 1, 3));
    }
}
