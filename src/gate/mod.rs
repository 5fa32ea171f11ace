//! Severity gates: pure pass/fail evaluation per component tier.
//!
//! Tiers trade strictness for maturity. Critical components tolerate
//! nothing serious, standard components get a small allowance, and
//! experimental components only fail when they are drowning in findings.

use crate::models::{
    Aggregate, ComponentScore, Severity, Tier, Violation, EXIT_GATE_FAILED, EXIT_OK,
};
use crate::scoring;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Minimum passing total for critical-tier components.
const CRITICAL_TIER_FLOOR: u32 = 90;
/// Major-or-worse allowance for standard-tier components.
const STANDARD_TIER_ALLOWANCE: usize = 2;
/// Any-severity allowance for experimental-tier components.
const EXPERIMENTAL_TIER_ALLOWANCE: usize = 5;

/// Gate outcome for one component, with the first failing reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateVerdict {
    pub component: String,
    pub tier: Tier,
    pub passed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Evaluate one component against its tier gate.
pub fn evaluate(score: &ComponentScore, violations: &[Violation], strict: bool) -> GateVerdict {
    let own: Vec<&Violation> = violations
        .iter()
        .filter(|v| v.component == score.name)
        .collect();

    let reason = match score.tier {
        Tier::Critical => {
            if own.iter().any(|v| v.severity == Severity::Critical) {
                Some("critical-tier component has a critical violation".to_string())
            } else if score.total < CRITICAL_TIER_FLOOR {
                Some(format!(
                    "critical-tier score {} is below the floor of {}",
                    score.total, CRITICAL_TIER_FLOOR
                ))
            } else {
                None
            }
        }
        Tier::Standard => {
            let serious = own
                .iter()
                .filter(|v| v.severity >= Severity::Major)
                .count();
            if serious > STANDARD_TIER_ALLOWANCE {
                Some(format!(
                    "{serious} major-or-worse violations exceed the standard-tier allowance of {STANDARD_TIER_ALLOWANCE}"
                ))
            } else {
                None
            }
        }
        Tier::Experimental => {
            if own.len() > EXPERIMENTAL_TIER_ALLOWANCE {
                Some(format!(
                    "{} violations exceed the experimental-tier allowance of {}",
                    own.len(),
                    EXPERIMENTAL_TIER_ALLOWANCE
                ))
            } else {
                None
            }
        }
    };

    // Strict mode tightens every tier the same way.
    let reason = reason.or_else(|| {
        if strict && own.iter().any(|v| v.severity == Severity::Minor) {
            Some("minor violations are gate-failing in strict mode".to_string())
        } else {
            None
        }
    });

    debug!(
        "Gate {} ({}): {}",
        score.name,
        score.tier,
        if reason.is_none() { "pass" } else { "fail" }
    );

    GateVerdict {
        component: score.name.clone(),
        tier: score.tier,
        passed: reason.is_none(),
        reason,
    }
}

/// Evaluate every component.
pub fn evaluate_all(
    scores: &[ComponentScore],
    violations: &[Violation],
    strict: bool,
) -> Vec<GateVerdict> {
    scores
        .iter()
        .map(|score| evaluate(score, violations, strict))
        .collect()
}

/// Reduce the verdict list to the run exit code.
pub fn exit_code(verdicts: &[GateVerdict]) -> i32 {
    if verdicts.iter().all(|v| v.passed) {
        EXIT_OK
    } else {
        EXIT_GATE_FAILED
    }
}

/// Run-level aggregate: mean score plus the gate-failure count.
pub fn aggregate(scores: &[ComponentScore], verdicts: &[GateVerdict]) -> Aggregate {
    Aggregate {
        mean: scoring::mean(scores),
        below_threshold: verdicts.iter().filter(|v| !v.passed).count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use std::collections::BTreeMap;

    fn score(name: &str, tier: Tier, total: u32) -> ComponentScore {
        ComponentScore {
            name: name.to_string(),
            tier,
            category_scores: BTreeMap::new(),
            total,
        }
    }

    fn violations(component: &str, severities: &[Severity]) -> Vec<Violation> {
        severities
            .iter()
            .enumerate()
            .map(|(i, &severity)| {
                Violation::new(
                    "test-rule",
                    component,
                    "x.ts",
                    i as u32 + 1,
                    Category::Styling,
                    severity,
                    "test",
                )
            })
            .collect()
    }

    #[test]
    fn critical_tier_fails_on_one_critical_violation() {
        let s = score("nav", Tier::Critical, 95);
        let v = violations("nav", &[Severity::Critical]);
        let verdict = evaluate(&s, &v, false);
        assert!(!verdict.passed);
    }

    #[test]
    fn critical_tier_fails_below_floor() {
        let s = score("nav", Tier::Critical, 89);
        let verdict = evaluate(&s, &[], false);
        assert!(!verdict.passed);
        assert!(verdict.reason.unwrap().contains("below the floor"));
    }

    #[test]
    fn critical_tier_passes_at_floor() {
        let s = score("nav", Tier::Critical, 90);
        assert!(evaluate(&s, &[], false).passed);
    }

    #[test]
    fn standard_tier_allows_two_majors() {
        let s = score("card", Tier::Standard, 70);
        let two = violations("card", &[Severity::Major, Severity::Major]);
        assert!(evaluate(&s, &two, false).passed);

        let three = violations("card", &[Severity::Major, Severity::Major, Severity::Critical]);
        assert!(!evaluate(&s, &three, false).passed);
    }

    #[test]
    fn experimental_tier_allows_five_of_any() {
        let s = score("draft", Tier::Experimental, 40);
        let five = violations("draft", &[Severity::Minor; 5]);
        assert!(evaluate(&s, &five, false).passed);

        let six = violations("draft", &[Severity::Minor; 6]);
        assert!(!evaluate(&s, &six, false).passed);
    }

    #[test]
    fn strict_mode_fails_on_minor_in_every_tier() {
        let minor = |name: &str| violations(name, &[Severity::Minor]);
        for tier in [Tier::Critical, Tier::Standard, Tier::Experimental] {
            let s = score("chip", tier, 95);
            assert!(evaluate(&s, &minor("chip"), false).passed);
            assert!(!evaluate(&s, &minor("chip"), true).passed);
        }
    }

    #[test]
    fn verdicts_only_count_own_violations() {
        let s = score("card", Tier::Standard, 70);
        let other = violations("sidebar", &[Severity::Major, Severity::Major, Severity::Major]);
        assert!(evaluate(&s, &other, false).passed);
    }

    #[test]
    fn exit_code_reduces_over_verdicts() {
        let pass = GateVerdict {
            component: "a".to_string(),
            tier: Tier::Standard,
            passed: true,
            reason: None,
        };
        let fail = GateVerdict {
            component: "b".to_string(),
            tier: Tier::Standard,
            passed: false,
            reason: Some("x".to_string()),
        };
        assert_eq!(exit_code(&[pass.clone()]), EXIT_OK);
        assert_eq!(exit_code(&[pass, fail]), EXIT_GATE_FAILED);
        assert_eq!(exit_code(&[]), EXIT_OK);
    }

    #[test]
    fn aggregate_counts_gate_failures() {
        let scores = vec![
            score("a", Tier::Standard, 100),
            score("b", Tier::Critical, 80),
        ];
        let verdicts = evaluate_all(&scores, &[], false);
        let agg = aggregate(&scores, &verdicts);
        assert!((agg.mean - 90.0).abs() < f64::EPSILON);
        assert_eq!(agg.below_threshold, 1);
    }
}
