//! Score calculation.
//!
//! Pure functions over the sorted violation list. Each category starts at
//! its full weight and loses points per violation: a critical violation
//! zeroes the category (full weight deducted), a major costs half the
//! weight, a minor costs a configurable flat amount. Categories floor at
//! zero and the total is the clamped sum, so a component with no
//! violations scores exactly 100.

use crate::loader::ComponentArtifact;
use crate::models::{Category, ComponentScore, Severity, Violation};
use std::collections::BTreeMap;
use tracing::debug;

/// Score one component from its slice of the violation list.
pub fn score_component(
    artifact: &ComponentArtifact,
    violations: &[Violation],
    minor_penalty: u32,
) -> ComponentScore {
    let mut category_scores: BTreeMap<Category, u32> = Category::ALL
        .iter()
        .map(|&category| (category, category.weight()))
        .collect();

    for violation in violations {
        debug_assert_eq!(violation.component, artifact.name);
        let weight = violation.category.weight();
        let penalty = match violation.severity {
            Severity::Critical => weight,
            Severity::Major => weight / 2,
            Severity::Minor => minor_penalty,
        };
        let score = category_scores.entry(violation.category).or_insert(weight);
        *score = score.saturating_sub(penalty);
    }

    let total: u32 = category_scores.values().sum::<u32>().min(100);
    debug!("Scored {}: {}", artifact.name, total);

    ComponentScore {
        name: artifact.name.clone(),
        tier: artifact.tier,
        category_scores,
        total,
    }
}

/// Score every component. `violations` must already be sorted by
/// component; each component receives exactly its own slice.
pub fn score_all(
    artifacts: &[ComponentArtifact],
    violations: &[Violation],
    minor_penalty: u32,
) -> Vec<ComponentScore> {
    artifacts
        .iter()
        .map(|artifact| {
            let own: Vec<Violation> = violations
                .iter()
                .filter(|v| v.component == artifact.name)
                .cloned()
                .collect();
            score_component(artifact, &own, minor_penalty)
        })
        .collect()
}

/// Mean component score; 0.0 for an empty run.
pub fn mean(scores: &[ComponentScore]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    let sum: u32 = scores.iter().map(|s| s.total).sum();
    f64::from(sum) / scores.len() as f64
}

/// Report ordering: descending score, alphabetical on ties.
pub fn sort_scores(scores: &mut [ComponentScore]) {
    scores.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.name.cmp(&b.name)));
}
