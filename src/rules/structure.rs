//! Structure rules: every component exposes the full artifact bundle.

use super::Rule;
use crate::loader::{ArtifactRole, ComponentArtifact};
use crate::models::{Category, Severity, Violation};

/// Flags each missing optional artifact (test, story, readme, index).
/// An implementation-only component yields exactly four violations.
pub struct MissingArtifactRule;

impl Rule for MissingArtifactRule {
    fn id(&self) -> &'static str {
        "missing-artifact"
    }

    fn category(&self) -> Category {
        Category::Structure
    }

    fn severity(&self) -> Severity {
        Severity::Major
    }

    fn check(&self, artifact: &ComponentArtifact) -> Vec<Violation> {
        ArtifactRole::OPTIONAL
            .iter()
            .filter(|role| !artifact.has(**role))
            .map(|role| {
                Violation::new(
                    self.id(),
                    &artifact.name,
                    // Not tied to an existing file; the artifact itself is
                    // what's missing.
                    format!("<{}>", role.as_str()),
                    0,
                    self.category(),
                    self.severity(),
                    format!("component is missing its {} artifact", role.as_str()),
                )
            })
            .collect()
    }
}
