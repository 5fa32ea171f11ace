//! Compliance rules
//!
//! Each rule is a pure, categorized check over a component's artifact
//! bundle. Rules never touch the filesystem and never mutate their input;
//! they return structured [`Violation`]s with best-effort line numbers.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                    RuleRegistry                      │
//! │  - immutable once constructed, passed by reference   │
//! │  - rejects duplicate rule IDs                        │
//! │  - filters by applicability and category             │
//! └──────────────────────────────────────────────────────┘
//!                          │
//!                          ▼
//! ┌──────────────────────────────────────────────────────┐
//! │                      Rule trait                      │
//! │  - id() / category() / severity()                    │
//! │  - applies_to(artifact): tag predicate               │
//! │  - check(artifact): pure matcher                     │
//! │  - auto_fix(artifact, violation): patch template     │
//! └──────────────────────────────────────────────────────┘
//! ```

mod accessibility;
mod architecture;
mod registry;
mod script;
mod structure;
mod styling;

pub use accessibility::{AriaStateRule, KeyboardBranchRule};
pub use architecture::{BaseClassAllowlistRule, LightDomMarkerRule, SafeContentRule};
pub use registry::{DuplicateRuleId, RuleRegistry};
pub use script::{DuplicateInitializationRule, InitCleanupPairRule};
pub use structure::MissingArtifactRule;
pub use styling::{ClassVocabularyRule, HostStyleAllowlistRule, SingleStyleImportRule};

use crate::loader::{ArtifactRole, ComponentArtifact};
use crate::models::{Category, Severity, Violation};

/// A named, categorized, pure check over a component artifact.
pub trait Rule: Send + Sync {
    /// Stable rule identifier (kebab-case).
    fn id(&self) -> &'static str;

    fn category(&self) -> Category;

    fn severity(&self) -> Severity;

    /// Applicability predicate over the component's tags. Rules that only
    /// make sense for interactive components return false otherwise.
    fn applies_to(&self, _artifact: &ComponentArtifact) -> bool {
        true
    }

    /// Run the matcher. Pure: same artifact always yields the same
    /// violations.
    fn check(&self, artifact: &ComponentArtifact) -> Vec<Violation>;

    /// Generate a patch for one of this rule's violations, or None when
    /// the rule has no template for it.
    fn auto_fix(&self, _artifact: &ComponentArtifact, _violation: &Violation) -> Option<FixPatch> {
        None
    }
}

/// A structured edit produced by a fix template. Edits are expressed as
/// insertion/replacement points rather than ad hoc string surgery so that
/// applying the same fix twice is a no-op at the rule level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    /// Insert `text` as a new line before 0-based line index `at`.
    InsertLine { at: usize, text: String },
    /// Replace the 0-based line `at` with `text`.
    ReplaceLine { at: usize, text: String },
}

/// A fix targeting one artifact file of a component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixPatch {
    pub role: ArtifactRole,
    pub edit: Edit,
}

impl FixPatch {
    /// Apply the edit to a content snapshot, returning the patched text.
    pub fn apply(&self, content: &str) -> String {
        let mut lines: Vec<&str> = content.lines().collect();
        let owned: String;
        match &self.edit {
            Edit::InsertLine { at, text } => {
                let at = (*at).min(lines.len());
                owned = text.clone();
                lines.insert(at, &owned);
            }
            Edit::ReplaceLine { at, text } => {
                if *at >= lines.len() {
                    return content.to_string();
                }
                owned = text.clone();
                lines[*at] = &owned;
            }
        }
        let mut out = lines.join("\n");
        if content.ends_with('\n') {
            out.push('\n');
        }
        out
    }
}

/// 0-based index of the last line that closes the top-level class body
/// (a lone `}`). Used by method-stub templates. Falls back to the end of
/// the file.
pub(crate) fn class_close_line(content: &str) -> usize {
    let lines: Vec<&str> = content.lines().collect();
    lines
        .iter()
        .rposition(|l| l.trim() == "}")
        .unwrap_or(lines.len())
}

/// Whether a source line is commented out.
pub(crate) fn is_comment(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("//") || trimmed.starts_with('*') || trimmed.starts_with("/*")
}
