//! Script-integration rules for interactive components: lifecycle pairing
//! and the duplicate-initialization heuristic.

use super::{class_close_line, is_comment, Edit, FixPatch, Rule};
use crate::loader::{ArtifactRole, ComponentArtifact};
use crate::models::{Category, Severity, Violation};
use regex::Regex;
use std::sync::OnceLock;

static INIT_CALL: OnceLock<Regex> = OnceLock::new();

fn init_call() -> &'static Regex {
    INIT_CALL.get_or_init(|| {
        Regex::new(r"this\.(init|initialize|setup)\s*\(").expect("valid regex")
    })
}

/// Interactive components need exactly one `connectedCallback` entry path
/// and a structurally paired `disconnectedCallback` cleanup.
pub struct InitCleanupPairRule;

/// 1-based lines defining or invoking `method`. Checks the character
/// before each match so `connectedCallback` never matches inside
/// `disconnectedCallback`.
fn count_method(content: &str, method: &str) -> Vec<u32> {
    let needle = format!("{method}(");
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            if is_comment(line) {
                return false;
            }
            line.match_indices(&needle).any(|(idx, _)| {
                idx == 0
                    || !line[..idx]
                        .chars()
                        .next_back()
                        .is_some_and(|c| c.is_alphanumeric() || c == '_')
            })
        })
        .map(|(i, _)| i as u32 + 1)
        .collect()
}

/// Boundary-checked single-line variant of [`count_method`].
fn contains_method(line: &str, method: &str) -> bool {
    let needle = format!("{method}(");
    line.match_indices(&needle).any(|(idx, _)| {
        idx == 0
            || !line[..idx]
                .chars()
                .next_back()
                .is_some_and(|c| c.is_alphanumeric() || c == '_')
    })
}

impl Rule for InitCleanupPairRule {
    fn id(&self) -> &'static str {
        "init-cleanup-pair"
    }

    fn category(&self) -> Category {
        Category::ScriptIntegration
    }

    fn severity(&self) -> Severity {
        Severity::Major
    }

    fn applies_to(&self, artifact: &ComponentArtifact) -> bool {
        artifact.interactive
    }

    fn check(&self, artifact: &ComponentArtifact) -> Vec<Violation> {
        let implementation = artifact.implementation();
        let connected = count_method(&implementation.content, "connectedCallback");
        let disconnected = count_method(&implementation.content, "disconnectedCallback");
        let mut violations = Vec::new();

        match connected.len() {
            1 => {}
            0 => violations.push(Violation::new(
                self.id(),
                &artifact.name,
                &implementation.path,
                0,
                self.category(),
                self.severity(),
                "interactive component has no connectedCallback initialization path",
            )),
            n => violations.push(Violation::new(
                self.id(),
                &artifact.name,
                &implementation.path,
                connected[1],
                self.category(),
                self.severity(),
                format!("found {n} connectedCallback definitions, exactly one permitted"),
            )),
        }

        if disconnected.is_empty() {
            violations.push(
                Violation::new(
                    self.id(),
                    &artifact.name,
                    &implementation.path,
                    0,
                    self.category(),
                    self.severity(),
                    "interactive component never pairs its initialization with a disconnectedCallback cleanup",
                )
                .with_auto_fix(),
            );
        }

        violations
    }

    fn auto_fix(&self, artifact: &ComponentArtifact, violation: &Violation) -> Option<FixPatch> {
        // Only the missing-cleanup violation carries a template.
        if !violation.message.contains("disconnectedCallback") {
            return None;
        }
        let implementation = artifact.implementation();
        if !count_method(&implementation.content, "disconnectedCallback").is_empty() {
            return None;
        }
        let at = class_close_line(&implementation.content);
        Some(FixPatch {
            role: ArtifactRole::Implementation,
            edit: Edit::InsertLine {
                at,
                text: "  disconnectedCallback() {\n    super.disconnectedCallback();\n  }"
                    .to_string(),
            },
        })
    }
}

/// Heuristic duplicate-initialization detector.
///
/// Counts init call sites (`this.init/initialize/setup`) attributed to the
/// nearest enclosing `constructor` or `connectedCallback` header and flags
/// only when both families are non-zero and no `_initialized` guard-flag
/// marker is present. This is best-effort pattern counting, not dataflow
/// analysis; guarded double paths and aliased calls are out of reach.
pub struct DuplicateInitializationRule;

const GUARD_MARKER: &str = "_initialized";

#[derive(Clone, Copy, PartialEq)]
enum InitFamily {
    None,
    Constructor,
    ConnectedCallback,
}

impl Rule for DuplicateInitializationRule {
    fn id(&self) -> &'static str {
        "duplicate-initialization"
    }

    fn category(&self) -> Category {
        Category::ScriptIntegration
    }

    fn severity(&self) -> Severity {
        Severity::Major
    }

    fn applies_to(&self, artifact: &ComponentArtifact) -> bool {
        artifact.interactive
    }

    fn check(&self, artifact: &ComponentArtifact) -> Vec<Violation> {
        let implementation = artifact.implementation();
        let content = &implementation.content;

        if content.contains(GUARD_MARKER) {
            return Vec::new();
        }

        let mut family = InitFamily::None;
        let mut constructor_inits = 0usize;
        let mut connected_inits = 0usize;
        let mut second_site_line = 0u32;

        for (i, line) in content.lines().enumerate() {
            if is_comment(line) {
                continue;
            }
            if line.contains("constructor(") {
                family = InitFamily::Constructor;
            } else if contains_method(line, "connectedCallback") {
                family = InitFamily::ConnectedCallback;
            } else if contains_method(line, "disconnectedCallback") {
                family = InitFamily::None;
            }

            if init_call().is_match(line) {
                match family {
                    InitFamily::Constructor => constructor_inits += 1,
                    InitFamily::ConnectedCallback => {
                        connected_inits += 1;
                        second_site_line = i as u32 + 1;
                    }
                    InitFamily::None => {}
                }
            }
        }

        if constructor_inits > 0 && connected_inits > 0 {
            return vec![Violation::new(
                self.id(),
                &artifact.name,
                &implementation.path,
                second_site_line,
                self.category(),
                self.severity(),
                "initialization is reachable from both the constructor and connectedCallback with no guard flag",
            )];
        }

        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProjectConfig;
    use crate::loader::{ArtifactLoader, MockFiles};

    fn interactive_artifact(source: &str) -> ComponentArtifact {
        // addEventListener marker makes the component interactive
        let full = format!("{source}\n// wiring: addEventListener(\n");
        let provider = MockFiles::new(vec![("src/components/menu/menu.ts", full.as_str())]);
        let config = ProjectConfig::default();
        ArtifactLoader::new(&provider, &config).load("menu").unwrap()
    }

    #[test]
    fn paired_lifecycle_is_clean() {
        let artifact = interactive_artifact(
            "class Menu {\n  connectedCallback() {\n    this.init();\n  }\n  disconnectedCallback() {\n  }\n}",
        );
        assert!(InitCleanupPairRule.check(&artifact).is_empty());
    }

    #[test]
    fn missing_cleanup_is_fixable() {
        let artifact = interactive_artifact(
            "class Menu {\n  connectedCallback() {\n    this.init();\n  }\n}",
        );
        let violations = InitCleanupPairRule.check(&artifact);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].auto_fix_available);

        let patch = InitCleanupPairRule.auto_fix(&artifact, &violations[0]).unwrap();
        let patched = patch.apply(&artifact.implementation().content);
        assert!(patched.contains("disconnectedCallback()"));

        // The patched copy re-passes the rule
        let fixed = artifact.with_content(ArtifactRole::Implementation, patched.into());
        assert!(InitCleanupPairRule.check(&fixed).is_empty());
    }

    #[test]
    fn double_init_without_guard_flags() {
        let artifact = interactive_artifact(
            "class Menu {\n  constructor() {\n    super();\n    this.init();\n  }\n  connectedCallback() {\n    this.init();\n  }\n  disconnectedCallback() {}\n}",
        );
        let violations = DuplicateInitializationRule.check(&artifact);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].line, 7);
    }

    #[test]
    fn guard_marker_suppresses_heuristic() {
        let artifact = interactive_artifact(
            "class Menu {\n  constructor() {\n    this.init();\n  }\n  connectedCallback() {\n    if (!this._initialized) this.init();\n  }\n}",
        );
        assert!(DuplicateInitializationRule.check(&artifact).is_empty());
    }

    #[test]
    fn single_family_is_clean() {
        let artifact = interactive_artifact(
            "class Menu {\n  connectedCallback() {\n    this.init();\n  }\n  disconnectedCallback() {}\n}",
        );
        assert!(DuplicateInitializationRule.check(&artifact).is_empty());
    }
}
