//! Styling rules: stylesheet imports, host style surface, class vocabulary.

use super::{is_comment, Edit, FixPatch, Rule};
use crate::loader::{ArtifactRole, ComponentArtifact};
use crate::models::{Category, Severity, Violation};
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

static STYLE_IMPORT: OnceLock<Regex> = OnceLock::new();

fn style_import() -> &'static Regex {
    STYLE_IMPORT.get_or_init(|| {
        Regex::new(r#"^import\s+(?:\w+\s+from\s+)?['"][^'"]+\.css['"];?\s*$"#)
            .expect("valid regex")
    })
}

/// 1-based line numbers of top-level stylesheet imports.
fn style_import_lines(content: &str) -> Vec<u32> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| style_import().is_match(line))
        .map(|(i, _)| i as u32 + 1)
        .collect()
}

/// Exactly one top-level style import is permitted.
pub struct SingleStyleImportRule;

impl Rule for SingleStyleImportRule {
    fn id(&self) -> &'static str {
        "single-style-import"
    }

    fn category(&self) -> Category {
        Category::Styling
    }

    fn severity(&self) -> Severity {
        Severity::Major
    }

    fn check(&self, artifact: &ComponentArtifact) -> Vec<Violation> {
        let implementation = artifact.implementation();
        let imports = style_import_lines(&implementation.content);

        match imports.len() {
            1 => Vec::new(),
            0 => vec![Violation::new(
                self.id(),
                &artifact.name,
                &implementation.path,
                0,
                self.category(),
                self.severity(),
                "component has no top-level stylesheet import",
            )
            .with_auto_fix()],
            n => vec![Violation::new(
                self.id(),
                &artifact.name,
                &implementation.path,
                imports[1],
                self.category(),
                self.severity(),
                format!("found {n} top-level stylesheet imports, exactly one permitted"),
            )],
        }
    }

    fn auto_fix(&self, artifact: &ComponentArtifact, _violation: &Violation) -> Option<FixPatch> {
        let implementation = artifact.implementation();
        // Only the missing-import case has a template; competing imports
        // need a human to pick the survivor.
        if !style_import_lines(&implementation.content).is_empty() {
            return None;
        }
        Some(FixPatch {
            role: ArtifactRole::Implementation,
            edit: Edit::InsertLine {
                at: 0,
                text: format!("import styles from './{}.css';", artifact.name),
            },
        })
    }
}

static HOST_PROPERTY: OnceLock<Regex> = OnceLock::new();

fn host_property() -> &'static Regex {
    HOST_PROPERTY.get_or_init(|| {
        Regex::new(r"^\s*([a-zA-Z-]+)\s*:\s*[^;]+;").expect("valid regex")
    })
}

/// Properties declared in the component's `:host` block must come from a
/// small allow-list (display/containment by default).
pub struct HostStyleAllowlistRule {
    allowed: HashSet<String>,
}

impl HostStyleAllowlistRule {
    pub fn new(allowed: Vec<String>) -> Self {
        Self {
            allowed: allowed.into_iter().collect(),
        }
    }
}

impl Rule for HostStyleAllowlistRule {
    fn id(&self) -> &'static str {
        "host-style-allowlist"
    }

    fn category(&self) -> Category {
        Category::Styling
    }

    fn severity(&self) -> Severity {
        Severity::Minor
    }

    fn check(&self, artifact: &ComponentArtifact) -> Vec<Violation> {
        let implementation = artifact.implementation();
        let mut violations = Vec::new();
        let mut in_host_block = false;

        for (i, line) in implementation.content.lines().enumerate() {
            if is_comment(line) {
                continue;
            }
            if line.contains(":host") && line.contains('{') {
                in_host_block = true;
                continue;
            }
            if in_host_block {
                if line.trim_start().starts_with('}') {
                    in_host_block = false;
                    continue;
                }
                if let Some(caps) = host_property().captures(line) {
                    let prop = caps[1].to_lowercase();
                    if !self.allowed.contains(&prop) {
                        violations.push(Violation::new(
                            self.id(),
                            &artifact.name,
                            &implementation.path,
                            i as u32 + 1,
                            self.category(),
                            self.severity(),
                            format!("host style declares '{prop}', which is outside the allowed property set"),
                        ));
                    }
                }
            }
        }

        violations
    }
}

static CLASS_ATTR: OnceLock<Regex> = OnceLock::new();

fn class_attr() -> &'static Regex {
    CLASS_ATTR.get_or_init(|| Regex::new(r#"class=["']([^"']*)["']"#).expect("valid regex"))
}

/// Class tokens in rendered markup must come from the maintained
/// design-system vocabulary. Inert when no vocabulary is configured.
pub struct ClassVocabularyRule {
    vocabulary: HashSet<String>,
}

impl ClassVocabularyRule {
    pub fn new(vocabulary: Vec<String>) -> Self {
        Self {
            vocabulary: vocabulary.into_iter().collect(),
        }
    }
}

impl Rule for ClassVocabularyRule {
    fn id(&self) -> &'static str {
        "class-vocabulary"
    }

    fn category(&self) -> Category {
        Category::Styling
    }

    fn severity(&self) -> Severity {
        Severity::Minor
    }

    fn applies_to(&self, _artifact: &ComponentArtifact) -> bool {
        !self.vocabulary.is_empty()
    }

    fn check(&self, artifact: &ComponentArtifact) -> Vec<Violation> {
        let implementation = artifact.implementation();
        let mut violations = Vec::new();

        for (i, line) in implementation.content.lines().enumerate() {
            if is_comment(line) {
                continue;
            }
            for caps in class_attr().captures_iter(line) {
                for token in caps[1].split_whitespace() {
                    if !self.vocabulary.contains(token) {
                        violations.push(Violation::new(
                            self.id(),
                            &artifact.name,
                            &implementation.path,
                            i as u32 + 1,
                            self.category(),
                            self.severity(),
                            format!("class '{token}' is not in the design-system vocabulary"),
                        ));
                    }
                }
            }
        }

        violations
    }
}
