//! Architecture rules: light-DOM rendering, approved base classes, and
//! safe content assignment.

use super::{class_close_line, is_comment, Edit, FixPatch, Rule};
use crate::loader::{ArtifactRole, ComponentArtifact};
use crate::models::{Category, Severity, Violation};
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

static EXTENDS_CLAUSE: OnceLock<Regex> = OnceLock::new();

fn extends_clause() -> &'static Regex {
    EXTENDS_CLAUSE.get_or_init(|| {
        Regex::new(r"class\s+\w+\s+extends\s+([A-Za-z_][A-Za-z0-9_]*)").expect("valid regex")
    })
}

/// Components render into light DOM; the `createRenderRoot` override is
/// the marker for that.
pub struct LightDomMarkerRule;

impl Rule for LightDomMarkerRule {
    fn id(&self) -> &'static str {
        "light-dom-marker"
    }

    fn category(&self) -> Category {
        Category::Architecture
    }

    fn severity(&self) -> Severity {
        Severity::Major
    }

    fn check(&self, artifact: &ComponentArtifact) -> Vec<Violation> {
        let implementation = artifact.implementation();
        let present = implementation
            .content
            .lines()
            .filter(|line| !is_comment(line))
            .any(|line| line.contains("createRenderRoot"));

        if present {
            return Vec::new();
        }

        vec![Violation::new(
            self.id(),
            &artifact.name,
            &implementation.path,
            0,
            self.category(),
            self.severity(),
            "component is missing the createRenderRoot light-DOM marker",
        )
        .with_auto_fix()]
    }

    fn auto_fix(&self, artifact: &ComponentArtifact, _violation: &Violation) -> Option<FixPatch> {
        let implementation = artifact.implementation();
        if implementation.content.contains("createRenderRoot") {
            return None;
        }
        let at = class_close_line(&implementation.content);
        Some(FixPatch {
            role: ArtifactRole::Implementation,
            edit: Edit::InsertLine {
                at,
                text: "  createRenderRoot() {\n    return this;\n  }".to_string(),
            },
        })
    }
}

/// The component class must extend one of the approved bases.
pub struct BaseClassAllowlistRule {
    allowed: HashSet<String>,
}

impl BaseClassAllowlistRule {
    pub fn new(allowed: Vec<String>) -> Self {
        Self {
            allowed: allowed.into_iter().collect(),
        }
    }
}

impl Rule for BaseClassAllowlistRule {
    fn id(&self) -> &'static str {
        "base-class-allowlist"
    }

    fn category(&self) -> Category {
        Category::Architecture
    }

    fn severity(&self) -> Severity {
        Severity::Critical
    }

    fn check(&self, artifact: &ComponentArtifact) -> Vec<Violation> {
        let implementation = artifact.implementation();

        for (i, line) in implementation.content.lines().enumerate() {
            if is_comment(line) {
                continue;
            }
            if let Some(caps) = extends_clause().captures(line) {
                let base = &caps[1];
                if self.allowed.contains(base) {
                    return Vec::new();
                }
                return vec![Violation::new(
                    self.id(),
                    &artifact.name,
                    &implementation.path,
                    i as u32 + 1,
                    self.category(),
                    self.severity(),
                    format!("component extends '{base}', which is not an approved base class"),
                )];
            }
        }

        vec![Violation::new(
            self.id(),
            &artifact.name,
            &implementation.path,
            0,
            self.category(),
            self.severity(),
            "component class does not extend an approved base class",
        )]
    }
}

/// Raw `innerHTML` assignment bypasses sanitization; content must go
/// through `textContent` or the template renderer.
pub struct SafeContentRule;

impl Rule for SafeContentRule {
    fn id(&self) -> &'static str {
        "safe-content"
    }

    fn category(&self) -> Category {
        Category::Architecture
    }

    fn severity(&self) -> Severity {
        Severity::Major
    }

    fn check(&self, artifact: &ComponentArtifact) -> Vec<Violation> {
        let implementation = artifact.implementation();
        implementation
            .content
            .lines()
            .enumerate()
            .filter(|(_, line)| !is_comment(line) && line.contains(".innerHTML ="))
            .map(|(i, _)| {
                Violation::new(
                    self.id(),
                    &artifact.name,
                    &implementation.path,
                    i as u32 + 1,
                    self.category(),
                    self.severity(),
                    "unsafe innerHTML assignment; use textContent or the template renderer",
                )
                .with_auto_fix()
            })
            .collect()
    }

    fn auto_fix(&self, artifact: &ComponentArtifact, violation: &Violation) -> Option<FixPatch> {
        if violation.line == 0 {
            return None;
        }
        let implementation = artifact.implementation();
        let idx = violation.line as usize - 1;
        let line = implementation.content.lines().nth(idx)?;
        if !line.contains(".innerHTML =") {
            return None;
        }
        Some(FixPatch {
            role: ArtifactRole::Implementation,
            edit: Edit::ReplaceLine {
                at: idx,
                text: line.replace(".innerHTML =", ".textContent ="),
            },
        })
    }
}
