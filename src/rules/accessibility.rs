//! Accessibility rules for interactive components: ARIA state wiring and
//! keyboard operability.

use super::{is_comment, Rule};
use crate::loader::ComponentArtifact;
use crate::models::{Category, Severity, Violation};
use regex::Regex;
use std::sync::OnceLock;

static ROLE_ASSIGNMENT: OnceLock<Regex> = OnceLock::new();
static ARIA_STATE: OnceLock<Regex> = OnceLock::new();
static KEYBOARD_BRANCH: OnceLock<Regex> = OnceLock::new();

fn role_assignment() -> &'static Regex {
    ROLE_ASSIGNMENT.get_or_init(|| {
        Regex::new(r#"role\s*=|setAttribute\(\s*['"]role['"]"#).expect("valid regex")
    })
}

fn aria_state() -> &'static Regex {
    ARIA_STATE.get_or_init(|| {
        Regex::new(r#"aria-[a-z]+\s*=|setAttribute\(\s*['"]aria-[a-z]+['"]"#)
            .expect("valid regex")
    })
}

fn keyboard_branch() -> &'static Regex {
    KEYBOARD_BRANCH.get_or_init(|| {
        Regex::new(r#"['"](keydown|keyup)['"]|\.key\s*===?|\.code\s*===?"#).expect("valid regex")
    })
}

/// Interactive components must assign a role and at least one ARIA state
/// attribute.
pub struct AriaStateRule;

impl Rule for AriaStateRule {
    fn id(&self) -> &'static str {
        "aria-state"
    }

    fn category(&self) -> Category {
        Category::Accessibility
    }

    fn severity(&self) -> Severity {
        Severity::Major
    }

    fn applies_to(&self, artifact: &ComponentArtifact) -> bool {
        artifact.interactive
    }

    fn check(&self, artifact: &ComponentArtifact) -> Vec<Violation> {
        let implementation = artifact.implementation();
        let mut has_role = false;
        let mut has_aria = false;

        for line in implementation.content.lines() {
            if is_comment(line) {
                continue;
            }
            has_role = has_role || role_assignment().is_match(line);
            has_aria = has_aria || aria_state().is_match(line);
            if has_role && has_aria {
                return Vec::new();
            }
        }

        let mut violations = Vec::new();
        if !has_role {
            violations.push(Violation::new(
                self.id(),
                &artifact.name,
                &implementation.path,
                0,
                self.category(),
                self.severity(),
                "interactive component never assigns a role attribute",
            ));
        }
        if !has_aria {
            violations.push(Violation::new(
                self.id(),
                &artifact.name,
                &implementation.path,
                0,
                self.category(),
                self.severity(),
                "interactive component never assigns an aria-* state attribute",
            ));
        }
        violations
    }
}

/// Interactive components must handle at least one keyboard-event branch;
/// pointer-only interaction is not operable.
pub struct KeyboardBranchRule;

impl Rule for KeyboardBranchRule {
    fn id(&self) -> &'static str {
        "keyboard-branch"
    }

    fn category(&self) -> Category {
        Category::Accessibility
    }

    fn severity(&self) -> Severity {
        Severity::Major
    }

    fn applies_to(&self, artifact: &ComponentArtifact) -> bool {
        artifact.interactive
    }

    fn check(&self, artifact: &ComponentArtifact) -> Vec<Violation> {
        let implementation = artifact.implementation();
        let handled = implementation
            .content
            .lines()
            .filter(|line| !is_comment(line))
            .any(|line| keyboard_branch().is_match(line));

        if handled {
            return Vec::new();
        }

        vec![Violation::new(
            self.id(),
            &artifact.name,
            &implementation.path,
            0,
            self.category(),
            self.severity(),
            "interactive component has no keyboard-event branch",
        )]
    }
}
