//! Auto-fix synthesis and verified write-back.
//!
//! Fixes are never trusted blind: each patch is applied to an in-memory
//! copy of the artifact and the originating rule is re-run against the
//! copy. Only a patch that actually clears its violation is kept; anything
//! else is discarded and recorded as `fix-failed`. Within a file fixes run
//! sequentially, highest line first, so replacement offsets stay valid.

use crate::loader::{ComponentArtifact, FileProvider};
use crate::models::Violation;
use crate::rules::RuleRegistry;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::Write;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum FixError {
    #[error("failed to write fixed file '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FixStatus {
    Applied,
    FixFailed,
}

/// Record of one fix attempt, keyed back to the violation it targeted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixOutcome {
    pub violation_id: String,
    pub rule_id: String,
    pub component: String,
    pub file: String,
    pub status: FixStatus,
}

pub struct FixSynthesizer<'a> {
    registry: &'a RuleRegistry,
    provider: &'a dyn FileProvider,
}

impl<'a> FixSynthesizer<'a> {
    pub fn new(registry: &'a RuleRegistry, provider: &'a dyn FileProvider) -> Self {
        Self { registry, provider }
    }

    /// Attempt every available fix. Artifacts are patched in place so later
    /// fixes see earlier ones; changed files are written back atomically.
    pub fn apply_fixes(
        &self,
        artifacts: &mut [ComponentArtifact],
        violations: &[Violation],
    ) -> Result<Vec<FixOutcome>, FixError> {
        let mut outcomes = Vec::new();

        for artifact in artifacts.iter_mut() {
            // Highest line first: ReplaceLine offsets survive, InsertLine
            // fixes (line 0) run last.
            let mut fixable: Vec<&Violation> = violations
                .iter()
                .filter(|v| v.component == artifact.name && v.auto_fix_available)
                .collect();
            if fixable.is_empty() {
                continue;
            }
            fixable.sort_by(|a, b| b.line.cmp(&a.line).then_with(|| a.rule_id.cmp(&b.rule_id)));

            let mut changed_roles = HashSet::new();

            for violation in fixable {
                let Some(rule) = self.registry.get(&violation.rule_id) else {
                    warn!("No registered rule for fixable violation {}", violation.id);
                    continue;
                };
                let Some(patch) = rule.auto_fix(artifact, violation) else {
                    debug!("Rule {} produced no patch for {}", rule.id(), violation.id);
                    outcomes.push(outcome(violation, FixStatus::FixFailed));
                    continue;
                };

                let Some(target) = artifact.file(patch.role) else {
                    outcomes.push(outcome(violation, FixStatus::FixFailed));
                    continue;
                };
                let patched = patch.apply(&target.content);
                let candidate = artifact.with_content(patch.role, patched.into());

                let persists = rule
                    .check(&candidate)
                    .iter()
                    .any(|v| v.id == violation.id);
                if persists {
                    warn!(
                        "Fix for {} on {} did not clear the violation; discarded",
                        violation.rule_id, artifact.name
                    );
                    outcomes.push(outcome(violation, FixStatus::FixFailed));
                    continue;
                }

                *artifact = candidate;
                changed_roles.insert(patch.role);
                outcomes.push(outcome(violation, FixStatus::Applied));
            }

            for role in changed_roles {
                // The patch targeted an existing file, so the role is
                // still present on the patched artifact.
                if let Some(file) = artifact.file(role) {
                    self.write_atomic(&file.path, &file.content)?;
                }
            }
        }

        let applied = outcomes.iter().filter(|o| o.status == FixStatus::Applied).count();
        info!("Fixes: {} applied, {} failed", applied, outcomes.len() - applied);

        outcomes.sort_by(|a, b| {
            a.component
                .cmp(&b.component)
                .then_with(|| a.file.cmp(&b.file))
                .then_with(|| a.rule_id.cmp(&b.rule_id))
        });
        Ok(outcomes)
    }

    /// Write via a temp file in the same directory plus rename, so a
    /// crash mid-write never truncates the original.
    fn write_atomic(&self, rel_path: &str, content: &str) -> Result<(), FixError> {
        let full = self.provider.repo_path().join(rel_path);
        let dir = full.parent().unwrap_or_else(|| self.provider.repo_path());

        let io = |source| FixError::Write {
            path: rel_path.to_string(),
            source,
        };

        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(io)?;
        tmp.write_all(content.as_bytes()).map_err(io)?;
        tmp.persist(&full).map_err(|e| io(e.error))?;
        debug!("Wrote fixed file {}", rel_path);
        Ok(())
    }
}

fn outcome(violation: &Violation, status: FixStatus) -> FixOutcome {
    FixOutcome {
        violation_id: violation.id.clone(),
        rule_id: violation.rule_id.clone(),
        component: violation.component.clone(),
        file: violation.file.clone(),
        status,
    }
}

/// Drop violations cleared by a verified fix from the report list.
pub fn prune_fixed(violations: Vec<Violation>, outcomes: &[FixOutcome]) -> Vec<Violation> {
    let applied: HashSet<&str> = outcomes
        .iter()
        .filter(|o| o.status == FixStatus::Applied)
        .map(|o| o.violation_id.as_str())
        .collect();
    violations
        .into_iter()
        .filter(|v| !applied.contains(v.id.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProjectConfig;
    use crate::engine::AnalyzerPool;
    use crate::loader::{ArtifactLoader, MockFiles};

    fn fixture() -> (MockFiles, ProjectConfig) {
        let provider = MockFiles::new(vec![(
            "src/components/chip/chip.ts",
            "import styles from './chip.css';\nclass Chip extends BaseElement {\n  set label(v) {\n    this.el.innerHTML = v;\n  }\n}\n",
        )]);
        (provider, ProjectConfig::default())
    }

    #[test]
    fn verified_fixes_clear_their_violations() {
        let (provider, config) = fixture();
        let registry = RuleRegistry::builtin(&config).unwrap();
        let loader = ArtifactLoader::new(&provider, &config);
        let mut artifacts = vec![loader.load("chip").unwrap()];

        let violations = AnalyzerPool::new(&registry, 1).run(&artifacts).unwrap();
        assert!(violations
            .iter()
            .any(|v| v.rule_id == "safe-content" && v.auto_fix_available));
        assert!(violations
            .iter()
            .any(|v| v.rule_id == "light-dom-marker" && v.auto_fix_available));

        // Write-back to the mock path will fail, so exercise the in-memory
        // stage through a throwaway provider rooted in a temp dir.
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join("src/components/chip")).unwrap();
        std::fs::write(
            tmp.path().join("src/components/chip/chip.ts"),
            &*artifacts[0].implementation().content,
        )
        .unwrap();
        let disk = crate::loader::DiskFiles::new(tmp.path());

        let synthesizer = FixSynthesizer::new(&registry, &disk);
        let outcomes = synthesizer.apply_fixes(&mut artifacts, &violations).unwrap();
        assert!(outcomes.iter().all(|o| o.status == FixStatus::Applied));

        // Fixed violations never reappear on re-scan.
        let rescan = AnalyzerPool::new(&registry, 1).run(&artifacts).unwrap();
        assert!(!rescan.iter().any(|v| v.rule_id == "safe-content"));
        assert!(!rescan.iter().any(|v| v.rule_id == "light-dom-marker"));

        // And the write-back landed on disk.
        let on_disk =
            std::fs::read_to_string(tmp.path().join("src/components/chip/chip.ts")).unwrap();
        assert!(on_disk.contains(".textContent ="));
        assert!(on_disk.contains("createRenderRoot"));
    }

    #[test]
    fn prune_drops_only_applied_fixes() {
        let (provider, config) = fixture();
        let registry = RuleRegistry::builtin(&config).unwrap();
        let loader = ArtifactLoader::new(&provider, &config);
        let artifacts = vec![loader.load("chip").unwrap()];
        let violations = AnalyzerPool::new(&registry, 1).run(&artifacts).unwrap();

        let fixed_id = violations
            .iter()
            .find(|v| v.rule_id == "safe-content")
            .unwrap()
            .id
            .clone();
        let outcomes = vec![
            FixOutcome {
                violation_id: fixed_id.clone(),
                rule_id: "safe-content".to_string(),
                component: "chip".to_string(),
                file: "src/components/chip/chip.ts".to_string(),
                status: FixStatus::Applied,
            },
            FixOutcome {
                violation_id: "other".to_string(),
                rule_id: "light-dom-marker".to_string(),
                component: "chip".to_string(),
                file: "src/components/chip/chip.ts".to_string(),
                status: FixStatus::FixFailed,
            },
        ];

        let before = violations.len();
        let pruned = prune_fixed(violations, &outcomes);
        assert_eq!(pruned.len(), before - 1);
        assert!(!pruned.iter().any(|v| v.id == fixed_id));
    }
}
