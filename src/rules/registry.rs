//! Rule registry: the explicitly constructed, immutable set of rules for
//! a run. No module-level singleton; the registry is passed by reference
//! into every analysis call.

use super::Rule;
use crate::config::ProjectConfig;
use crate::loader::ComponentArtifact;
use crate::models::Category;
use std::collections::BTreeSet;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
#[error("duplicate rule id '{0}'")]
pub struct DuplicateRuleId(pub String);

/// Holds versioned rule definitions, keyed by ID. Insertion order is
/// preserved for applicability filtering; it carries no semantic meaning.
#[derive(Default)]
pub struct RuleRegistry {
    rules: Vec<Arc<dyn Rule>>,
    ids: HashSet<&'static str>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rule. Fails if a rule with the same ID is already
    /// present.
    pub fn register(&mut self, rule: Arc<dyn Rule>) -> Result<(), DuplicateRuleId> {
        let id = rule.id();
        if !self.ids.insert(id) {
            return Err(DuplicateRuleId(id.to_string()));
        }
        debug!("Registered rule: {}", id);
        self.rules.push(rule);
        Ok(())
    }

    /// All registered rules in registration order.
    pub fn rules(&self) -> &[Arc<dyn Rule>] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Look up a rule by ID (used by the fix synthesizer to re-run a
    /// single rule).
    pub fn get(&self, id: &str) -> Option<&Arc<dyn Rule>> {
        self.rules.iter().find(|r| r.id() == id)
    }

    /// The ordered subset of rules whose applicability predicate accepts
    /// this component.
    pub fn rules_for(&self, artifact: &ComponentArtifact) -> Vec<Arc<dyn Rule>> {
        self.rules
            .iter()
            .filter(|r| r.applies_to(artifact))
            .cloned()
            .collect()
    }

    /// Drop every rule outside the given categories (CLI `--category`).
    pub fn retain_categories(&mut self, categories: &BTreeSet<Category>) {
        self.rules.retain(|r| categories.contains(&r.category()));
        self.ids = self.rules.iter().map(|r| r.id()).collect();
    }

    /// Construct the full built-in registry from project config.
    pub fn builtin(config: &ProjectConfig) -> Result<Self, DuplicateRuleId> {
        let mut registry = Self::new();
        registry.register(Arc::new(super::MissingArtifactRule))?;
        registry.register(Arc::new(super::SingleStyleImportRule))?;
        registry.register(Arc::new(super::HostStyleAllowlistRule::new(
            config.styling.allowed_host_properties.clone(),
        )))?;
        registry.register(Arc::new(super::ClassVocabularyRule::new(
            config.styling.class_vocabulary.clone(),
        )))?;
        registry.register(Arc::new(super::InitCleanupPairRule))?;
        registry.register(Arc::new(super::DuplicateInitializationRule))?;
        registry.register(Arc::new(super::AriaStateRule))?;
        registry.register(Arc::new(super::KeyboardBranchRule))?;
        registry.register(Arc::new(super::LightDomMarkerRule))?;
        registry.register(Arc::new(super::BaseClassAllowlistRule::new(
            config.architecture.allowed_base_classes.clone(),
        )))?;
        registry.register(Arc::new(super::SafeContentRule))?;
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Severity, Violation};

    struct StubRule(&'static str);

    impl Rule for StubRule {
        fn id(&self) -> &'static str {
            self.0
        }
        fn category(&self) -> Category {
            Category::Structure
        }
        fn severity(&self) -> Severity {
            Severity::Minor
        }
        fn check(&self, _artifact: &ComponentArtifact) -> Vec<Violation> {
            Vec::new()
        }
    }

    #[test]
    fn rejects_duplicate_ids() {
        let mut registry = RuleRegistry::new();
        registry.register(Arc::new(StubRule("a"))).unwrap();
        let err = registry.register(Arc::new(StubRule("a"))).unwrap_err();
        assert_eq!(err.to_string(), "duplicate rule id 'a'");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn builtin_registry_loads() {
        let registry = RuleRegistry::builtin(&ProjectConfig::default()).unwrap();
        assert_eq!(registry.len(), 11);
        assert!(registry.get("missing-artifact").is_some());
        assert!(registry.get("base-class-allowlist").is_some());
    }

    #[test]
    fn retain_categories_filters() {
        let mut registry = RuleRegistry::builtin(&ProjectConfig::default()).unwrap();
        let only: BTreeSet<Category> = [Category::Structure].into_iter().collect();
        registry.retain_categories(&only);
        assert_eq!(registry.len(), 1);
        assert!(registry.get("missing-artifact").is_some());
        assert!(registry.get("aria-state").is_none());
    }
}
