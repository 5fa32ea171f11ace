//! Scope resolution: which components does this run analyze?
//!
//! Full mode enumerates every known component directory; diff mode maps
//! the VCS changed-path list to owning components. An empty diff scope is
//! a successful empty run, never an error.

use crate::config::ProjectConfig;
use crate::git::{DiffError, DiffProvider};
use crate::loader::FileProvider;
use crate::models::Scope;
use std::collections::BTreeSet;
use tracing::{debug, info};

pub struct ScopeResolver<'a> {
    provider: &'a dyn FileProvider,
    config: &'a ProjectConfig,
}

impl<'a> ScopeResolver<'a> {
    pub fn new(provider: &'a dyn FileProvider, config: &'a ProjectConfig) -> Self {
        Self { provider, config }
    }

    /// Resolve the ordered set of component names for this run.
    ///
    /// Diff mode needs a `DiffProvider`; its failure propagates rather
    /// than falling back to a full scan.
    pub fn resolve(
        &self,
        scope: &Scope,
        diff: Option<&dyn DiffProvider>,
    ) -> Result<Vec<String>, DiffError> {
        match scope {
            Scope::Component(name) => Ok(vec![name.clone()]),
            Scope::Full => {
                let components = self.provider.list_components(&self.config.components_root);
                info!("Full scope: {} components", components.len());
                Ok(components)
            }
            Scope::Diff(base_ref) => {
                let diff = diff.expect("diff scope requires a DiffProvider");
                let changed = diff.changed_paths(base_ref)?;
                let components = self.components_owning(&changed);
                info!(
                    "Diff scope vs {}: {} changed paths map to {} components",
                    base_ref,
                    changed.len(),
                    components.len()
                );
                Ok(components)
            }
        }
    }

    /// Map changed paths to their owning component directories,
    /// deduplicated and sorted. Paths outside `components_root` are
    /// ignored; so are components whose directory no longer exists
    /// (deleted components cannot be loaded).
    fn components_owning(&self, changed: &[String]) -> Vec<String> {
        let known: BTreeSet<String> = self
            .provider
            .list_components(&self.config.components_root)
            .into_iter()
            .collect();
        let prefix = format!("{}/", self.config.components_root.trim_end_matches('/'));

        let mut owners = BTreeSet::new();
        for path in changed {
            let Some(rest) = path.strip_prefix(&prefix) else {
                continue;
            };
            let Some(name) = rest.split('/').next() else {
                continue;
            };
            if known.contains(name) {
                owners.insert(name.to_string());
            } else {
                debug!("Changed path {} has no live component directory", path);
            }
        }
        owners.into_iter().collect()
    }
}
