//! Artifact loading and the file provider abstraction.
//!
//! Instead of each rule independently touching the filesystem, the loader
//! resolves the artifact bundle for every component up front and rules
//! receive immutable [`ComponentArtifact`]s. A [`FileProvider`] supplies
//! directory listings and file content, so tests can run entirely against
//! in-memory fixtures.

use crate::config::ProjectConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Role a file plays inside a component's artifact bundle.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactRole {
    Implementation,
    Test,
    Story,
    Readme,
    Index,
}

impl ArtifactRole {
    /// The optional roles, in the order structure violations are reported.
    pub const OPTIONAL: [ArtifactRole; 4] = [
        ArtifactRole::Test,
        ArtifactRole::Story,
        ArtifactRole::Readme,
        ArtifactRole::Index,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactRole::Implementation => "implementation",
            ArtifactRole::Test => "test",
            ArtifactRole::Story => "story",
            ArtifactRole::Readme => "readme",
            ArtifactRole::Index => "index",
        }
    }
}

/// One file of a component bundle: repo-relative path plus cached content.
#[derive(Debug, Clone)]
pub struct ArtifactFile {
    pub path: String,
    pub content: Arc<str>,
}

/// The immutable bundle of files representing one component for a run.
///
/// Created once per analysis run by the loader; owned by the analyzer
/// invocation that created it.
#[derive(Debug, Clone)]
pub struct ComponentArtifact {
    pub name: String,
    pub tier: crate::models::Tier,
    pub interactive: bool,
    files: BTreeMap<ArtifactRole, ArtifactFile>,
}

impl ComponentArtifact {
    pub fn file(&self, role: ArtifactRole) -> Option<&ArtifactFile> {
        self.files.get(&role)
    }

    pub fn has(&self, role: ArtifactRole) -> bool {
        self.files.contains_key(&role)
    }

    /// The mandatory implementation file.
    pub fn implementation(&self) -> &ArtifactFile {
        // Loader guarantees presence; a bundle without an implementation
        // is never constructed.
        self.files
            .get(&ArtifactRole::Implementation)
            .expect("artifact bundle always has an implementation file")
    }

    /// Replace one file's content, producing a patched copy. Used by the
    /// fix synthesizer to re-run a rule against an in-memory edit.
    pub fn with_content(&self, role: ArtifactRole, content: Arc<str>) -> Self {
        let mut patched = self.clone();
        if let Some(f) = patched.files.get_mut(&role) {
            f.content = content;
        }
        patched
    }
}

/// Error loading a component's artifact bundle.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("component '{0}' has no implementation file")]
    MissingImplementation(String),
}

/// Trait for providing component directories and file contents.
///
/// Implementations must be `Send + Sync` so they can be shared across
/// rayon's parallel rule execution.
pub trait FileProvider: Send + Sync {
    /// Sorted names of component directories under `components_root`.
    fn list_components(&self, components_root: &str) -> Vec<String>;

    /// Read (or return cached) content of a repo-relative path.
    fn read(&self, path: &str) -> Option<Arc<str>>;

    /// The repository root path (used for fix write-back).
    fn repo_path(&self) -> &Path;
}

/// Real implementation backed by the filesystem.
pub struct DiskFiles {
    repo_path: PathBuf,
}

impl DiskFiles {
    pub fn new(repo_path: impl Into<PathBuf>) -> Self {
        Self {
            repo_path: repo_path.into(),
        }
    }
}

impl FileProvider for DiskFiles {
    fn list_components(&self, components_root: &str) -> Vec<String> {
        let root = self.repo_path.join(components_root);
        let Ok(entries) = std::fs::read_dir(&root) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_dir())
            .filter_map(|e| e.file_name().to_str().map(String::from))
            .collect();
        names.sort();
        names
    }

    fn read(&self, path: &str) -> Option<Arc<str>> {
        std::fs::read_to_string(self.repo_path.join(path))
            .ok()
            .map(Arc::from)
    }

    fn repo_path(&self) -> &Path {
        &self.repo_path
    }
}

/// In-memory provider for tests and embedding. Paths are repo-relative.
pub struct MockFiles {
    entries: BTreeMap<String, Arc<str>>,
    repo_path: PathBuf,
}

impl MockFiles {
    /// Build a mock from `(relative_path, content)` pairs.
    pub fn new(entries: Vec<(&str, &str)>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(p, c)| (p.to_string(), Arc::from(c)))
                .collect(),
            repo_path: PathBuf::from("/mock/repo"),
        }
    }
}

impl FileProvider for MockFiles {
    fn list_components(&self, components_root: &str) -> Vec<String> {
        let prefix = format!("{}/", components_root.trim_end_matches('/'));
        let mut names: Vec<String> = self
            .entries
            .keys()
            .filter_map(|p| p.strip_prefix(&prefix))
            .filter_map(|rest| rest.split('/').next())
            .map(String::from)
            .collect();
        names.sort();
        names.dedup();
        names
    }

    fn read(&self, path: &str) -> Option<Arc<str>> {
        self.entries.get(path).cloned()
    }

    fn repo_path(&self) -> &Path {
        &self.repo_path
    }
}

/// Resolves artifact bundles and classifies components.
pub struct ArtifactLoader<'a> {
    provider: &'a dyn FileProvider,
    config: &'a ProjectConfig,
}

/// Marker in the implementation header that opts a component into the
/// experimental tier.
const EXPERIMENTAL_MARKER: &str = "@experimental";

/// Event wiring marker that classifies a component as interactive.
/// Purely declarative markup never registers listeners.
const INTERACTIVE_MARKER: &str = "addEventListener(";

impl<'a> ArtifactLoader<'a> {
    pub fn new(provider: &'a dyn FileProvider, config: &'a ProjectConfig) -> Self {
        Self { provider, config }
    }

    /// Load the full artifact bundle for one component.
    ///
    /// The implementation file is mandatory; every other role is optional
    /// and its absence is itself a condition the structure rules check.
    pub fn load(&self, name: &str) -> Result<ComponentArtifact, LoadError> {
        let dir = format!(
            "{}/{}",
            self.config.components_root.trim_end_matches('/'),
            name
        );

        let mut files = BTreeMap::new();

        let implementation = self
            .first_existing(&dir, &[&format!("{name}.ts"), &format!("{name}.js")])
            .ok_or_else(|| LoadError::MissingImplementation(name.to_string()))?;

        let tier = self.tier_for(name, &implementation.content);
        let interactive = implementation.content.contains(INTERACTIVE_MARKER);
        files.insert(ArtifactRole::Implementation, implementation);

        let optional: [(ArtifactRole, Vec<String>); 4] = [
            (
                ArtifactRole::Test,
                vec![format!("{name}.test.ts"), format!("{name}.test.js")],
            ),
            (
                ArtifactRole::Story,
                vec![format!("{name}.stories.ts"), format!("{name}.stories.js")],
            ),
            (ArtifactRole::Readme, vec!["README.md".to_string()]),
            (
                ArtifactRole::Index,
                vec!["index.ts".to_string(), "index.js".to_string()],
            ),
        ];

        for (role, candidates) in optional {
            let candidate_refs: Vec<&str> = candidates.iter().map(String::as_str).collect();
            if let Some(file) = self.first_existing(&dir, &candidate_refs) {
                files.insert(role, file);
            }
        }

        Ok(ComponentArtifact {
            name: name.to_string(),
            tier,
            interactive,
            files,
        })
    }

    fn first_existing(&self, dir: &str, candidates: &[&str]) -> Option<ArtifactFile> {
        for candidate in candidates {
            let path = format!("{dir}/{candidate}");
            if let Some(content) = self.provider.read(&path) {
                return Some(ArtifactFile { path, content });
            }
        }
        None
    }

    /// Tier resolution: explicit critical allow-list, explicit experimental
    /// marker in the implementation header, else standard.
    fn tier_for(&self, name: &str, implementation: &str) -> crate::models::Tier {
        if self.config.tiers.critical.iter().any(|c| c == name) {
            return crate::models::Tier::Critical;
        }
        let header: String = implementation.lines().take(10).collect::<Vec<_>>().join("\n");
        if header.contains(EXPERIMENTAL_MARKER) {
            return crate::models::Tier::Experimental;
        }
        crate::models::Tier::Standard
    }
}
