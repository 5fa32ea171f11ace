//! Git diff provider for diff-scoped runs.
//!
//! The engine never shells out or walks history itself; it only asks
//! "which paths changed since ref X". A failing diff is fatal to the run:
//! silently widening scope to a full scan would hide the caller's intent.

use git2::{Repository, StatusOptions};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Mutex;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum DiffError {
    #[error("failed to open git repository: {0}")]
    Open(#[source] git2::Error),
    #[error("unknown base revision '{0}': {1}")]
    BadRevision(String, #[source] git2::Error),
    #[error("failed to diff against '{0}': {1}")]
    Diff(String, #[source] git2::Error),
}

/// Abstracts "changed paths since a ref" so tests can inject fixtures.
pub trait DiffProvider: Send + Sync {
    /// Repo-relative paths changed between `base_ref` and the working
    /// tree (committed, staged, and unstaged changes included).
    fn changed_paths(&self, base_ref: &str) -> Result<Vec<String>, DiffError>;
}

/// git2-backed implementation.
pub struct GitDiff {
    repo: Mutex<Repository>,
}

impl GitDiff {
    pub fn open(path: &Path) -> Result<Self, DiffError> {
        let repo = Repository::discover(path).map_err(DiffError::Open)?;
        debug!("Opened git repository at {:?}", repo.path());
        Ok(Self { repo: Mutex::new(repo) })
    }
}

impl DiffProvider for GitDiff {
    fn changed_paths(&self, base_ref: &str) -> Result<Vec<String>, DiffError> {
        let repo = self.repo.lock().expect("git repository mutex poisoned");
        let object = repo
            .revparse_single(base_ref)
            .map_err(|e| DiffError::BadRevision(base_ref.to_string(), e))?;
        let tree = object
            .peel_to_tree()
            .map_err(|e| DiffError::BadRevision(base_ref.to_string(), e))?;

        let diff = repo
            .diff_tree_to_workdir_with_index(Some(&tree), None)
            .map_err(|e| DiffError::Diff(base_ref.to_string(), e))?;

        let mut paths = BTreeSet::new();
        for delta in diff.deltas() {
            for file in [delta.old_file(), delta.new_file()] {
                if let Some(p) = file.path().and_then(|p| p.to_str()) {
                    paths.insert(p.to_string());
                }
            }
        }

        // Untracked files are changes too; a brand new component must
        // land in scope.
        let mut status_opts = StatusOptions::new();
        status_opts.include_untracked(true).recurse_untracked_dirs(true);
        if let Ok(statuses) = repo.statuses(Some(&mut status_opts)) {
            for entry in statuses.iter() {
                if let Some(p) = entry.path() {
                    paths.insert(p.to_string());
                }
            }
        }

        debug!("{} paths changed since {}", paths.len(), base_ref);
        Ok(paths.into_iter().collect())
    }
}

/// Fixture provider for tests: a fixed changed-path list, or a forced
/// failure.
pub struct StaticDiff {
    pub paths: Vec<String>,
}

impl DiffProvider for StaticDiff {
    fn changed_paths(&self, _base_ref: &str) -> Result<Vec<String>, DiffError> {
        Ok(self.paths.clone())
    }
}
