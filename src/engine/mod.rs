//! Analyzer pool: fan-out / fan-in rule execution.
//!
//! Every (component, applicable rule) pair is an independent unit of work
//! with no shared mutable state. Units run on a bounded rayon pool and
//! push their violations into an append-only channel sink; the merged
//! list is sorted deterministically before anything downstream sees it,
//! so two runs over identical input produce byte-identical reports
//! regardless of worker count.

use crate::loader::ComponentArtifact;
use crate::models::{sort_violations, Severity, Violation};
use crate::rules::{Rule, RuleRegistry};
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, error, info};

/// Cap on auto-detected workers.
const MAX_AUTO_WORKERS: usize = 16;

/// Rule ID of the synthetic violation emitted when a matcher panics.
pub const INTERNAL_ERROR_RULE: &str = "internal-error";

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("analysis cancelled")]
    Cancelled,
    #[error("failed to build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// Cooperative cancellation token shared between the run and whatever
/// arms it (timeout watchdog, signal handler).
#[derive(Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Runs every applicable rule against every in-scope component.
pub struct AnalyzerPool<'a> {
    registry: &'a RuleRegistry,
    workers: usize,
    cancel: CancelToken,
}

impl<'a> AnalyzerPool<'a> {
    /// # Arguments
    /// * `workers` - Worker thread count (0 = available parallelism)
    pub fn new(registry: &'a RuleRegistry, workers: usize) -> Self {
        let actual_workers = if workers == 0 {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(4)
                .min(MAX_AUTO_WORKERS)
        } else {
            workers
        };
        Self {
            registry,
            workers: actual_workers,
            cancel: CancelToken::new(),
        }
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run the analysis. On cancellation, completed unit results are
    /// discarded and `EngineError::Cancelled` is returned; no partial
    /// violation list escapes.
    pub fn run(&self, artifacts: &[ComponentArtifact]) -> Result<Vec<Violation>, EngineError> {
        let start = Instant::now();

        // Fan-out: one unit per (component, applicable rule) pair.
        let units: Vec<(&ComponentArtifact, Arc<dyn Rule>)> = artifacts
            .iter()
            .flat_map(|artifact| {
                self.registry
                    .rules_for(artifact)
                    .into_iter()
                    .map(move |rule| (artifact, rule))
            })
            .collect();

        info!(
            "Analyzing {} components ({} units) on {} workers",
            artifacts.len(),
            units.len(),
            self.workers
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()?;

        let (sink, drain) = crossbeam_channel::unbounded::<Violation>();
        let cancel = &self.cancel;

        pool.install(|| {
            units.par_iter().for_each_with(sink, |sink, (artifact, rule)| {
                if cancel.is_cancelled() {
                    return;
                }
                for violation in run_unit(artifact, rule.as_ref()) {
                    // Send only fails if the receiver is gone, which
                    // cannot happen before fan-in below.
                    let _ = sink.send(violation);
                }
            });
        });

        if self.cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }

        // Fan-in: merge and impose the deterministic display order.
        let mut violations: Vec<Violation> = drain.try_iter().collect();
        sort_violations(&mut violations);

        info!(
            "Analysis complete: {} violations in {:?}",
            violations.len(),
            start.elapsed()
        );
        Ok(violations)
    }
}

/// Run a single (component, rule) unit with panic isolation. A matcher
/// that panics becomes one minor `internal-error` violation for that pair
/// instead of failing the run.
fn run_unit(artifact: &ComponentArtifact, rule: &dyn Rule) -> Vec<Violation> {
    debug!("Running rule {} on {}", rule.id(), artifact.name);

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| rule.check(artifact)));

    match result {
        Ok(violations) => violations,
        Err(panic_info) => {
            let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic_info.downcast_ref::<String>() {
                s.clone()
            } else {
                "unknown panic".to_string()
            };
            error!(
                "Rule {} panicked on {}: {}",
                rule.id(),
                artifact.name,
                panic_msg
            );
            vec![Violation::new(
                INTERNAL_ERROR_RULE,
                &artifact.name,
                &artifact.implementation().path,
                0,
                rule.category(),
                Severity::Minor,
                format!("rule '{}' failed internally: {}", rule.id(), panic_msg),
            )]
        }
    }
}
