//! CLI definition and run orchestration

use crate::config::{load_project_config, ProjectConfig};
use crate::engine::{AnalyzerPool, CancelToken, EngineError};
use crate::fixes::{prune_fixed, FixStatus, FixSynthesizer};
use crate::gate;
use crate::git::GitDiff;
use crate::history::{self, HistoryEntry};
use crate::loader::{ArtifactLoader, ComponentArtifact, DiskFiles, FileProvider};
use crate::models::{
    Category, ComplianceReport, Scope, ViolationsSummary, EXIT_CANCELLED, EXIT_FATAL,
    EXIT_GATE_FAILED,
};
use crate::reporters::{self, OutputFormat};
use crate::rules::RuleRegistry;
use crate::scoring;
use anyhow::{Context, Result};
use clap::Parser;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

/// Parse and validate workers count (0 = auto, up to 64)
fn parse_workers(s: &str) -> Result<usize, String> {
    let n: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if n > 64 {
        Err("workers cannot exceed 64".to_string())
    } else {
        Ok(n)
    }
}

/// Comphealth - compliance scanner for UI component libraries
#[derive(Parser, Debug)]
#[command(name = "comphealth")]
#[command(
    version,
    about = "Score UI component source artifacts against structure, styling, \
script, accessibility, and architecture rules",
    after_help = "\
Examples:
  comphealth .                         Scan every component
  comphealth . --diff                  Scan components changed since HEAD
  comphealth . --diff=origin/main      Scan components changed since a ref
  comphealth . --component button      Scan one component
  comphealth . --category accessibility --category styling
  comphealth . --fix                   Apply verified auto-fixes
  comphealth . --format json -o report.json

Exit codes: 0 pass, 1 gate failure, 2 cancelled, 3 fatal error"
)]
pub struct Cli {
    /// Path to repository (default: current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Scan a single component by name
    #[arg(long)]
    pub component: Option<String>,

    /// Restrict to one or more rule categories (repeatable)
    #[arg(long, value_parser = ["structure", "styling", "script-integration", "accessibility", "architecture"])]
    pub category: Vec<String>,

    /// Scan only components changed since a git ref (default ref: HEAD)
    #[arg(long, num_args = 0..=1, default_missing_value = "HEAD")]
    pub diff: Option<String>,

    /// Apply verified auto-fixes before scoring
    #[arg(long)]
    pub fix: bool,

    /// Any minor violation fails the gate; fix failures fail the run
    #[arg(long)]
    pub strict: bool,

    /// Show internal-error violations and per-fix detail
    #[arg(long, short = 'v')]
    pub verbose: bool,

    /// Number of parallel workers (0 = auto, up to 64)
    #[arg(long, value_parser = parse_workers)]
    pub workers: Option<usize>,

    /// Cancel the run after this many seconds (0 = no timeout)
    #[arg(long, default_value = "0")]
    pub timeout_secs: u64,

    /// Output format: text, json
    #[arg(long, short = 'f')]
    pub format: Option<String>,

    /// Output file path (default: stdout)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

/// Run the CLI to completion and return the process exit code.
pub fn run(cli: Cli) -> i32 {
    match execute(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            EXIT_FATAL
        }
    }
}

fn execute(cli: Cli) -> Result<i32> {
    let provider = DiskFiles::new(cli.path.clone());
    let config = load_project_config(cli.path.as_path());

    let mut registry = RuleRegistry::builtin(&config)?;
    if !cli.category.is_empty() {
        let categories: BTreeSet<Category> = cli
            .category
            .iter()
            .map(|s| Category::from_str(s))
            .collect::<Result<_>>()?;
        registry.retain_categories(&categories);
        info!("Restricted to {} rules via --category", registry.len());
    }

    let scope = match (&cli.component, &cli.diff) {
        (Some(name), _) => Scope::Component(name.clone()),
        (None, Some(base_ref)) => Scope::Diff(base_ref.clone()),
        (None, None) => Scope::Full,
    };

    let git_diff;
    let diff_provider = match &scope {
        Scope::Diff(_) => {
            git_diff = GitDiff::open(cli.path.as_path())?;
            Some(&git_diff as &dyn crate::git::DiffProvider)
        }
        _ => None,
    };

    let resolver = crate::scope::ScopeResolver::new(&provider, &config);
    let names = resolver.resolve(&scope, diff_provider)?;
    let mut artifacts = load_artifacts(&provider, &config, &scope, &names)?;

    let workers = cli.workers.or(config.defaults.workers).unwrap_or(0);
    let cancel = CancelToken::new();
    if cli.timeout_secs > 0 {
        spawn_watchdog(cancel.clone(), Duration::from_secs(cli.timeout_secs));
    }

    let pool = AnalyzerPool::new(&registry, workers).with_cancel_token(cancel);
    let mut violations = match pool.run(&artifacts) {
        Ok(v) => v,
        Err(EngineError::Cancelled) => {
            eprintln!("analysis cancelled");
            return Ok(EXIT_CANCELLED);
        }
        Err(e) => return Err(e.into()),
    };

    let fixes = if cli.fix {
        let synthesizer = FixSynthesizer::new(&registry, &provider);
        let outcomes = synthesizer.apply_fixes(&mut artifacts, &violations)?;
        violations = prune_fixed(violations, &outcomes);
        outcomes
    } else {
        Vec::new()
    };

    let mut scores = scoring::score_all(&artifacts, &violations, config.scoring.minor_penalty);
    scoring::sort_scores(&mut scores);

    let verdicts = gate::evaluate_all(&scores, &violations, cli.strict);
    let mut exit_code = gate::exit_code(&verdicts);
    if cli.strict && fixes.iter().any(|f| f.status == FixStatus::FixFailed) {
        exit_code = EXIT_GATE_FAILED;
    }

    let report = ComplianceReport {
        timestamp: chrono::Utc::now(),
        scope: scope.to_string(),
        summary: ViolationsSummary::from_violations(&violations),
        aggregate: gate::aggregate(&scores, &verdicts),
        components: scores,
        violations,
        gates: verdicts,
        fixes,
        exit_code,
    };

    emit(&cli, &config, &report)?;

    if config.history.enabled {
        let entry = HistoryEntry::from_report(&report);
        if let Err(e) = history::append(provider.repo_path(), &config.history.path, &entry) {
            warn!("Failed to append history: {e:#}");
        }
    }

    Ok(exit_code)
}

/// Load artifacts for every resolved name. A missing implementation is
/// fatal only when the component was named explicitly; in scan scopes it
/// is skipped with a warning.
fn load_artifacts(
    provider: &dyn FileProvider,
    config: &ProjectConfig,
    scope: &Scope,
    names: &[String],
) -> Result<Vec<ComponentArtifact>> {
    let loader = ArtifactLoader::new(provider, config);
    let mut artifacts = Vec::with_capacity(names.len());
    for name in names {
        match loader.load(name) {
            Ok(artifact) => artifacts.push(artifact),
            Err(e) if matches!(scope, Scope::Component(_)) => {
                return Err(e).with_context(|| format!("cannot load component '{name}'"));
            }
            Err(e) => warn!("Skipping component '{}': {}", name, e),
        }
    }
    Ok(artifacts)
}

fn spawn_watchdog(cancel: CancelToken, after: Duration) {
    std::thread::spawn(move || {
        std::thread::sleep(after);
        warn!("Timeout reached, cancelling analysis");
        cancel.cancel();
    });
}

fn emit(cli: &Cli, config: &ProjectConfig, report: &ComplianceReport) -> Result<()> {
    let format_name = cli
        .format
        .as_deref()
        .or(config.defaults.format.as_deref())
        .unwrap_or("text");
    let format = OutputFormat::from_str(format_name)?;
    let rendered = reporters::render(report, format, cli.verbose)?;

    match &cli.output {
        Some(path) => {
            std::fs::write(path, &rendered)
                .with_context(|| format!("cannot write report to {}", path.display()))?;
            info!("Report written to {}", path.display());
        }
        None => print!("{rendered}"),
    }
    Ok(())
}
