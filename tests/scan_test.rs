//! End-to-end scan tests against the library API
//!
//! Each test builds a real component tree in a temp directory and drives
//! loader -> engine -> scoring -> gate the same way the CLI does.

use comphealth::config::{load_project_config, ProjectConfig};
use comphealth::engine::AnalyzerPool;
use comphealth::gate;
use comphealth::loader::{ArtifactLoader, DiskFiles, FileProvider};
use comphealth::models::{Category, Severity, Tier};
use comphealth::rules::RuleRegistry;
use comphealth::scoring;
use std::collections::BTreeSet;
use std::path::Path;
use tempfile::TempDir;

/// An interactive component with the full artifact bundle whose only
/// defect is the missing keyboard branch.
const ALPHA_IMPL: &str = r#"import styles from './alpha.css';

class Alpha extends BaseElement {
  connectedCallback() {
    this.setAttribute('role', 'button');
    this.setAttribute('aria-pressed', 'false');
    this.addEventListener('click', this.onClick);
  }

  disconnectedCallback() {
    this.removeEventListener('click', this.onClick);
  }

  createRenderRoot() {
    return this;
  }
}
"#;

fn write_component(root: &Path, name: &str, implementation: &str, complete: bool) {
    let dir = root.join("src/components").join(name);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(format!("{name}.ts")), implementation).unwrap();
    if complete {
        std::fs::write(dir.join(format!("{name}.test.ts")), "it('renders');\n").unwrap();
        std::fs::write(dir.join(format!("{name}.stories.ts")), "export default {};\n").unwrap();
        std::fs::write(dir.join("README.md"), format!("# {name}\n")).unwrap();
        std::fs::write(dir.join("index.ts"), format!("export * from './{name}';\n")).unwrap();
    }
}

fn alpha_workspace() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("comphealth.toml"),
        "[tiers]\ncritical = [\"alpha\"]\n",
    )
    .unwrap();
    write_component(dir.path(), "alpha", ALPHA_IMPL, true);
    dir
}

fn scan(root: &Path, config: &ProjectConfig, registry: &RuleRegistry) -> Vec<comphealth::models::Violation> {
    let provider = DiskFiles::new(root);
    let loader = ArtifactLoader::new(&provider, config);
    let names = provider.list_components(&config.components_root);
    let artifacts: Vec<_> = names.iter().map(|n| loader.load(n).unwrap()).collect();
    AnalyzerPool::new(registry, 2).run(&artifacts).unwrap()
}

#[test]
fn alpha_scores_ninety_and_passes_its_critical_gate() {
    let dir = alpha_workspace();
    let config = load_project_config(dir.path());
    let registry = RuleRegistry::builtin(&config).unwrap();

    let provider = DiskFiles::new(dir.path());
    let loader = ArtifactLoader::new(&provider, &config);
    let alpha = loader.load("alpha").unwrap();
    assert_eq!(alpha.tier, Tier::Critical);
    assert!(alpha.interactive);

    let artifacts = vec![alpha];
    let violations = AnalyzerPool::new(&registry, 2).run(&artifacts).unwrap();
    assert_eq!(violations.len(), 1, "unexpected: {violations:#?}");
    assert_eq!(violations[0].rule_id, "keyboard-branch");
    assert_eq!(violations[0].severity, Severity::Major);
    assert_eq!(violations[0].category, Category::Accessibility);

    let scores = scoring::score_all(&artifacts, &violations, config.scoring.minor_penalty);
    assert_eq!(scores[0].total, 90);
    assert_eq!(scores[0].category_scores[&Category::Accessibility], 10);
    assert_eq!(scores[0].category_scores[&Category::Structure], 30);

    let verdicts = gate::evaluate_all(&scores, &violations, false);
    assert!(verdicts[0].passed);
    assert_eq!(gate::exit_code(&verdicts), 0);
}

#[test]
fn impl_only_component_yields_exactly_four_structure_violations() {
    let dir = tempfile::tempdir().unwrap();
    write_component(dir.path(), "bare", "class Bare extends BaseElement {}\n", false);

    let config = ProjectConfig::default();
    let mut registry = RuleRegistry::builtin(&config).unwrap();
    let only: BTreeSet<Category> = [Category::Structure].into_iter().collect();
    registry.retain_categories(&only);

    let violations = scan(dir.path(), &config, &registry);
    assert_eq!(violations.len(), 4);
    assert!(violations.iter().all(|v| v.rule_id == "missing-artifact"));
    assert!(violations.iter().all(|v| v.category == Category::Structure));
}

#[test]
fn scores_stay_in_bounds_for_a_maximally_broken_component() {
    let dir = tempfile::tempdir().unwrap();
    // No style import, rogue base class, innerHTML, no light-DOM marker,
    // interactive without aria/keyboard/cleanup, duplicated init calls.
    write_component(
        dir.path(),
        "wreck",
        "class Wreck extends RogueWidget {\n\
         \x20 constructor() {\n\
         \x20   super();\n\
         \x20   this.init();\n\
         \x20 }\n\
         \x20 connectedCallback() {\n\
         \x20   this.init();\n\
         \x20   this.addEventListener('click', f);\n\
         \x20   this.el.innerHTML = raw;\n\
         \x20 }\n\
         }\n",
        false,
    );

    let config = ProjectConfig::default();
    let registry = RuleRegistry::builtin(&config).unwrap();
    let violations = scan(dir.path(), &config, &registry);
    assert!(violations.len() >= 8, "got: {violations:#?}");

    let provider = DiskFiles::new(dir.path());
    let loader = ArtifactLoader::new(&provider, &config);
    let artifacts = vec![loader.load("wreck").unwrap()];
    let scores = scoring::score_all(&artifacts, &violations, config.scoring.minor_penalty);
    assert!(scores[0].total <= 100);
    for (_, score) in &scores[0].category_scores {
        assert!(*score <= 30);
    }

    let verdicts = gate::evaluate_all(&scores, &violations, false);
    assert!(!verdicts[0].passed);
}

#[test]
fn runs_are_deterministic_across_worker_counts() {
    let dir = alpha_workspace();
    write_component(dir.path(), "bare", "class Bare extends BaseElement {}\n", false);
    write_component(
        dir.path(),
        "busted",
        "class Busted extends RogueWidget {\n  go() {\n    this.el.innerHTML = x;\n  }\n}\n",
        false,
    );

    let config = load_project_config(dir.path());
    let registry = RuleRegistry::builtin(&config).unwrap();

    let serial = scan(dir.path(), &config, &registry);
    let parallel = scan(dir.path(), &config, &registry);
    let wide = {
        let provider = DiskFiles::new(dir.path());
        let loader = ArtifactLoader::new(&provider, &config);
        let names = provider.list_components(&config.components_root);
        let artifacts: Vec<_> = names.iter().map(|n| loader.load(n).unwrap()).collect();
        AnalyzerPool::new(&registry, 8).run(&artifacts).unwrap()
    };

    let ids = |vs: &[comphealth::models::Violation]| -> Vec<String> {
        vs.iter().map(|v| v.id.clone()).collect()
    };
    assert_eq!(ids(&serial), ids(&parallel));
    assert_eq!(ids(&serial), ids(&wide));
}
