//! Project-level configuration support
//!
//! Loads per-project configuration from a `comphealth.toml` file in the
//! repository root. The config carries the data rules must not invent
//! locally: the critical-component allow-list, the class vocabulary, the
//! allowed host style properties, and the allowed base classes.
//!
//! # Configuration Format
//!
//! ```toml
//! # comphealth.toml
//!
//! components_root = "src/components"
//!
//! [tiers]
//! critical = ["button", "input", "dialog"]
//!
//! [styling]
//! class_vocabulary = ["btn", "btn-primary", "field"]
//! allowed_host_properties = ["display", "contain", "content-visibility"]
//!
//! [architecture]
//! allowed_base_classes = ["BaseElement", "LitElement", "HTMLElement"]
//!
//! [scoring]
//! minor_penalty = 5
//!
//! [defaults]
//! workers = 8
//!
//! [history]
//! enabled = true
//! ```

use serde::Deserialize;
use std::path::Path;
use tracing::{debug, warn};

/// Root configuration for a comphealth run.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectConfig {
    /// Directory containing one subdirectory per component.
    #[serde(default = "default_components_root")]
    pub components_root: String,

    #[serde(default)]
    pub tiers: TierConfig,

    #[serde(default)]
    pub styling: StylingConfig,

    #[serde(default)]
    pub architecture: ArchitectureConfig,

    #[serde(default)]
    pub scoring: ScoringConfig,

    #[serde(default)]
    pub defaults: CliDefaults,

    #[serde(default)]
    pub history: HistoryConfig,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            components_root: default_components_root(),
            tiers: TierConfig::default(),
            styling: StylingConfig::default(),
            architecture: ArchitectureConfig::default(),
            scoring: ScoringConfig::default(),
            defaults: CliDefaults::default(),
            history: HistoryConfig::default(),
        }
    }
}

fn default_components_root() -> String {
    "src/components".to_string()
}

/// Tier assignment: explicit allow-list of critical component names.
/// Experimental tier is opted into per component via the `@experimental`
/// marker in the implementation header, not via config.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TierConfig {
    #[serde(default)]
    pub critical: Vec<String>,
}

/// Styling rule inputs.
#[derive(Debug, Clone, Deserialize)]
pub struct StylingConfig {
    /// Known-valid class names. When empty, the class-vocabulary rule is
    /// inert (the vocabulary is maintained by the design system, never
    /// invented here).
    #[serde(default)]
    pub class_vocabulary: Vec<String>,

    /// Properties a component stylesheet may declare on its host.
    #[serde(default = "default_allowed_host_properties")]
    pub allowed_host_properties: Vec<String>,
}

impl Default for StylingConfig {
    fn default() -> Self {
        Self {
            class_vocabulary: Vec::new(),
            allowed_host_properties: default_allowed_host_properties(),
        }
    }
}

fn default_allowed_host_properties() -> Vec<String> {
    ["display", "contain", "content-visibility"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Architecture rule inputs.
#[derive(Debug, Clone, Deserialize)]
pub struct ArchitectureConfig {
    #[serde(default = "default_allowed_base_classes")]
    pub allowed_base_classes: Vec<String>,
}

impl Default for ArchitectureConfig {
    fn default() -> Self {
        Self {
            allowed_base_classes: default_allowed_base_classes(),
        }
    }
}

fn default_allowed_base_classes() -> Vec<String> {
    ["BaseElement", "LitElement", "HTMLElement"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Scoring knobs. Critical and major penalties are fixed by the scoring
/// contract (full weight / half weight); only the minor penalty is tunable.
#[derive(Debug, Clone, Deserialize)]
pub struct ScoringConfig {
    #[serde(default = "default_minor_penalty")]
    pub minor_penalty: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            minor_penalty: default_minor_penalty(),
        }
    }
}

fn default_minor_penalty() -> u32 {
    5
}

/// Default CLI flags that can be set in project config.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct CliDefaults {
    #[serde(default)]
    pub workers: Option<usize>,

    #[serde(default)]
    pub format: Option<String>,
}

/// Append-only score history settings.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Path of the JSONL file, relative to the repo root.
    #[serde(default = "default_history_path")]
    pub path: String,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: default_history_path(),
        }
    }
}

fn default_history_path() -> String {
    ".comphealth/history.jsonl".to_string()
}

/// Load project configuration from the repository root.
///
/// Returns default configuration if no `comphealth.toml` is found or the
/// file fails to parse (with a warning).
pub fn load_project_config(repo_path: &Path) -> ProjectConfig {
    let toml_path = repo_path.join("comphealth.toml");
    if toml_path.exists() {
        match load_toml_config(&toml_path) {
            Ok(config) => {
                debug!("Loaded project config from {}", toml_path.display());
                return config;
            }
            Err(e) => {
                warn!("Failed to load {}: {}", toml_path.display(), e);
            }
        }
    }

    debug!("No project config found, using defaults");
    ProjectConfig::default()
}

fn load_toml_config(path: &Path) -> anyhow::Result<ProjectConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: ProjectConfig = toml::from_str(&content)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = ProjectConfig::default();
        assert_eq!(config.components_root, "src/components");
        assert!(config.tiers.critical.is_empty());
        assert!(config.styling.class_vocabulary.is_empty());
        assert!(config
            .styling
            .allowed_host_properties
            .contains(&"display".to_string()));
        assert_eq!(config.scoring.minor_penalty, 5);
        assert!(!config.history.enabled);
    }

    #[test]
    fn parses_partial_toml() {
        let config: ProjectConfig = toml::from_str(
            r#"
            components_root = "lib/ui"

            [tiers]
            critical = ["button"]

            [scoring]
            minor_penalty = 2
            "#,
        )
        .unwrap();

        assert_eq!(config.components_root, "lib/ui");
        assert_eq!(config.tiers.critical, vec!["button"]);
        assert_eq!(config.scoring.minor_penalty, 2);
        // Unspecified sections keep their defaults
        assert_eq!(
            config.architecture.allowed_base_classes,
            vec!["BaseElement", "LitElement", "HTMLElement"]
        );
    }
}
