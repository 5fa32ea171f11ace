//! Comphealth - compliance scanner for UI component libraries
//!
//! Loads the artifact bundle of every component (implementation, test,
//! story, readme, index), runs a registry of categorized rules over them
//! in parallel, derives weighted per-component scores, and gates the run
//! by component tier. Verified auto-fixes and JSON/text reports round out
//! the CI surface.

pub mod cli;
pub mod config;
pub mod engine;
pub mod fixes;
pub mod gate;
pub mod git;
pub mod history;
pub mod loader;
pub mod models;
pub mod reporters;
pub mod rules;
pub mod scope;
pub mod scoring;
