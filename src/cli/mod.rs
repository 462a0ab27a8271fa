//! CLI command implementations for Codetrail.

pub(crate) mod check;
pub(crate) mod list;
pub(crate) mod logging;
pub(crate) mod play;
pub(crate) mod run;

mod output;

use clap::ValueEnum;
use codetrail::{Catalog, CatalogError, RunnerConfig};
use std::error::Error;
use std::fmt;
use std::path::PathBuf;

/// Progress file used when none is given.
pub(crate) const DEFAULT_PROGRESS_FILE: &str = "codetrail-progress.json";

/// Output format for the `run` and `check` commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Options every command understands.
#[derive(Debug, Clone)]
pub(crate) struct Settings {
    /// Custom catalog file.
    pub(crate) catalog: Option<PathBuf>,
    /// Seed override.
    pub(crate) seed: Option<u64>,
    /// Fuel budget override.
    pub(crate) budget: Option<u64>,
    /// Styled output.
    pub(crate) color: bool,
}

impl Settings {
    /// Load the custom catalog, or the built-in one.
    pub(crate) fn load_catalog(&self) -> Result<Catalog, CliError> {
        let catalog = match &self.catalog {
            Some(path) => Catalog::load(path)?,
            None => Catalog::builtin()?,
        };
        Ok(catalog)
    }

    /// Defaults with the command-line overrides applied.
    pub(crate) fn runner_config(&self) -> Result<RunnerConfig, CliError> {
        let mut config = RunnerConfig::default();
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(budget) = self.budget {
            if budget == 0 {
                return Err(CliError::new("--budget must be at least 1"));
            }
            config.sandbox.step_budget = budget;
        }
        Ok(config)
    }
}

/// CLI error type.
#[derive(Debug)]
pub(crate) struct CliError {
    message: String,
}

impl CliError {
    /// Create a new CLI error.
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for CliError {}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        Self::new(e.to_string())
    }
}

impl From<CatalogError> for CliError {
    fn from(e: CatalogError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::new(format!("JSON serialization failed: {e}"))
    }
}
