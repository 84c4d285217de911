//! CLI command implementations for Crownfall.

pub(crate) mod replay;
pub(crate) mod run;
pub(crate) mod tournament;
pub(crate) mod validate;
pub(crate) mod watch;

mod output;

use clap::ValueEnum;
use crownfall::config::{BattleConfig, BattleSetup};
use std::error::Error;
use std::fmt;
use std::path::Path;

/// Output format for the `run` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON output.
    Json,
    /// Structured text for LLM consumption.
    Llm,
}

/// Output format for the `replay` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum ReplayFormat {
    /// Interactive TUI.
    Tui,
    /// Plain text output.
    Text,
    /// Structured text for LLM consumption.
    Llm,
}

/// Output format for the `tournament` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum TournamentFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON output.
    Json,
    /// CSV format.
    Csv,
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

impl From<crownfall::ConfigError> for CliError {
    fn from(e: crownfall::ConfigError) -> Self {
        Self::new(format!("Invalid config: {e}"))
    }
}

impl From<crownfall::tournament::TournamentError> for CliError {
    fn from(e: crownfall::tournament::TournamentError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<crownfall::replay::ReplayError> for CliError {
    fn from(e: crownfall::replay::ReplayError) -> Self {
        Self::new(e.to_string())
    }
}

/// Load and validate the battle config, or use the stock one.
pub(crate) fn load_setup(path: Option<&Path>) -> Result<BattleSetup, CliError> {
    let config = match path {
        Some(p) => BattleConfig::load(p)
            .map_err(|e| CliError::new(format!("Failed to load {}: {e}", p.display())))?,
        None => BattleConfig::default(),
    };
    Ok(BattleSetup::from_config(config)?)
}

/// The given seed, or one derived from the wall clock.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn seed_or_now(seed: Option<u64>) -> u64 {
    seed.unwrap_or_else(|| {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(42)
    })
}
