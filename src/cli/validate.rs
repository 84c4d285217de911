//! Config validation command implementation.

use super::CliError;
use crownfall::config::{BattleConfig, BattleSetup};
use crownfall::ConfigError;
use std::fs;
use std::path::PathBuf;

/// Execute the validate command.
///
/// With `print_default`, prints the stock config as TOML instead.
///
/// # Errors
///
/// Returns an error if the file cannot be read, parsed or validated.
pub(crate) fn execute(config: Option<PathBuf>, print_default: bool) -> Result<(), CliError> {
    if print_default {
        print!("{}", BattleConfig::default().to_toml_string()?);
        return Ok(());
    }

    let Some(path) = config else {
        return Err(CliError::new("Nothing to validate: pass a config file or --print-default"));
    };

    println!("Validating: {}", path.display());
    println!();

    let text = fs::read_to_string(&path)
        .map_err(|e| CliError::new(format!("Failed to read {}: {e}", path.display())))?;

    let parsed = BattleConfig::from_toml_str(&text);
    print_check("TOML syntax", parsed.is_ok());
    let config = parsed?;

    let errors = match config.validate() {
        Ok(()) => Vec::new(),
        Err(ConfigError::Multiple(errors)) => errors,
        Err(e) => vec![e],
    };
    print_check("Field values", errors.is_empty());
    for e in &errors {
        println!("      - {e}");
    }
    if !errors.is_empty() {
        return Err(CliError::new(format!("{} problem(s) found", errors.len())));
    }

    let setup = BattleSetup::from_config(config)?;
    println!();
    println!("Summary:");
    println!("  Duration:   {}s", setup.config.battle.duration_ms / 1000);
    println!("  Tick:       {}ms", setup.config.battle.tick_ms);
    println!("  Troops:     {}", setup.catalog.len());
    println!(
        "  Abilities:  {}",
        setup.catalog.iter().filter(|a| a.ability.is_some()).count()
    );
    println!("  Deck:       {}", setup.config.deck.join(", "));
    println!("  Enemy AI:   {}", if setup.config.enemy_ai.enabled { "on" } else { "off" });

    println!();
    println!("Validation successful!");

    Ok(())
}

fn print_check(name: &str, ok: bool) {
    let status = if ok { "OK" } else { "FAILED" };
    let symbol = if ok { "✓" } else { "✗" };
    println!("  {symbol} {name}: {status}");
}
