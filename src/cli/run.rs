//! Run command implementation.

use super::output::format_text;
use super::{load_setup, seed_or_now, CliError, OutputFormat};
use crownfall::replay::{render_llm, ReplayEngine};
use crownfall::tournament::{run_battle_recorded, PilotKind};
use std::path::{Path, PathBuf};

/// Execute the run command.
///
/// # Errors
///
/// Returns an error if the battle fails to run.
pub(crate) fn execute(
    config: Option<&Path>,
    seed: Option<u64>,
    pilot: PilotKind,
    format: OutputFormat,
    save: Option<PathBuf>,
    quiet: bool,
) -> Result<(), CliError> {
    let setup = load_setup(config)?;
    let seed = seed_or_now(seed);

    if !quiet && format == OutputFormat::Text {
        println!("Running battle with seed {seed} ({pilot} pilot)...");
        println!();
    }

    let (outcome, recording) = run_battle_recorded(seed, pilot, &setup)?;

    // Save recording if requested
    if let Some(save_path) = save {
        recording.save(&save_path)?;
        if !quiet && format == OutputFormat::Text {
            println!("Recording saved to: {}", save_path.display());
            println!();
        }
    }

    match format {
        OutputFormat::Text => {
            print!("{}", format_text(&outcome));
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&outcome)
                .map_err(|e| CliError::new(format!("JSON serialization failed: {e}")))?;
            println!("{json}");
        }
        OutputFormat::Llm => {
            // Replay to get the final state
            let mut engine = ReplayEngine::new(recording)?;
            engine.run_to_end()?;
            println!("{}", render_llm(engine.battle()));
        }
    }

    Ok(())
}
