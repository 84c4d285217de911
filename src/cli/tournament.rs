//! Tournament command implementation.

use super::output::{format_tournament_csv, format_tournament_text, JsonTournamentResult};
use super::{load_setup, seed_or_now, CliError, TournamentFormat};
use crownfall::tournament::{run_tournament_with, PilotKind};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Instant;

/// Execute the tournament command.
///
/// # Errors
///
/// Returns an error if the tournament fails.
#[allow(clippy::too_many_arguments)]
pub(crate) fn execute(
    config: Option<&Path>,
    battles: u64,
    seed: Option<u64>,
    threads: Option<usize>,
    pilot: PilotKind,
    format: TournamentFormat,
    progress: bool,
) -> Result<(), CliError> {
    let setup = load_setup(config)?;

    // Set thread pool size if specified
    if let Some(num_threads) = threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
            .ok(); // Ignore error if already initialized
    }

    let base_seed = seed_or_now(seed);

    let pb = if progress {
        let pb = ProgressBar::new(battles);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} battles ({per_sec})")
            .map_err(|e| CliError::new(format!("Bad progress template: {e}")))?
            .progress_chars("=>-");
        pb.set_style(style);
        Some(pb)
    } else {
        None
    };

    let start = Instant::now();
    let stats = run_tournament_with(base_seed, battles, pilot, &setup, |_| {
        if let Some(pb) = &pb {
            pb.inc(1);
        }
    })?;
    if let Some(pb) = pb {
        pb.finish_with_message("done");
    }
    let duration = start.elapsed();

    #[allow(clippy::cast_precision_loss)]
    let battles_per_sec = if duration.as_secs_f64() > 0.0 {
        stats.battles as f64 / duration.as_secs_f64()
    } else {
        0.0
    };

    match format {
        TournamentFormat::Text => {
            println!();
            print!("{}", format_tournament_text(&stats, pilot));
            println!();
            println!(
                "Duration: {:.2}s ({:.0} battles/sec)",
                duration.as_secs_f64(),
                battles_per_sec
            );
        }
        TournamentFormat::Json => {
            let json_result = JsonTournamentResult::from_stats(&stats, pilot, base_seed);
            let json = serde_json::to_string_pretty(&json_result)
                .map_err(|e| CliError::new(format!("JSON serialization failed: {e}")))?;
            println!("{json}");
        }
        TournamentFormat::Csv => {
            print!("{}", format_tournament_csv(&stats, pilot));
        }
    }

    Ok(())
}
