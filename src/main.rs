//! Crownfall CLI - run, watch, replay and benchmark lane battles.

// Allow print in the CLI binary
#![allow(clippy::print_stdout, clippy::print_stderr)]

mod cli;

use clap::{Parser, Subcommand};
use crownfall::tournament::PilotKind;
use std::path::PathBuf;
use std::process::ExitCode;

/// Crownfall - A deterministic lane battle simulator
#[derive(Parser, Debug)]
#[command(name = "crownfall")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Battle config (TOML). Defaults to the stock config.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log filter, e.g. `info` or `crownfall=debug` (default: RUST_LOG, then warn)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a single headless battle
    Run {
        /// Random seed (default: random)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Player pilot: passive, greedy or random
        #[arg(short, long, default_value = "greedy")]
        pilot: PilotKind,

        /// Output format: text, json, or llm
        #[arg(short, long, default_value = "text")]
        format: cli::OutputFormat,

        /// Save recording to file
        #[arg(long)]
        save: Option<PathBuf>,

        /// Suppress progress output
        #[arg(short, long)]
        quiet: bool,
    },

    /// Play a battle interactively in the terminal
    Watch {
        /// Random seed
        #[arg(short, long)]
        seed: Option<u64>,

        /// Simulation speed multiplier (default: 1.0)
        #[arg(long, default_value = "1.0")]
        speed: f32,

        /// Save recording to file on exit
        #[arg(long)]
        save: Option<PathBuf>,
    },

    /// Replay a recorded battle
    Replay {
        /// Recording file (.json)
        #[arg(required = true)]
        recording: PathBuf,

        /// Output format: tui, text, or llm
        #[arg(short, long, default_value = "tui")]
        format: cli::ReplayFormat,

        /// Start at specific tick
        #[arg(short, long)]
        tick: Option<u64>,

        /// Print every Nth tick in text and llm formats
        #[arg(short, long, default_value = "20")]
        every: u64,
    },

    /// Run many parallel battles and aggregate statistics
    Tournament {
        /// Number of battles to run (default: 1000)
        #[arg(short = 'n', long, default_value = "1000")]
        battles: u64,

        /// Starting seed (increments for each battle)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Parallel threads (default: CPU count)
        #[arg(short = 'j', long)]
        threads: Option<usize>,

        /// Player pilot: passive, greedy or random
        #[arg(short, long, default_value = "greedy")]
        pilot: PilotKind,

        /// Output format: text, json, or csv
        #[arg(short, long, default_value = "text")]
        format: cli::TournamentFormat,

        /// Show progress bar
        #[arg(long)]
        progress: bool,
    },

    /// Validate a battle config
    Validate {
        /// Print the stock config as TOML instead
        #[arg(long)]
        print_default: bool,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();
    crownfall::telemetry::init(args.log_level.as_deref());
    let config = args.config.as_deref();

    let result = match args.command {
        Commands::Run {
            seed,
            pilot,
            format,
            save,
            quiet,
        } => cli::run::execute(config, seed, pilot, format, save, quiet),

        Commands::Watch { seed, speed, save } => cli::watch::execute(config, seed, speed, save),

        Commands::Replay {
            recording,
            format,
            tick,
            every,
        } => cli::replay::execute(recording, format, tick, every),

        Commands::Tournament {
            battles,
            seed,
            threads,
            pilot,
            format,
            progress,
        } => cli::tournament::execute(config, battles, seed, threads, pilot, format, progress),

        Commands::Validate { print_default } => {
            cli::validate::execute(args.config.clone(), print_default)
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
