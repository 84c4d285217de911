//! Replay command implementation.

use super::watch::{render_arena, render_footer, render_header, render_sidebar};
use super::{CliError, ReplayFormat};
use crownfall::replay::{render_ascii, render_llm, Recording, ReplayEngine, ReplayError};
use std::path::PathBuf;

/// Execute the replay command.
///
/// # Errors
///
/// Returns an error if the replay fails.
pub(crate) fn execute(
    recording_path: PathBuf,
    format: ReplayFormat,
    tick: Option<u64>,
    every: u64,
) -> Result<(), CliError> {
    let recording = Recording::load(&recording_path).map_err(|e| {
        CliError::new(format!("Failed to load recording {}: {e}", recording_path.display()))
    })?;

    let engine = match tick {
        Some(target) => ReplayEngine::new_at_tick(recording, target)?,
        None => ReplayEngine::new(recording)?,
    };

    match format {
        ReplayFormat::Tui => run_replay_tui(engine),
        ReplayFormat::Text => print_replay(engine, every.max(1), false),
        ReplayFormat::Llm => print_replay(engine, every.max(1), true),
    }
}

fn run_replay_tui(mut engine: ReplayEngine) -> Result<(), CliError> {
    use crossterm::{
        event::{self, Event, KeyCode, KeyEventKind},
        execute,
        terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    };
    use ratatui::{
        backend::CrosstermBackend,
        layout::{Constraint, Direction, Layout},
        Terminal,
    };
    use std::io::stdout;
    use std::time::Duration;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).map_err(|e| CliError::new(e.to_string()))?;

    // Ticks per key press
    let mut stride: u64 = 1;
    let mut message = String::new();

    loop {
        terminal
            .draw(|f| {
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([
                        Constraint::Length(3),
                        Constraint::Min(10),
                        Constraint::Length(3),
                    ])
                    .split(f.area());

                let status = format!(
                    "REPLAY tick {}/{} | stride {stride}",
                    engine.tick(),
                    engine.recording().max_tick()
                );
                render_header(f, chunks[0], engine.battle(), &status);

                let main = Layout::default()
                    .direction(Direction::Horizontal)
                    .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
                    .split(chunks[1]);
                render_arena(f, main[0], engine.battle());
                render_sidebar(f, main[1], engine.battle());

                render_footer(
                    f,
                    chunks[2],
                    &format!(" [q] Quit  [←/→] Step  [+/-] Stride  [r] Restart  [e] End   {message}"),
                );
            })
            .map_err(|e| CliError::new(e.to_string()))?;

        // Handle input
        if event::poll(Duration::from_millis(100)).map_err(|e| CliError::new(e.to_string()))?
            && let Event::Key(key) = event::read().map_err(|e| CliError::new(e.to_string()))?
            && key.kind == KeyEventKind::Press
        {
            let result = match key.code {
                KeyCode::Char('q') | KeyCode::Esc => break,
                KeyCode::Right | KeyCode::Char('l') => {
                    let target = (engine.tick() + stride).min(engine.recording().max_tick());
                    engine.goto_tick(target)
                }
                KeyCode::Left | KeyCode::Char('h') => {
                    engine.goto_tick(engine.tick().saturating_sub(stride))
                }
                KeyCode::Char('+' | '=') => {
                    stride = (stride * 10).min(1000);
                    Ok(())
                }
                KeyCode::Char('-') => {
                    stride = (stride / 10).max(1);
                    Ok(())
                }
                KeyCode::Char('r') => engine.goto_tick(0),
                KeyCode::Char('e') => engine.run_to_end(),
                _ => Ok(()),
            };
            message = match result {
                Ok(()) => String::new(),
                Err(e) => e.to_string(),
            };
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;

    Ok(())
}

fn print_replay(mut engine: ReplayEngine, every: u64, llm: bool) -> Result<(), CliError> {
    let recording = engine.recording();
    if llm {
        println!("# Battle Replay");
    } else {
        println!("Replay of battle");
    }
    println!("Seed: {}", recording.seed);
    println!("Tick: {}ms", recording.tick_ms);
    if let Some(pilot) = recording.pilot {
        println!("Pilot: {pilot}");
    }
    println!("Commands: {}", recording.commands.len());
    println!();

    loop {
        if engine.tick() % every == 0 || engine.is_over() {
            if llm {
                println!("{}", render_llm(engine.battle()));
                println!("---");
            } else {
                println!("{}", render_ascii(engine.battle()));
            }
            println!();
        }

        if engine.is_over() {
            println!("{}", if llm { "# BATTLE OVER" } else { "=== BATTLE OVER ===" });
            break;
        }

        if let Err(e) = engine.step_forward() {
            if matches!(e, ReplayError::BattleOver) {
                break;
            }
            return Err(e.into());
        }
    }

    Ok(())
}
