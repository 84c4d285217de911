//! Watch command implementation - Interactive TUI battle.

// CLI watch uses intentional casts for display and timing
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]

use super::{load_setup, seed_or_now, CliError};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use crownfall::game::{Battle, BattleEvent, BattleEventKind, Command, Faction, Lane, Position, TowerKind};
use crownfall::replay::Recording;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame, Terminal,
};
use std::collections::VecDeque;
use std::io::stdout;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Event lines kept for the log panel.
const LOG_LINES: usize = 12;

/// Execute the watch command.
///
/// # Errors
///
/// Returns an error if the config is invalid or the TUI fails.
pub(crate) fn execute(
    config: Option<&Path>,
    seed: Option<u64>,
    speed: f32,
    save: Option<PathBuf>,
) -> Result<(), CliError> {
    let setup = load_setup(config)?;
    let seed = seed_or_now(seed);
    let tick_ms = setup.config.battle.tick_ms.max(1);

    let app = App {
        battle: Battle::new(&setup, seed),
        recording: Recording::new(seed, tick_ms, (*setup.config).clone()),
        tick_ms,
        speed: speed.clamp(0.25, 8.0),
        paused: true,
        lane: Lane::Left,
        log: VecDeque::new(),
        message: String::new(),
        last_tick: Instant::now(),
    };

    let recording = run_tui(app)?;
    if let Some(path) = save {
        recording.save(&path)?;
        println!("Recording saved to: {}", path.display());
    }
    Ok(())
}

/// App state for the TUI.
struct App {
    battle: Battle,
    recording: Recording,
    tick_ms: u64,
    speed: f32,
    paused: bool,
    lane: Lane,
    log: VecDeque<String>,
    message: String,
    last_tick: Instant,
}

impl App {
    fn should_tick(&self) -> bool {
        let wait = Duration::from_secs_f32(self.tick_ms as f32 / 1000.0 / self.speed);
        !self.paused && !self.battle.is_over() && self.last_tick.elapsed() >= wait
    }

    fn tick(&mut self) {
        self.battle.tick(self.tick_ms);
        self.last_tick = Instant::now();
        self.absorb_events();
    }

    /// Apply a player command, recording it if accepted.
    fn command(&mut self, command: Command) {
        let tick = self.battle.ticks();
        match self.battle.apply(&command) {
            Ok(()) => {
                self.message = format!("{command}");
                self.recording.push(tick, command);
            }
            Err(e) => self.message = format!("rejected: {e}"),
        }
        self.absorb_events();
    }

    fn deploy_slot(&mut self, slot: usize) {
        let Some(card) = self.battle.deck().hand().get(slot).cloned() else {
            return;
        };
        self.command(Command::Deploy {
            card,
            lane: self.lane,
        });
    }

    /// Cast the first ready ability among the player's units.
    fn cast_first_ready(&mut self) {
        let now = self.battle.now();
        let abilities = self.battle.abilities();
        let ready = self
            .battle
            .field()
            .units_of(Faction::Player)
            .filter(|u| {
                self.battle
                    .catalog()
                    .get(&u.archetype)
                    .is_some_and(|a| a.ability.is_some())
            })
            .find(|u| !abilities.is_active(u.id) && abilities.cooldown_remaining(u.id, now) == 0)
            .map(|u| u.id);
        match ready {
            Some(unit) => self.command(Command::UseAbility { unit }),
            None => self.message = "no ability ready".to_string(),
        }
    }

    fn absorb_events(&mut self) {
        for event in self.battle.drain_events() {
            if let Some(line) = describe(&event) {
                self.log.push_front(line);
            }
        }
        self.log.truncate(LOG_LINES);
    }
}

/// One log line for the events worth showing.
fn describe(event: &BattleEvent) -> Option<String> {
    let t = event.at_ms as f32 / 1000.0;
    let text = match &event.kind {
        BattleEventKind::UnitDeployed { unit, faction, archetype, lane, .. } => {
            format!("{faction} {archetype} {unit} -> {lane:?}")
        }
        BattleEventKind::UnitDestroyed { unit, .. } => format!("{unit} destroyed"),
        BattleEventKind::TowerDestroyed { faction, kind, .. } => {
            format!("{faction} {kind:?} tower destroyed")
        }
        BattleEventKind::AbilityActivated { unit, ability } => format!("{unit} casts {ability}"),
        BattleEventKind::AbilityEnded { unit, ability, .. } => format!("{unit} {ability} ends"),
        BattleEventKind::Stunned { unit } => format!("{unit} stunned"),
        BattleEventKind::BattleEnded { summary } => {
            format!("battle over: {}", summary.result)
        }
        _ => return None,
    };
    Some(format!("{t:>6.1}s {text}"))
}

fn run_tui(mut app: App) -> Result<Recording, CliError> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).map_err(|e| CliError::new(e.to_string()))?;

    loop {
        terminal.draw(|f| ui(f, &app)).map_err(|e| CliError::new(e.to_string()))?;

        if app.should_tick() {
            app.tick();
        }

        // Handle input with timeout
        if event::poll(Duration::from_millis(10)).map_err(|e| CliError::new(e.to_string()))?
            && let Event::Key(key) = event::read().map_err(|e| CliError::new(e.to_string()))?
            && key.kind == KeyEventKind::Press
        {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => break,
                KeyCode::Char(' ') => app.paused = !app.paused,
                KeyCode::Left => app.lane = Lane::Left,
                KeyCode::Right => app.lane = Lane::Right,
                KeyCode::Tab => app.lane = app.lane.other(),
                KeyCode::Char(c @ '1'..='4') => {
                    app.deploy_slot(c as usize - '1' as usize);
                }
                KeyCode::Char('a') => app.cast_first_ready(),
                KeyCode::Char('.') if app.paused => app.tick(),
                KeyCode::Char('+' | '=') => app.speed = (app.speed * 2.0).min(8.0),
                KeyCode::Char('-') => app.speed = (app.speed / 2.0).max(0.25),
                _ => {}
            }
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;

    Ok(app.recording)
}

fn ui(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),  // Header
            Constraint::Min(10),    // Main content
            Constraint::Length(3),  // Footer
        ])
        .split(f.area());

    let status = if app.battle.is_over() {
        "BATTLE OVER"
    } else if app.paused {
        "PAUSED"
    } else {
        "RUNNING"
    };
    render_header(f, chunks[0], &app.battle, &format!("{status} | x{} | lane {:?}", app.speed, app.lane));

    let main = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(chunks[1]);
    render_arena(f, main[0], &app.battle);

    let side = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(8), Constraint::Length(LOG_LINES as u16 + 2)])
        .split(main[1]);
    render_sidebar(f, side[0], &app.battle);

    let log: Vec<Line> = app.log.iter().map(|l| Line::from(l.as_str())).collect();
    f.render_widget(
        Paragraph::new(log).block(Block::default().borders(Borders::ALL).title(" Events ")),
        side[1],
    );

    let controls = format!(
        " [q] Quit  [Space] Pause  [.] Step  [1-4] Deploy  [←/→/Tab] Lane  [a] Ability  [+/-] Speed   {}",
        app.message
    );
    render_footer(f, chunks[2], &controls);
}

/// Title bar with time, elixir and crowns.
pub(super) fn render_header(f: &mut Frame, area: Rect, battle: &Battle, status: &str) {
    let clock = battle.clock();
    let (player_crowns, enemy_crowns) = battle.crowns();
    let title = format!(
        " Crownfall | {:.1}s / {:.0}s | Elixir {}/{} | Crowns {}-{} | {} ",
        clock.elapsed_ms() as f32 / 1000.0,
        clock.duration_ms() as f32 / 1000.0,
        battle.elixir().current(),
        battle.elixir().capacity(),
        player_crowns,
        enemy_crowns,
        status
    );

    let header = Paragraph::new(title)
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(header, area);
}

pub(super) fn render_footer(f: &mut Frame, area: Rect, controls: &str) {
    let footer = Paragraph::new(controls.to_string())
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(footer, area);
}

const fn faction_color(faction: Faction) -> Color {
    match faction {
        Faction::Player => Color::Blue,
        Faction::Enemy => Color::Red,
    }
}

/// Top-down arena, enemy side at the top, scaled to fit `area`.
pub(super) fn render_arena(f: &mut Frame, area: Rect, battle: &Battle) {
    let field = battle.field();
    let arena = field.arena();
    let (mut min_x, mut max_x, mut min_z, mut max_z) = (0.0f32, 0.0f32, 0.0f32, 0.0f32);
    for t in field.towers() {
        min_x = min_x.min(t.position.x - 2.0);
        max_x = max_x.max(t.position.x + 2.0);
        min_z = min_z.min(t.position.z - 2.0);
        max_z = max_z.max(t.position.z + 2.0);
    }

    let cols = usize::from(area.width.saturating_sub(2)).max(1);
    let rows = usize::from(area.height.saturating_sub(2)).max(1);
    let cell = |p: Position| -> Option<(usize, usize)> {
        let c = ((p.x - min_x) / (max_x - min_x) * (cols - 1) as f32).round();
        let r = ((max_z - p.z) / (max_z - min_z) * (rows - 1) as f32).round();
        (c >= 0.0 && r >= 0.0 && (c as usize) < cols && (r as usize) < rows)
            .then(|| (r as usize, c as usize))
    };

    let mut grid: Vec<Vec<(char, Style)>> =
        vec![vec![(' ', Style::default()); cols]; rows];
    let dim = Style::default().fg(Color::DarkGray);
    for (r, row) in grid.iter_mut().enumerate() {
        let z = max_z - r as f32 / (rows.max(2) - 1) as f32 * (max_z - min_z);
        for x in [arena.left_lane_x, arena.right_lane_x] {
            if let Some((_, c)) = cell(Position::new(x, z)) {
                row[c] = (':', dim);
            }
        }
    }
    if let Some((r, _)) = cell(Position::new(min_x, arena.bridge_z)) {
        for slot in &mut grid[r] {
            *slot = ('~', Style::default().fg(Color::Cyan));
        }
    }

    for t in field.towers() {
        if let Some((r, c)) = cell(t.position) {
            let symbol = match (t.vitals.is_destroyed(), t.kind) {
                (true, _) => 'x',
                (false, TowerKind::King) => 'K',
                (false, _) => 'T',
            };
            let style = Style::default()
                .fg(faction_color(t.faction))
                .add_modifier(Modifier::BOLD);
            grid[r][c] = (symbol, style);
        }
    }
    for faction in Faction::ALL {
        for u in field.units_of(faction) {
            if let Some((r, c)) = cell(u.position) {
                let symbol = if u.stunned {
                    '*'
                } else {
                    u.archetype.chars().next().unwrap_or('?')
                };
                grid[r][c] = (symbol, Style::default().fg(faction_color(faction)));
            }
        }
    }

    let lines: Vec<Line> = grid
        .into_iter()
        .map(|row| {
            Line::from(
                row.into_iter()
                    .map(|(ch, style)| Span::styled(ch.to_string(), style))
                    .collect::<Vec<_>>(),
            )
        })
        .collect();
    f.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(" Arena ")),
        area,
    );
}

/// Hand, towers and unit list.
pub(super) fn render_sidebar(f: &mut Frame, area: Rect, battle: &Battle) {
    let mut lines = Vec::new();
    let now = battle.now();

    lines.push(Line::from(Span::styled("Hand", Style::default().add_modifier(Modifier::BOLD))));
    for (i, card) in battle.deck().hand().iter().enumerate() {
        let cost = battle.catalog().get(card).map_or(0, |a| a.troop.cost);
        let style = if battle.elixir().can_afford(cost) {
            Style::default()
        } else {
            Style::default().fg(Color::DarkGray)
        };
        lines.push(Line::from(Span::styled(format!("  [{}] {card} ({cost})", i + 1), style)));
    }
    if let Some(next) = battle.deck().next_card() {
        lines.push(Line::from(format!("  next: {next}")));
    }
    lines.push(Line::from(""));

    for faction in Faction::ALL {
        let color = faction_color(faction);
        let towers: Vec<String> = battle
            .field()
            .towers_of(faction)
            .map(|t| format!("{:.0}%", t.vitals.ratio() * 100.0))
            .collect();
        lines.push(Line::from(vec![
            Span::styled(format!("{faction} "), Style::default().fg(color).add_modifier(Modifier::BOLD)),
            Span::raw(format!("towers {}", towers.join(" / "))),
        ]));
        for u in battle.field().units_of(faction) {
            let mut text = format!(
                "  {} {} {:.0}% {:?}",
                u.id,
                u.archetype,
                u.vitals.ratio() * 100.0,
                u.state
            );
            if battle.abilities().is_active(u.id) {
                text.push_str(" [ABILITY]");
            } else if battle.catalog().get(&u.archetype).is_some_and(|a| a.ability.is_some()) {
                text.push_str(&format!(
                    " [{:.0}%]",
                    battle.abilities().percent_ready(u.id, now) * 100.0
                ));
            }
            lines.push(Line::from(Span::styled(text, Style::default().fg(color))));
        }
    }

    if let Some(summary) = battle.outcome() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!(
                "{} ({:?}) gold {}",
                summary.result.to_string().to_uppercase(),
                summary.reason,
                summary.gold_earned
            ),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
    }

    f.render_widget(
        Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(" Battle "))
            .wrap(Wrap { trim: false }),
        area,
    );
}
