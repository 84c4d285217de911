//! Battle recording and replay.
//!
//! Because battles are 100% deterministic, a recording only needs:
//! - `seed: u64` - The enemy seed
//! - `config` - The full battle configuration
//! - `commands` - Every accepted player command with the tick it preceded
//!
//! No state deltas needed. To view tick N, re-run the simulation from tick 0
//! to N.
//!
//! # Time Travel
//!
//! - **Forward**: Continue stepping the simulation
//! - **Backward**: Re-run from tick 0 to (`current_tick` - 1)
//! - **Jump to tick N**: Re-run from tick 0 to N

mod render;
mod text;

pub use render::render_ascii;
pub use text::render_llm;

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{BattleConfig, BattleSetup};
use crate::error::{ActionError, ConfigError};
use crate::game::{Battle, Command};
use crate::tournament::PilotKind;

/// A command and the tick it was applied before.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedCommand {
    /// Ticks completed when the command was applied.
    pub tick: u64,
    /// The command.
    pub command: Command,
}

/// Minimal recording - seed, config, tick length and player commands.
///
/// Because the battle is deterministic, this is all we need to replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    /// Enemy seed.
    pub seed: u64,
    /// Tick length used while recording.
    pub tick_ms: u64,
    /// Pilot that produced the commands, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pilot: Option<PilotKind>,
    /// Battle configuration.
    pub config: BattleConfig,
    /// Accepted commands in application order.
    pub commands: Vec<RecordedCommand>,
}

impl Recording {
    /// Start an empty recording.
    #[must_use]
    pub fn new(seed: u64, tick_ms: u64, config: BattleConfig) -> Self {
        Self {
            seed,
            tick_ms,
            pilot: None,
            config,
            commands: Vec::new(),
        }
    }

    /// Tag the recording with the pilot that drove it.
    #[must_use]
    pub fn with_pilot(mut self, pilot: PilotKind) -> Self {
        self.pilot = Some(pilot);
        self
    }

    /// Append a command applied before tick `tick`.
    pub fn push(&mut self, tick: u64, command: Command) {
        self.commands.push(RecordedCommand { tick, command });
    }

    /// Ticks needed to exhaust the configured duration.
    #[must_use]
    pub fn max_tick(&self) -> u64 {
        self.config.battle.duration_ms.div_ceil(self.tick_ms.max(1))
    }

    /// Save recording to a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save(&self, path: &Path) -> Result<(), ReplayError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load recording from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is unreadable or malformed.
    pub fn load(path: &Path) -> Result<Self, ReplayError> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

/// Error type for replay operations.
#[derive(Debug)]
pub enum ReplayError {
    /// Reading or writing a recording failed.
    Io(std::io::Error),
    /// A recording is not valid JSON for this format.
    Format(serde_json::Error),
    /// The recorded configuration does not validate.
    Config(ConfigError),
    /// Tick number out of bounds.
    TickOutOfBounds {
        /// Requested tick.
        requested: u64,
        /// Maximum tick (inclusive).
        max_tick: u64,
    },
    /// Battle is already over.
    BattleOver,
    /// A recorded command was rejected; the recording does not match this
    /// build's rules.
    Diverged {
        /// Tick the command was recorded at.
        tick: u64,
        /// Why it was rejected.
        error: ActionError,
    },
}

impl std::fmt::Display for ReplayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "Recording I/O failed: {e}"),
            Self::Format(e) => write!(f, "Malformed recording: {e}"),
            Self::Config(e) => write!(f, "Recorded config is invalid: {e}"),
            Self::TickOutOfBounds { requested, max_tick } => {
                write!(f, "Tick {requested} out of bounds (max: {max_tick})")
            }
            Self::BattleOver => write!(f, "Battle is already over"),
            Self::Diverged { tick, error } => {
                write!(f, "Replay diverged at tick {tick}: {error}")
            }
        }
    }
}

impl std::error::Error for ReplayError {}

impl From<std::io::Error> for ReplayError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for ReplayError {
    fn from(e: serde_json::Error) -> Self {
        Self::Format(e)
    }
}

impl From<ConfigError> for ReplayError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

/// Replay engine - steps through a battle deterministically.
///
/// Since battles are deterministic, this engine can:
/// - Step forward by applying the tick's commands and ticking once
/// - Step backward by replaying from tick 0
/// - Jump to any tick by replaying from tick 0
#[derive(Debug)]
pub struct ReplayEngine {
    recording: Recording,
    setup: BattleSetup,
    battle: Battle,
    /// Index of the next command to apply.
    cursor: usize,
}

impl ReplayEngine {
    /// Create a new replay engine from a recording, starting at tick 0.
    ///
    /// # Errors
    ///
    /// Returns an error if the recorded config is invalid.
    pub fn new(recording: Recording) -> Result<Self, ReplayError> {
        Self::new_at_tick(recording, 0)
    }

    /// Create a new replay engine at a specific tick.
    ///
    /// This replays from tick 0 to the target tick, stopping early if the
    /// battle ends.
    ///
    /// # Errors
    ///
    /// Returns an error if the config is invalid or the replay diverges.
    pub fn new_at_tick(recording: Recording, target_tick: u64) -> Result<Self, ReplayError> {
        let setup = BattleSetup::from_config(recording.config.clone())?;
        let battle = Battle::new(&setup, recording.seed);
        let mut engine = Self {
            recording,
            setup,
            battle,
            cursor: 0,
        };
        while engine.battle.ticks() < target_tick && !engine.battle.is_over() {
            engine.step_internal()?;
        }
        Ok(engine)
    }

    /// Get the recording.
    #[must_use]
    pub const fn recording(&self) -> &Recording {
        &self.recording
    }

    /// Get current tick number.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.battle.ticks()
    }

    /// Get current battle state.
    #[must_use]
    pub const fn battle(&self) -> &Battle {
        &self.battle
    }

    /// Check if the battle is over.
    #[must_use]
    pub const fn is_over(&self) -> bool {
        self.battle.is_over()
    }

    /// Step forward one tick.
    ///
    /// # Errors
    ///
    /// Returns an error if the battle is already over or a recorded command
    /// is rejected.
    pub fn step_forward(&mut self) -> Result<(), ReplayError> {
        if self.battle.is_over() {
            return Err(ReplayError::BattleOver);
        }
        self.step_internal()
    }

    /// Step backward one tick.
    ///
    /// This replays from tick 0 to (`current_tick` - 1).
    ///
    /// # Errors
    ///
    /// Returns an error if already at tick 0.
    pub fn step_backward(&mut self) -> Result<(), ReplayError> {
        let Some(target) = self.tick().checked_sub(1) else {
            return Err(ReplayError::TickOutOfBounds {
                requested: 0,
                max_tick: self.recording.max_tick(),
            });
        };
        self.goto_tick(target)
    }

    /// Jump to a specific tick.
    ///
    /// This replays from tick 0 to the target tick.
    ///
    /// # Errors
    ///
    /// Returns an error if the tick is out of bounds or the replay diverges.
    pub fn goto_tick(&mut self, target_tick: u64) -> Result<(), ReplayError> {
        let max_tick = self.recording.max_tick();
        if target_tick > max_tick {
            return Err(ReplayError::TickOutOfBounds {
                requested: target_tick,
                max_tick,
            });
        }
        if target_tick < self.tick() {
            self.battle = Battle::new(&self.setup, self.recording.seed);
            self.cursor = 0;
        }
        while self.battle.ticks() < target_tick && !self.battle.is_over() {
            self.step_internal()?;
        }
        debug!(tick = self.tick(), "replay positioned");
        Ok(())
    }

    /// Run to the end of the battle.
    ///
    /// # Errors
    ///
    /// Returns an error if the replay diverges.
    pub fn run_to_end(&mut self) -> Result<(), ReplayError> {
        while !self.battle.is_over() {
            self.step_internal()?;
        }
        Ok(())
    }

    /// Render current state to ASCII for terminal viewing.
    #[must_use]
    pub fn render_ascii(&self) -> String {
        render_ascii(&self.battle)
    }

    /// Render current state to structured text for LLM consumption.
    #[must_use]
    pub fn render_llm(&self) -> String {
        render_llm(&self.battle)
    }

    /// Apply this tick's commands, then tick once.
    fn step_internal(&mut self) -> Result<(), ReplayError> {
        let tick = self.battle.ticks();
        while let Some(recorded) = self.recording.commands.get(self.cursor) {
            if recorded.tick > tick {
                break;
            }
            self.battle
                .apply(&recorded.command)
                .map_err(|error| ReplayError::Diverged { tick: recorded.tick, error })?;
            self.cursor += 1;
        }
        self.battle.tick(self.recording.tick_ms.max(1));
        // Replays are viewed through snapshots, not the event stream
        self.battle.drain_events();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Lane;
    use crate::tournament::run_battle_recorded;
    use tempfile::NamedTempFile;

    fn short_config() -> BattleConfig {
        let mut config = BattleConfig::default();
        config.battle.duration_ms = 15_000;
        config.battle.tick_ms = 100;
        config
    }

    #[test]
    fn test_recording_save_load_roundtrip() {
        let mut recording = Recording::new(123_456_789, 50, short_config()).with_pilot(PilotKind::Greedy);
        recording.push(
            3,
            Command::Deploy {
                card: "doge-warrior".into(),
                lane: Lane::Right,
            },
        );

        let temp_file = NamedTempFile::new().expect("create temp file");
        recording.save(temp_file.path()).expect("save recording");
        let loaded = Recording::load(temp_file.path()).expect("load recording");

        assert_eq!(loaded, recording);
    }

    #[test]
    fn test_load_rejects_garbage() {
        let temp_file = NamedTempFile::new().unwrap();
        fs::write(temp_file.path(), "not json").unwrap();
        assert!(matches!(Recording::load(temp_file.path()), Err(ReplayError::Format(_))));
    }

    #[test]
    fn test_replay_reproduces_recorded_battle() {
        let setup = BattleSetup::from_config(short_config()).unwrap();
        let (outcome, recording) = run_battle_recorded(21, PilotKind::Greedy, &setup).unwrap();

        let mut engine = ReplayEngine::new(recording).unwrap();
        engine.run_to_end().unwrap();
        assert_eq!(engine.battle().outcome(), Some(&outcome.summary));
        assert_eq!(engine.tick(), outcome.ticks);
    }

    #[test]
    fn test_step_backward_matches_fresh_replay() {
        let setup = BattleSetup::from_config(short_config()).unwrap();
        let (_, recording) = run_battle_recorded(4, PilotKind::Greedy, &setup).unwrap();

        let mut engine = ReplayEngine::new_at_tick(recording.clone(), 40).unwrap();
        engine.step_backward().unwrap();
        assert_eq!(engine.tick(), 39);

        let fresh = ReplayEngine::new_at_tick(recording, 39).unwrap();
        assert_eq!(engine.battle().snapshot(), fresh.battle().snapshot());
    }

    #[test]
    fn test_bounds() {
        let mut engine = ReplayEngine::new(Recording::new(1, 100, short_config())).unwrap();
        assert!(matches!(engine.step_backward(), Err(ReplayError::TickOutOfBounds { .. })));
        assert!(matches!(
            engine.goto_tick(151),
            Err(ReplayError::TickOutOfBounds { requested: 151, max_tick: 150 })
        ));
        engine.goto_tick(150).unwrap();
        assert!(engine.is_over());
        assert!(matches!(engine.step_forward(), Err(ReplayError::BattleOver)));
    }

    #[test]
    fn test_divergence_is_reported() {
        let mut recording = Recording::new(1, 100, short_config());
        recording.push(
            0,
            Command::Deploy {
                card: "no-such-troop".into(),
                lane: Lane::Left,
            },
        );
        let err = ReplayEngine::new_at_tick(recording, 5).unwrap_err();
        assert!(matches!(err, ReplayError::Diverged { tick: 0, .. }));
        assert!(err.to_string().contains("tick 0"));
    }
}
