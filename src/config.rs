//! Battle configuration.
//!
//! Every tunable lives in [`BattleConfig`], loadable from TOML. Missing
//! tables and fields fall back to the stock values, so a config file only
//! needs the numbers it changes.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::game::{
    default_troops, ArenaConfig, BattleResult, Catalog, ElixirConfig, EnemyAiConfig, TowerConfig,
    TowerStats, TroopDef, HAND_SIZE,
};

/// Battle length and headless tick size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Battle length in milliseconds.
    pub duration_ms: u64,
    /// Tick length used by headless runs and replays.
    pub tick_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            duration_ms: 180_000,
            tick_ms: 50,
        }
    }
}

/// Gold awarded at the end of a battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    /// Base gold for a victory.
    pub victory: u32,
    /// Base gold for a draw.
    pub draw: u32,
    /// Base gold for a defeat.
    pub defeat: u32,
    /// Extra gold per enemy tower destroyed.
    pub per_crown: u32,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            victory: 100,
            draw: 50,
            defeat: 20,
            per_crown: 25,
        }
    }
}

impl RewardConfig {
    /// Gold for a result with `crowns` enemy towers destroyed.
    #[must_use]
    pub const fn gold(&self, result: BattleResult, crowns: u32) -> u32 {
        let base = match result {
            BattleResult::Victory => self.victory,
            BattleResult::Draw => self.draw,
            BattleResult::Defeat => self.defeat,
        };
        base.saturating_add(self.per_crown.saturating_mul(crowns))
    }
}

/// Complete battle configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleConfig {
    /// Timing.
    pub battle: TimingConfig,
    /// Elixir economy.
    pub elixir: ElixirConfig,
    /// Arena geometry.
    pub arena: ArenaConfig,
    /// Towers.
    pub towers: TowerConfig,
    /// Enemy spawn cadence.
    pub enemy_ai: EnemyAiConfig,
    /// End-of-battle gold.
    pub rewards: RewardConfig,
    /// Player deck, in deal order.
    pub deck: Vec<String>,
    /// Troop catalog.
    pub troops: Vec<TroopDef>,
}

impl Default for BattleConfig {
    fn default() -> Self {
        let troops = default_troops();
        Self {
            battle: TimingConfig::default(),
            elixir: ElixirConfig::default(),
            arena: ArenaConfig::default(),
            towers: TowerConfig::default(),
            enemy_ai: EnemyAiConfig::default(),
            rewards: RewardConfig::default(),
            deck: troops.iter().map(|t| t.id.clone()).collect(),
            troops,
        }
    }
}

impl BattleConfig {
    /// Parse a TOML document.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for malformed TOML.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Read and parse a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an IO or parse error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Render as pretty TOML.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Serialize` if a value has no TOML form.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check every field and return all problems found.
    ///
    /// # Errors
    ///
    /// The single problem found, or `ConfigError::Multiple`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        match Catalog::new(&self.troops) {
            Ok(_) => {}
            Err(ConfigError::Multiple(inner)) => errors.extend(inner),
            Err(e) => errors.push(e),
        }

        for card in &self.deck {
            if !self.troops.iter().any(|t| &t.id == card) {
                errors.push(ConfigError::UnknownDeckEntry(card.clone()));
            }
        }
        if self.deck.len() < HAND_SIZE {
            errors.push(ConfigError::DeckTooSmall {
                found: self.deck.len(),
                required: HAND_SIZE,
            });
        }

        if self.battle.duration_ms == 0 {
            errors.push(ConfigError::invalid("battle.duration_ms", "must be positive"));
        }
        if self.battle.tick_ms == 0 {
            errors.push(ConfigError::invalid("battle.tick_ms", "must be positive"));
        }

        if self.elixir.capacity == 0 {
            errors.push(ConfigError::invalid("elixir.capacity", "must be positive"));
        }
        if self.elixir.regen_interval_ms == 0 {
            errors.push(ConfigError::invalid("elixir.regen_interval_ms", "must be positive"));
        }
        if self.elixir.initial > self.elixir.capacity {
            errors.push(ConfigError::invalid("elixir.initial", "exceeds capacity"));
        }

        if self.enemy_ai.min_spawn_delay_ms > self.enemy_ai.max_spawn_delay_ms {
            errors.push(ConfigError::invalid(
                "enemy_ai.min_spawn_delay_ms",
                "exceeds max_spawn_delay_ms",
            ));
        }
        if self.enemy_ai.enabled && self.enemy_ai.max_spawn_delay_ms == 0 {
            errors.push(ConfigError::invalid(
                "enemy_ai.max_spawn_delay_ms",
                "must be positive",
            ));
        }

        check_tower("towers.king", &self.towers.king, &mut errors);
        check_tower("towers.side", &self.towers.side, &mut errors);

        let arena = &self.arena;
        if arena.player_baseline_z >= arena.enemy_baseline_z {
            errors.push(ConfigError::invalid(
                "arena.player_baseline_z",
                "must be below enemy_baseline_z",
            ));
        }
        if arena.left_lane_x >= arena.right_lane_x {
            errors.push(ConfigError::invalid("arena.left_lane_x", "must be left of right_lane_x"));
        }

        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(ConfigError::Multiple(errors)),
        }
    }
}

fn check_tower(path: &str, stats: &TowerStats, errors: &mut Vec<ConfigError>) {
    if stats.hp == 0 {
        errors.push(ConfigError::invalid(format!("{path}.hp"), "must be positive"));
    }
    if !(stats.attack_range.is_finite() && stats.attack_range > 0.0) {
        errors.push(ConfigError::invalid(format!("{path}.attack_range"), "must be positive"));
    }
    if !(stats.attack_interval.is_finite() && stats.attack_interval > 0.0) {
        errors.push(ConfigError::invalid(format!("{path}.attack_interval"), "must be positive"));
    }
    if !(stats.damage.is_finite() && stats.damage >= 0.0) {
        errors.push(ConfigError::invalid(format!("{path}.damage"), "must be non-negative"));
    }
}

/// A validated configuration plus its shared catalog.
///
/// Cheap to clone; every battle built from the same setup shares one
/// catalog.
#[derive(Debug, Clone)]
pub struct BattleSetup {
    /// The configuration.
    pub config: Arc<BattleConfig>,
    /// Archetypes resolved from `config.troops`.
    pub catalog: Arc<Catalog>,
}

impl BattleSetup {
    /// Validate `config` and build its catalog.
    ///
    /// # Errors
    ///
    /// Any problem [`BattleConfig::validate`] reports.
    pub fn from_config(config: BattleConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let catalog = Catalog::new(&config.troops)?;
        Ok(Self {
            config: Arc::new(config),
            catalog: Arc::new(catalog),
        })
    }

    /// The stock configuration.
    ///
    /// # Errors
    ///
    /// Only if the stock values fail validation.
    pub fn standard() -> Result<Self, ConfigError> {
        Self::from_config(BattleConfig::default())
    }
}
