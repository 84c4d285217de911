//! The enemy side's spawn cadence.
//!
//! At each scheduled spawn the AI picks a uniformly random archetype and
//! lane, then draws the delay to its next spawn from the configured range.
//! All randomness comes from a seeded `ChaCha8Rng`, so a battle's seed fixes
//! the enemy's whole behaviour.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::game::{Catalog, Lane};

/// Enemy spawn tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyAiConfig {
    /// Whether the enemy spawns at all.
    pub enabled: bool,
    /// Shortest delay between spawns.
    pub min_spawn_delay_ms: u64,
    /// Longest delay between spawns.
    pub max_spawn_delay_ms: u64,
}

impl Default for EnemyAiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_spawn_delay_ms: 2600,
            max_spawn_delay_ms: 5200,
        }
    }
}

/// A spawn decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnOrder {
    /// Archetype key.
    pub archetype: String,
    /// Lane.
    pub lane: Lane,
}

/// Seeded enemy controller.
#[derive(Debug, Clone)]
pub struct EnemyAi {
    config: EnemyAiConfig,
    rng: ChaCha8Rng,
}

impl EnemyAi {
    /// Create a controller from a seed.
    #[must_use]
    pub fn new(config: EnemyAiConfig, seed: u64) -> Self {
        Self {
            config,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Whether the enemy spawns at all.
    #[must_use]
    pub const fn enabled(&self) -> bool {
        self.config.enabled
    }

    /// Draw the delay until the next spawn, within `[min, max]`.
    pub fn next_delay(&mut self) -> u64 {
        let min = self.config.min_spawn_delay_ms;
        let max = self.config.max_spawn_delay_ms.max(min);
        self.rng.gen_range(min..=max)
    }

    /// Pick what to spawn. `None` only for an empty catalog.
    pub fn choose(&mut self, catalog: &Catalog) -> Option<SpawnOrder> {
        if catalog.is_empty() {
            return None;
        }
        let index = self.rng.gen_range(0..catalog.len());
        let archetype = catalog.by_index(index)?.troop.id.clone();
        let lane = if self.rng.gen_bool(0.5) {
            Lane::Left
        } else {
            Lane::Right
        };
        Some(SpawnOrder { archetype, lane })
    }
}
