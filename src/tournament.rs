//! Headless battle runner.
//!
//! Provides a pure function interface: `(seed, pilot, setup) -> BattleOutcome`
//!
//! The runner handles:
//! - Driving the player side with a scripted pilot
//! - Fixed-step ticking until the battle ends
//! - Optional command recording for replays
//! - Parallel tournaments with rayon

// Rates and averages are intentionally lossy
#![allow(clippy::cast_precision_loss)]

mod pilot;

pub use pilot::{GreedyPilot, PassivePilot, Pilot, PilotKind, RandomPilot};

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::BattleSetup;
use crate::game::{Battle, BattleEventKind, BattleResult, BattleSummary, EndReason, Faction};
use crate::replay::Recording;

/// Mixed into the battle seed for the pilot's own randomness.
const PILOT_SEED_SALT: u64 = 0x9E37_79B9_7F4A_7C15;

/// What one headless battle produced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BattleOutcome {
    /// Enemy seed.
    pub seed: u64,
    /// Who played the player side.
    pub pilot: PilotKind,
    /// End-of-battle report.
    pub summary: BattleSummary,
    /// Ticks simulated.
    pub ticks: u64,
    /// Commands the battle accepted.
    pub commands_applied: u32,
    /// Commands the battle rejected.
    pub commands_rejected: u32,
    /// Units each side deployed, player first.
    pub units_deployed: [u32; 2],
    /// Abilities the player cast.
    pub abilities_cast: u32,
}

/// Error type for tournament operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TournamentError {
    /// A tournament needs at least one battle.
    NoBattles,
    /// The battle stopped ticking without a result.
    Unfinished {
        /// Seed of the stuck battle.
        seed: u64,
    },
}

impl std::fmt::Display for TournamentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoBattles => write!(f, "Tournament needs at least one battle"),
            Self::Unfinished { seed } => write!(f, "Battle with seed {seed} ended without a result"),
        }
    }
}

impl std::error::Error for TournamentError {}

/// Run a complete battle with the given seed and pilot.
///
/// # Determinism
///
/// Given the same seed, pilot and setup, this function always produces the
/// same `BattleOutcome`.
///
/// # Errors
///
/// Returns `TournamentError::Unfinished` if the battle never produced a
/// summary.
pub fn run_battle(
    seed: u64,
    pilot: PilotKind,
    setup: &BattleSetup,
) -> Result<BattleOutcome, TournamentError> {
    BattleRunner::new(seed, pilot, setup, false).run().map(|(outcome, _)| outcome)
}

/// Like [`run_battle`], also returning a recording of the accepted commands.
///
/// # Errors
///
/// Same as [`run_battle`].
pub fn run_battle_recorded(
    seed: u64,
    pilot: PilotKind,
    setup: &BattleSetup,
) -> Result<(BattleOutcome, Recording), TournamentError> {
    let (outcome, recording) = BattleRunner::new(seed, pilot, setup, true).run()?;
    let recording = recording.ok_or(TournamentError::Unfinished { seed })?;
    Ok((outcome, recording))
}

/// Drives one battle to its end.
struct BattleRunner {
    battle: Battle,
    pilot: Box<dyn Pilot>,
    kind: PilotKind,
    tick_ms: u64,
    recording: Option<Recording>,
    applied: u32,
    rejected: u32,
    deployed: [u32; 2],
    cast: u32,
}

impl BattleRunner {
    fn new(seed: u64, kind: PilotKind, setup: &BattleSetup, record: bool) -> Self {
        let tick_ms = setup.config.battle.tick_ms.max(1);
        let recording =
            record.then(|| Recording::new(seed, tick_ms, (*setup.config).clone()).with_pilot(kind));
        Self {
            battle: Battle::new(setup, seed),
            pilot: kind.build(seed ^ PILOT_SEED_SALT),
            kind,
            tick_ms,
            recording,
            applied: 0,
            rejected: 0,
            deployed: [0; 2],
            cast: 0,
        }
    }

    fn run(mut self) -> Result<(BattleOutcome, Option<Recording>), TournamentError> {
        while !self.battle.is_over() {
            self.step();
        }

        let seed = self.battle.seed();
        let summary = self
            .battle
            .outcome()
            .cloned()
            .ok_or(TournamentError::Unfinished { seed })?;
        debug!(
            seed,
            pilot = %self.kind,
            result = %summary.result,
            crowns = summary.towers_destroyed,
            "battle finished"
        );

        let outcome = BattleOutcome {
            seed,
            pilot: self.kind,
            summary,
            ticks: self.battle.ticks(),
            commands_applied: self.applied,
            commands_rejected: self.rejected,
            units_deployed: self.deployed,
            abilities_cast: self.cast,
        };
        Ok((outcome, self.recording))
    }

    /// Ask the pilot, apply its commands, then tick once.
    fn step(&mut self) {
        let tick = self.battle.ticks();
        for command in self.pilot.decide(&self.battle) {
            match self.battle.apply(&command) {
                Ok(()) => {
                    self.applied += 1;
                    if let Some(recording) = &mut self.recording {
                        recording.push(tick, command);
                    }
                }
                Err(_) => self.rejected += 1,
            }
        }

        self.battle.tick(self.tick_ms);

        for event in self.battle.drain_events() {
            match event.kind {
                BattleEventKind::UnitDeployed { faction, .. } => {
                    self.deployed[faction.index()] += 1;
                }
                BattleEventKind::AbilityActivated { .. } => self.cast += 1,
                _ => {}
            }
        }
    }
}

/// Aggregated results of many battles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TournamentStats {
    /// Battles played.
    pub battles: u64,
    /// Player victories.
    pub victories: u64,
    /// Draws.
    pub draws: u64,
    /// Player defeats.
    pub defeats: u64,
    /// Battles ended by a king tower.
    pub king_finishes: u64,
    /// Enemy towers destroyed, summed.
    pub crowns: u64,
    /// Player towers lost, summed.
    pub crowns_lost: u64,
    /// Battle time, summed.
    pub total_duration_ms: u64,
    /// Gold awarded, summed.
    pub total_gold: u64,
    /// Units deployed per side, summed.
    pub units_deployed: [u64; 2],
    /// Abilities cast, summed.
    pub abilities_cast: u64,
    /// Rejected pilot commands, summed.
    pub commands_rejected: u64,
}

impl TournamentStats {
    /// Add a battle to the stats.
    pub fn add(&mut self, outcome: &BattleOutcome) {
        let summary = &outcome.summary;
        self.battles += 1;
        match summary.result {
            BattleResult::Victory => self.victories += 1,
            BattleResult::Draw => self.draws += 1,
            BattleResult::Defeat => self.defeats += 1,
        }
        if summary.reason == EndReason::KingTower {
            self.king_finishes += 1;
        }
        self.crowns += u64::from(summary.towers_destroyed);
        self.crowns_lost += u64::from(summary.towers_lost);
        self.total_duration_ms += summary.duration_ms;
        self.total_gold += u64::from(summary.gold_earned);
        for faction in Faction::ALL {
            let i = faction.index();
            self.units_deployed[i] += u64::from(outcome.units_deployed[i]);
        }
        self.abilities_cast += u64::from(outcome.abilities_cast);
        self.commands_rejected += u64::from(outcome.commands_rejected);
    }

    /// Combine two partial tallies.
    pub fn merge(&mut self, other: &Self) {
        self.battles += other.battles;
        self.victories += other.victories;
        self.draws += other.draws;
        self.defeats += other.defeats;
        self.king_finishes += other.king_finishes;
        self.crowns += other.crowns;
        self.crowns_lost += other.crowns_lost;
        self.total_duration_ms += other.total_duration_ms;
        self.total_gold += other.total_gold;
        for i in 0..2 {
            self.units_deployed[i] += other.units_deployed[i];
        }
        self.abilities_cast += other.abilities_cast;
        self.commands_rejected += other.commands_rejected;
    }

    fn per_battle(&self, total: u64) -> f64 {
        if self.battles == 0 {
            0.0
        } else {
            total as f64 / self.battles as f64
        }
    }

    /// Victory rate (0.0-1.0).
    #[must_use]
    pub fn victory_rate(&self) -> f64 {
        self.per_battle(self.victories)
    }

    /// Draw rate (0.0-1.0).
    #[must_use]
    pub fn draw_rate(&self) -> f64 {
        self.per_battle(self.draws)
    }

    /// Defeat rate (0.0-1.0).
    #[must_use]
    pub fn defeat_rate(&self) -> f64 {
        self.per_battle(self.defeats)
    }

    /// Average crowns taken.
    #[must_use]
    pub fn avg_crowns(&self) -> f64 {
        self.per_battle(self.crowns)
    }

    /// Average crowns conceded.
    #[must_use]
    pub fn avg_crowns_lost(&self) -> f64 {
        self.per_battle(self.crowns_lost)
    }

    /// Average battle length in seconds.
    #[must_use]
    pub fn avg_duration_secs(&self) -> f64 {
        self.per_battle(self.total_duration_ms) / 1000.0
    }

    /// Average gold per battle.
    #[must_use]
    pub fn avg_gold(&self) -> f64 {
        self.per_battle(self.total_gold)
    }
}

/// Run `battles` battles with seeds `base_seed..base_seed + battles` in
/// parallel.
///
/// # Errors
///
/// `NoBattles` for an empty run, or the first battle error met.
pub fn run_tournament(
    base_seed: u64,
    battles: u64,
    pilot: PilotKind,
    setup: &BattleSetup,
) -> Result<TournamentStats, TournamentError> {
    run_tournament_with(base_seed, battles, pilot, setup, |_| {})
}

/// [`run_tournament`] with a callback after every finished battle, for
/// progress reporting. The callback runs on worker threads.
///
/// # Errors
///
/// Same as [`run_tournament`].
pub fn run_tournament_with<F>(
    base_seed: u64,
    battles: u64,
    pilot: PilotKind,
    setup: &BattleSetup,
    on_battle: F,
) -> Result<TournamentStats, TournamentError>
where
    F: Fn(&BattleOutcome) + Sync,
{
    if battles == 0 {
        return Err(TournamentError::NoBattles);
    }
    info!(base_seed, battles, %pilot, "tournament started");

    // Each worker folds into its own stats; partials merge at the end
    let stats = (0..battles)
        .into_par_iter()
        .map(|i| {
            let outcome = run_battle(base_seed.wrapping_add(i), pilot, setup)?;
            on_battle(&outcome);
            Ok(outcome)
        })
        .try_fold(TournamentStats::default, |mut local, outcome: Result<_, TournamentError>| {
            local.add(&outcome?);
            Ok(local)
        })
        .try_reduce(TournamentStats::default, |mut a, b| {
            a.merge(&b);
            Ok(a)
        })?;

    info!(
        battles = stats.battles,
        victory_rate = stats.victory_rate(),
        "tournament finished"
    );
    Ok(stats)
}
