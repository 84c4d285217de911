//! The battle orchestrator.
//!
//! One [`Battle::tick`] runs a fixed sequence:
//!
//! 1. advance the clock, then regenerate elixir at the new time;
//! 2. if time ran out, end the battle on crowns and stop;
//! 3. run scheduled actions (enemy spawns, ability beats);
//! 4. update player units, enemy units, then towers;
//! 5. reap destroyed units and release their ability state;
//! 6. advance live abilities;
//! 7. recount crowns and end the battle if a king tower fell.
//!
//! Reordering these steps changes observable behaviour. Once ended, a battle
//! never changes again.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{BattleConfig, BattleSetup};
use crate::error::{ActionError, ActionResult};
use crate::game::combat::resolve_strike;
use crate::game::{
    AbilityContext, AbilityEngine, BattleClock, BattleEvent, BattleEventKind, BattleSnapshot,
    Battlefield, Catalog, Command, Deck, Elixir, EnemyAi, EventLog, Faction, Lane, Position,
    Schedule, ScheduledAction, UnitId,
};

/// Outcome from the player's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BattleResult {
    /// The enemy lost.
    Victory,
    /// The player lost.
    Defeat,
    /// Neither side won.
    Draw,
}

impl std::fmt::Display for BattleResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Victory => write!(f, "victory"),
            Self::Defeat => write!(f, "defeat"),
            Self::Draw => write!(f, "draw"),
        }
    }
}

/// Why the battle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// A king tower fell.
    KingTower,
    /// The clock ran out.
    TimeUp,
}

/// End-of-battle report for persistence collaborators. Emitted once.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BattleSummary {
    /// Outcome for the player.
    pub result: BattleResult,
    /// What ended it.
    pub reason: EndReason,
    /// Enemy towers destroyed (player crowns).
    pub towers_destroyed: u32,
    /// Player towers lost (enemy crowns).
    pub towers_lost: u32,
    /// Battle time when it ended.
    pub duration_ms: u64,
    /// Gold awarded.
    pub gold_earned: u32,
}

impl BattleSummary {
    /// Duration in whole seconds.
    #[must_use]
    pub const fn duration_secs(&self) -> u64 {
        self.duration_ms / 1000
    }
}

/// A running or finished battle.
#[derive(Debug, Clone)]
pub struct Battle {
    setup: BattleSetup,
    seed: u64,
    ticks: u64,
    clock: BattleClock,
    elixir: Elixir,
    deck: Deck,
    field: Battlefield,
    abilities: AbilityEngine,
    schedule: Schedule,
    ai: EnemyAi,
    events: EventLog,
    player_crowns: u32,
    enemy_crowns: u32,
    outcome: Option<BattleSummary>,
}

impl Battle {
    /// Start a battle. The seed fixes the enemy's behaviour.
    #[must_use]
    pub fn new(setup: &BattleSetup, seed: u64) -> Self {
        let config = &setup.config;
        let mut ai = EnemyAi::new(config.enemy_ai, seed);
        let mut schedule = Schedule::default();
        if ai.enabled() {
            schedule.at(ai.next_delay(), ScheduledAction::EnemySpawn);
        }
        info!(seed, duration_ms = config.battle.duration_ms, "battle started");

        Self {
            setup: setup.clone(),
            seed,
            ticks: 0,
            clock: BattleClock::new(config.battle.duration_ms),
            elixir: Elixir::new(&config.elixir, 0),
            deck: Deck::new(&config.deck),
            field: Battlefield::new(config.arena, &config.towers),
            abilities: AbilityEngine::default(),
            schedule,
            ai,
            events: EventLog::default(),
            player_crowns: 0,
            enemy_crowns: 0,
            outcome: None,
        }
    }

    /// Advance the simulation by `dt_ms`. No-op once the battle has ended.
    pub fn tick(&mut self, dt_ms: u64) {
        if self.outcome.is_some() {
            return;
        }
        self.ticks += 1;

        let now = self.clock.advance(dt_ms);
        self.elixir.regenerate(now);
        if self.clock.expired() {
            self.finish(EndReason::TimeUp);
            return;
        }

        self.run_schedule(now);
        self.update_units(dt_ms, now);
        self.update_towers(dt_ms, now);

        let reaped = self.field.reap();
        let mut ctx = AbilityContext {
            field: &mut self.field,
            events: &mut self.events,
            schedule: &mut self.schedule,
            now,
        };
        for id in reaped {
            self.abilities.cleanup(id, &mut ctx);
        }
        self.abilities.advance(dt_ms, &mut ctx);

        self.player_crowns = self.field.destroyed_towers(Faction::Enemy);
        self.enemy_crowns = self.field.destroyed_towers(Faction::Player);
        if self.field.king_destroyed(Faction::Player) || self.field.king_destroyed(Faction::Enemy) {
            self.finish(EndReason::KingTower);
        }
    }

    /// Tick with the configured headless tick length until the battle ends.
    /// The returned summary is always present.
    pub fn run_to_end(&mut self) -> Option<&BattleSummary> {
        let dt = self.setup.config.battle.tick_ms.max(1);
        while self.outcome.is_none() {
            self.tick(dt);
        }
        self.outcome.as_ref()
    }

    /// Deploy a card from hand into a lane.
    ///
    /// # Errors
    ///
    /// `BattleOver`, `UnknownArchetype`, `CardNotInHand` or
    /// `InsufficientElixir`. Nothing changes on error.
    pub fn deploy(&mut self, card: &str, lane: Lane) -> ActionResult<UnitId> {
        self.ensure_running()?;
        let catalog = Arc::clone(&self.setup.catalog);
        let Some(archetype) = catalog.get(card) else {
            debug!(card, "deploy rejected: unknown archetype");
            return Err(ActionError::UnknownArchetype(card.to_string()));
        };
        self.deck.check(card)?;
        if let Err(e) = self.elixir.spend(archetype.troop.cost) {
            debug!(card, %e, "deploy rejected");
            return Err(e);
        }
        self.deck.play(card)?;

        let now = self.now();
        let position = self.field.arena().spawn_point(Faction::Player, lane);
        let id = self.field.spawn(&archetype.troop, Faction::Player, position, now);
        self.record_deploy(id, Faction::Player, card, lane, position);
        debug!(card, ?lane, unit = id.0, at_ms = now, "deployed");
        Ok(id)
    }

    /// Deploy a card at a clicked position, snapped to the nearest lane.
    ///
    /// # Errors
    ///
    /// `InvalidDeployPosition` for positions past the player's half, plus
    /// everything [`Self::deploy`] rejects.
    pub fn deploy_at(&mut self, card: &str, x: f32, z: f32) -> ActionResult<UnitId> {
        self.ensure_running()?;
        let arena = self.field.arena();
        if !(x.is_finite() && z.is_finite()) || !arena.player_may_deploy_at(z) {
            debug!(card, x, z, "deploy rejected: position");
            return Err(ActionError::InvalidDeployPosition { x, z });
        }
        let lane = arena.nearest_lane(x);
        self.deploy(card, lane)
    }

    /// Place a unit directly, without paying elixir or cycling the deck.
    /// Used by scripted scenarios and tests.
    ///
    /// # Errors
    ///
    /// `BattleOver` or `UnknownArchetype`.
    pub fn spawn_at(&mut self, faction: Faction, archetype: &str, position: Position) -> ActionResult<UnitId> {
        self.ensure_running()?;
        let catalog = Arc::clone(&self.setup.catalog);
        let troop = &catalog
            .get(archetype)
            .ok_or_else(|| ActionError::UnknownArchetype(archetype.to_string()))?
            .troop;
        let id = self.field.spawn(troop, faction, position, self.now());
        let lane = self.field.arena().nearest_lane(position.x);
        self.record_deploy(id, faction, archetype, lane, position);
        Ok(id)
    }

    /// Trigger a live unit's special ability.
    ///
    /// # Errors
    ///
    /// `BattleOver`, `UnknownUnit`, `NoAbility`, `AbilityActive` or
    /// `AbilityOnCooldown`. Nothing changes on error.
    pub fn use_ability(&mut self, unit: UnitId) -> ActionResult<()> {
        self.ensure_running()?;
        let catalog = Arc::clone(&self.setup.catalog);
        let archetype = self
            .field
            .live_unit(unit)
            .map(|u| u.archetype.clone())
            .ok_or(ActionError::UnknownUnit(unit.0))?;
        let spec = catalog
            .get(&archetype)
            .and_then(|a| a.ability.as_ref())
            .ok_or(ActionError::NoAbility(unit.0))?;

        let now = self.now();
        let mut ctx = AbilityContext {
            field: &mut self.field,
            events: &mut self.events,
            schedule: &mut self.schedule,
            now,
        };
        let result = self.abilities.use_ability(unit, spec, &mut ctx);
        if let Err(e) = &result {
            debug!(unit = unit.0, %e, "ability rejected");
        }
        result
    }

    /// Apply a recorded or live player command.
    ///
    /// # Errors
    ///
    /// Whatever the underlying action rejects.
    pub fn apply(&mut self, command: &Command) -> ActionResult<()> {
        match command {
            Command::Deploy { card, lane } => self.deploy(card, *lane).map(|_| ()),
            Command::DeployAt { card, x, z } => self.deploy_at(card, *x, *z).map(|_| ()),
            Command::UseAbility { unit } => self.use_ability(*unit),
        }
    }

    /// Take every event produced since the last drain.
    pub fn drain_events(&mut self) -> Vec<BattleEvent> {
        self.events.drain()
    }

    /// Events buffered since the last drain.
    #[must_use]
    pub fn events(&self) -> &[BattleEvent] {
        self.events.as_slice()
    }

    /// A serializable view of every entity.
    #[must_use]
    pub fn snapshot(&self) -> BattleSnapshot {
        BattleSnapshot::capture(self)
    }

    /// Battle time in milliseconds.
    #[must_use]
    pub const fn now(&self) -> u64 {
        self.clock.elapsed_ms()
    }

    /// The battle clock.
    #[must_use]
    pub const fn clock(&self) -> &BattleClock {
        &self.clock
    }

    /// Ticks run so far.
    #[must_use]
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }

    /// The enemy seed.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Configuration in use.
    #[must_use]
    pub fn config(&self) -> &BattleConfig {
        &self.setup.config
    }

    /// Troop catalog in use.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.setup.catalog
    }

    /// The player's elixir bar.
    #[must_use]
    pub const fn elixir(&self) -> &Elixir {
        &self.elixir
    }

    /// The player's hand and queue.
    #[must_use]
    pub const fn deck(&self) -> &Deck {
        &self.deck
    }

    /// All combat actors.
    #[must_use]
    pub const fn field(&self) -> &Battlefield {
        &self.field
    }

    #[cfg(test)]
    pub(crate) fn field_mut(&mut self) -> &mut Battlefield {
        &mut self.field
    }

    /// Ability trackers.
    #[must_use]
    pub const fn abilities(&self) -> &AbilityEngine {
        &self.abilities
    }

    /// Pending scheduled actions.
    #[must_use]
    pub const fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// `(player crowns, enemy crowns)`.
    #[must_use]
    pub const fn crowns(&self) -> (u32, u32) {
        (self.player_crowns, self.enemy_crowns)
    }

    /// The final summary, once ended.
    #[must_use]
    pub const fn outcome(&self) -> Option<&BattleSummary> {
        self.outcome.as_ref()
    }

    /// Whether the battle has ended.
    #[must_use]
    pub const fn is_over(&self) -> bool {
        self.outcome.is_some()
    }

    fn ensure_running(&self) -> ActionResult<()> {
        if self.outcome.is_some() {
            Err(ActionError::BattleOver)
        } else {
            Ok(())
        }
    }

    fn record_deploy(&mut self, unit: UnitId, faction: Faction, archetype: &str, lane: Lane, position: Position) {
        self.events.push(
            self.clock.elapsed_ms(),
            BattleEventKind::UnitDeployed {
                unit,
                faction,
                archetype: archetype.to_string(),
                lane,
                position,
            },
        );
    }

    fn run_schedule(&mut self, now: u64) {
        for (_, action) in self.schedule.pop_due(now) {
            match action {
                ScheduledAction::EnemySpawn => self.spawn_enemy(now),
                ScheduledAction::EffectBeat {
                    unit,
                    ability,
                    beat,
                    position,
                } => self.events.push(
                    now,
                    BattleEventKind::EffectBeat {
                        unit,
                        ability,
                        beat,
                        position,
                    },
                ),
            }
        }
    }

    fn spawn_enemy(&mut self, now: u64) {
        let catalog = Arc::clone(&self.setup.catalog);
        if let Some(order) = self.ai.choose(&catalog)
            && let Some(archetype) = catalog.get(&order.archetype)
        {
            let position = self.field.arena().spawn_point(Faction::Enemy, order.lane);
            let id = self.field.spawn(&archetype.troop, Faction::Enemy, position, now);
            self.record_deploy(id, Faction::Enemy, &order.archetype, order.lane, position);
            debug!(archetype = %order.archetype, lane = ?order.lane, unit = id.0, at_ms = now, "enemy spawned");
        }
        let next = now.saturating_add(self.ai.next_delay());
        self.schedule.at(next, ScheduledAction::EnemySpawn);
    }

    fn update_units(&mut self, dt_ms: u64, now: u64) {
        for faction in Faction::ALL {
            let ids = self.field.live_ids(faction).to_vec();
            for id in ids {
                let Some(mut unit) = self.field.take(id) else {
                    continue;
                };
                let strike = unit.update(dt_ms, &self.field);
                self.field.restore(unit);
                if let Some(strike) = strike {
                    resolve_strike(&mut self.field, &mut self.events, now, strike);
                }
            }
        }
    }

    fn update_towers(&mut self, dt_ms: u64, now: u64) {
        for i in 0..self.field.towers().len() {
            let mut tower = self.field.towers()[i];
            let strike = tower.update(dt_ms, &self.field);
            self.field.towers_mut()[i] = tower;
            if let Some(strike) = strike {
                resolve_strike(&mut self.field, &mut self.events, now, strike);
            }
        }
    }

    fn finish(&mut self, reason: EndReason) {
        let player_king = self.field.king_destroyed(Faction::Player);
        let enemy_king = self.field.king_destroyed(Faction::Enemy);
        self.player_crowns = self.field.destroyed_towers(Faction::Enemy);
        self.enemy_crowns = self.field.destroyed_towers(Faction::Player);

        let result = match reason {
            EndReason::KingTower => match (enemy_king, player_king) {
                (true, false) => BattleResult::Victory,
                (false, true) => BattleResult::Defeat,
                _ => BattleResult::Draw,
            },
            EndReason::TimeUp => match self.player_crowns.cmp(&self.enemy_crowns) {
                std::cmp::Ordering::Greater => BattleResult::Victory,
                std::cmp::Ordering::Less => BattleResult::Defeat,
                std::cmp::Ordering::Equal => BattleResult::Draw,
            },
        };

        let summary = BattleSummary {
            result,
            reason,
            towers_destroyed: self.player_crowns,
            towers_lost: self.enemy_crowns,
            duration_ms: self.clock.elapsed_ms(),
            gold_earned: self.setup.config.rewards.gold(result, self.player_crowns),
        };
        info!(
            %result,
            ?reason,
            crowns = self.player_crowns,
            lost = self.enemy_crowns,
            at_ms = summary.duration_ms,
            "battle ended"
        );

        self.schedule.clear();
        self.events.push(
            summary.duration_ms,
            BattleEventKind::BattleEnded {
                summary: summary.clone(),
            },
        );
        self.outcome = Some(summary);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{EntityRef, TowerKind, UnitState};

    fn quiet_setup() -> BattleSetup {
        let mut config = BattleConfig::default();
        config.enemy_ai.enabled = false;
        BattleSetup::from_config(config).unwrap()
    }

    #[test]
    fn test_new_battle_state() {
        let battle = Battle::new(&BattleSetup::standard().unwrap(), 1);
        assert_eq!(battle.now(), 0);
        assert_eq!(battle.elixir().current(), 5);
        assert_eq!(battle.deck().hand().len(), 4);
        assert!(battle.schedule().has_enemy_spawn());
        assert_eq!(battle.crowns(), (0, 0));
        assert!(!battle.is_over());
    }

    #[test]
    fn test_deploy_spends_and_cycles() {
        let mut battle = Battle::new(&quiet_setup(), 1);
        let id = battle.deploy("doge-warrior", Lane::Left).unwrap();
        assert_eq!(battle.elixir().current(), 2);
        assert!(!battle.deck().holds("doge-warrior"));
        assert!(battle.deck().holds("laser-punk"));
        let unit = battle.field().unit(id).unwrap();
        assert!((unit.position.z + 18.0).abs() < 1e-6);
        assert!((unit.position.x + 8.0).abs() < 1e-6);
    }

    #[test]
    fn test_rejected_deploy_changes_nothing() {
        let mut battle = Battle::new(&quiet_setup(), 1);
        assert_eq!(
            battle.deploy("dragon", Lane::Left),
            Err(ActionError::UnknownArchetype("dragon".into()))
        );
        assert_eq!(
            battle.deploy("pepe-mage", Lane::Left),
            Err(ActionError::CardNotInHand("pepe-mage".into()))
        );
        assert_eq!(
            battle.deploy("shiba-tank", Lane::Right).map(|_| ()),
            Ok(())
        );
        assert_eq!(
            battle.deploy("bitcoin-knight", Lane::Right),
            Err(ActionError::InsufficientElixir {
                required: 4,
                available: 0
            })
        );
        assert_eq!(battle.field().spawned(), 1);
        assert!(battle.deck().holds("bitcoin-knight"));
    }

    #[test]
    fn test_deploy_at_snaps_and_limits() {
        let mut battle = Battle::new(&quiet_setup(), 1);
        assert!(matches!(
            battle.deploy_at("doge-warrior", 3.0, 5.0),
            Err(ActionError::InvalidDeployPosition { .. })
        ));
        let id = battle.deploy_at("doge-warrior", 3.0, -6.0).unwrap();
        let unit = battle.field().unit(id).unwrap();
        assert!((unit.position.x - 8.0).abs() < 1e-6);
    }

    #[test]
    fn test_elixir_regenerates_with_ticks() {
        let mut battle = Battle::new(&quiet_setup(), 1);
        for _ in 0..28 {
            battle.tick(100);
        }
        assert_eq!(battle.elixir().current(), 7);
    }

    #[test]
    fn test_enemy_spawns_on_schedule() {
        let mut battle = Battle::new(&BattleSetup::standard().unwrap(), 3);
        for _ in 0..(5200 / 100) {
            battle.tick(100);
        }
        assert_eq!(battle.field().live_ids(Faction::Enemy).len(), 1);
        let spawned = battle
            .drain_events()
            .into_iter()
            .filter(|e| {
                matches!(
                    e.kind,
                    BattleEventKind::UnitDeployed {
                        faction: Faction::Enemy,
                        ..
                    }
                )
            })
            .count();
        assert_eq!(spawned, 1);
    }

    #[test]
    fn test_time_up_draw_and_frozen() {
        let mut config = BattleConfig::default();
        config.enemy_ai.enabled = false;
        config.battle.duration_ms = 1000;
        let mut battle = Battle::new(&BattleSetup::from_config(config).unwrap(), 0);
        battle.deploy("doge-warrior", Lane::Left).unwrap();
        for _ in 0..20 {
            battle.tick(100);
        }
        let summary = battle.outcome().unwrap().clone();
        assert_eq!(summary.result, BattleResult::Draw);
        assert_eq!(summary.reason, EndReason::TimeUp);
        assert_eq!(summary.duration_ms, 1000);
        assert_eq!(summary.gold_earned, 50);
        assert_eq!(battle.ticks(), 10);

        let before = battle.snapshot();
        battle.tick(100);
        assert_eq!(battle.snapshot(), before);
        assert_eq!(battle.deploy("bitcoin-knight", Lane::Left), Err(ActionError::BattleOver));
    }

    #[test]
    fn test_king_destroyed_ends_with_defeat() {
        let mut battle = Battle::new(&quiet_setup(), 0);
        let king = battle
            .field()
            .tower_at(Faction::Player, TowerKind::King)
            .unwrap()
            .id;
        battle.field.apply_damage(EntityRef::Tower(king), 5000.0);
        battle.tick(50);
        let summary = battle.outcome().unwrap();
        assert_eq!(summary.result, BattleResult::Defeat);
        assert_eq!(summary.reason, EndReason::KingTower);
        assert_eq!(summary.towers_lost, 1);
        assert!(battle.now() < 1000);
    }

    #[test]
    fn test_use_ability_errors() {
        let mut battle = Battle::new(&quiet_setup(), 0);
        assert_eq!(battle.use_ability(UnitId(9)), Err(ActionError::UnknownUnit(9)));

        let mut config = BattleConfig::default();
        config.enemy_ai.enabled = false;
        config.troops[0].ability = None;
        let mut battle = Battle::new(&BattleSetup::from_config(config).unwrap(), 0);
        let id = battle.deploy("doge-warrior", Lane::Left).unwrap();
        assert_eq!(battle.use_ability(id), Err(ActionError::NoAbility(id.0)));
    }

    #[test]
    fn test_units_meet_and_fight() {
        let mut battle = Battle::new(&quiet_setup(), 0);
        let ours = battle
            .spawn_at(Faction::Player, "doge-warrior", Position::new(-8.0, -1.0))
            .unwrap();
        let theirs = battle
            .spawn_at(Faction::Enemy, "doge-warrior", Position::new(-8.0, 1.0))
            .unwrap();
        battle.tick(100);
        assert_eq!(battle.field().unit(ours).unwrap().state, UnitState::Attacking);
        assert_eq!(battle.field().unit(ours).unwrap().target, Some(EntityRef::Unit(theirs)));

        for _ in 0..94 {
            battle.tick(100);
        }
        // Player units update first, so the player's ninth hit lands before
        // the enemy's ninth.
        assert!(battle.field().unit(theirs).is_none());
        let survivor = battle.field().unit(ours).unwrap();
        assert_eq!(survivor.vitals.health(), 60);
        assert_eq!(survivor.state, UnitState::Walking);
    }

    #[test]
    fn test_run_to_end() {
        let mut config = BattleConfig::default();
        config.battle.duration_ms = 5_000;
        let setup = BattleSetup::from_config(config).unwrap();
        let mut battle = Battle::new(&setup, 11);
        let summary = battle.run_to_end().unwrap().clone();
        assert!(battle.is_over());
        assert_eq!(summary.duration_ms, 5_000);
        assert!(battle.schedule().is_empty());
    }
}
