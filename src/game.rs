//! Battle simulation.
//!
//! Implements the rules of a two-lane tower battle:
//! - Arena geometry, lanes and deploy zones
//! - Units and towers with health, targeting and attack cooldowns
//! - Special abilities with cooldowns, durations and timed pulses
//! - Elixir economy, card hand and a seeded enemy spawner
//! - A fixed-order tick that ends on a king tower or the clock

mod ability;
mod ai;
mod arena;
mod catalog;
mod clock;
pub mod combat;
mod command;
mod deck;
mod economy;
mod effects;
mod entity;
pub mod events;
mod field;
mod invariants;
mod schedule;
mod snapshot;
mod state;
mod tower;
mod unit;

pub use ability::{
    AbilityContext, AbilityDef, AbilityEffect, AbilityEngine, AbilityHooks, AbilityInstance,
    AbilitySpec, AbilityTracker, ActivateHook, CastSnapshot, EndHook, UpdateHook,
};
pub use ai::{EnemyAi, EnemyAiConfig, SpawnOrder};
pub use arena::{ArenaConfig, Faction, Lane, Position};
pub use catalog::{default_troops, Archetype, Catalog, TroopDef};
pub use clock::BattleClock;
pub use command::Command;
pub use deck::{Deck, HAND_SIZE};
pub use economy::{Elixir, ElixirConfig};
pub use entity::{effective_damage, DamageOutcome, Entity, EntityRef, TowerId, UnitId, Vitals};
pub use events::{BattleEvent, BattleEventKind, EventLog};
pub use field::Battlefield;
pub use invariants::{assert_invariants, check_invariants, InvariantViolation};
pub use schedule::{Schedule, ScheduledAction};
pub use snapshot::{BattleSnapshot, TowerView, UnitView};
pub use state::{Battle, BattleResult, BattleSummary, EndReason};
pub use tower::{Tower, TowerConfig, TowerKind, TowerStats};
pub use unit::{Modifiers, Unit, UnitState};
