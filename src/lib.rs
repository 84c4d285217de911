// Allow unwrap and unreadable literals in tests (test code is not production)
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::unreadable_literal))]
//! Crownfall: a deterministic, tick-driven lane battle simulation.
//!
//! This crate provides the battle core of a two-lane tower game:
//! - Fixed-order ticks that are bit-exact for a given seed and input stream
//! - Units, towers and special abilities resolved in one place
//! - Recordings that replay by re-simulation
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │   CLI / TUI / Tournament / Replay   │
//! ├─────────────────────────────────────┤
//! │      Battle orchestrator (tick)     │
//! ├─────────────────────────────────────┤
//! │  Field · Abilities · Elixir · AI    │
//! └─────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod game;
pub mod replay;
pub mod telemetry;
pub mod tournament;

pub use config::{BattleConfig, BattleSetup};
pub use error::{ActionError, ActionResult, ConfigError};

// Re-export key game types at crate root for convenience
pub use game::{
    Battle, BattleEvent, BattleEventKind, BattleResult, BattleSnapshot, BattleSummary, Command,
    Faction, Lane, Position, UnitId,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_battle() {
        let setup = BattleSetup::standard().unwrap();
        let mut a = Battle::new(&setup, 77);
        let mut b = Battle::new(&setup, 77);
        a.run_to_end();
        b.run_to_end();
        assert_eq!(a.snapshot(), b.snapshot());
        assert_eq!(a.events(), b.events());
    }
}
