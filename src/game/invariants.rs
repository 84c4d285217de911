//! Battle invariants - sanity checks that detect bugs.
//!
//! These should never fire for a battle driven through its public
//! operations. They are bug detectors, not gameplay rules.

use std::collections::HashSet;

use tracing::warn;

use crate::game::{Battle, Faction, TowerKind};

/// Invariant violation error.
#[derive(Debug, Clone)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub message: String,
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invariant violation: {}", self.message)
    }
}

impl std::error::Error for InvariantViolation {}

fn violation(message: String) -> InvariantViolation {
    InvariantViolation { message }
}

/// Check all battle invariants.
///
/// Returns a list of violations found, or empty if all invariants hold.
#[must_use]
pub fn check_invariants(battle: &Battle) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();
    let field = battle.field();

    // Unit bookkeeping
    let mut seen = HashSet::new();
    for faction in Faction::ALL {
        for &id in field.live_ids(faction) {
            if !seen.insert(id) {
                violations.push(violation(format!("Unit {id} listed twice")));
            }
            let Some(unit) = field.unit(id) else {
                violations.push(violation(format!("Unit {id} is live but has no slot")));
                continue;
            };
            if unit.faction != faction {
                violations.push(violation(format!(
                    "Unit {id} is {} but listed under {faction}",
                    unit.faction
                )));
            }
            let v = &unit.vitals;
            if v.health() > v.max_health() {
                violations.push(violation(format!(
                    "Unit {id} health {} exceeds max {}",
                    v.health(),
                    v.max_health()
                )));
            }
            if v.is_destroyed() != (v.health() == 0) {
                violations.push(violation(format!(
                    "Unit {id} destroyed flag {} disagrees with health {}",
                    v.is_destroyed(),
                    v.health()
                )));
            }
            let m = &unit.modifiers;
            if !(0.0..=1.0).contains(&m.damage_reduction) {
                violations.push(violation(format!(
                    "Unit {id} damage reduction {} outside [0, 1]",
                    m.damage_reduction
                )));
            }
            if !(m.attack_speed_multiplier > 0.0) {
                violations.push(violation(format!(
                    "Unit {id} attack speed multiplier {} not positive",
                    m.attack_speed_multiplier
                )));
            }
        }
    }

    // Tower bookkeeping
    for faction in Faction::ALL {
        let kinds: Vec<TowerKind> = field.towers_of(faction).map(|t| t.kind).collect();
        if kinds != TowerKind::ALL {
            violations.push(violation(format!("{faction} towers are {kinds:?}")));
        }
    }
    for tower in field.towers() {
        let v = &tower.vitals;
        if v.health() > v.max_health() || v.is_destroyed() != (v.health() == 0) {
            violations.push(violation(format!(
                "Tower {:?} has health {}/{} destroyed={}",
                tower.id,
                v.health(),
                v.max_health(),
                v.is_destroyed()
            )));
        }
    }

    // Ability trackers belong to units still in the table
    for (id, tracker) in battle.abilities().tracked() {
        if field.unit(id).is_none() {
            violations.push(violation(format!("Ability tracker for reaped unit {id}")));
        }
        if let Some(live) = &tracker.live
            && live.duration_ms == 0
        {
            violations.push(violation(format!("Unit {id} holds a live instant ability")));
        }
    }

    // Economy
    let elixir = battle.elixir();
    if elixir.current() > elixir.capacity() {
        violations.push(violation(format!(
            "Elixir {} exceeds capacity {}",
            elixir.current(),
            elixir.capacity()
        )));
    }
    if elixir.last_regen_at() > battle.now() {
        violations.push(violation(format!(
            "Elixir regen stamp {} is in the future (now {})",
            elixir.last_regen_at(),
            battle.now()
        )));
    }

    // Clock and score
    let clock = battle.clock();
    if clock.elapsed_ms() > clock.duration_ms() {
        violations.push(violation(format!(
            "Elapsed {} exceeds duration {}",
            clock.elapsed_ms(),
            clock.duration_ms()
        )));
    }
    let (player_crowns, enemy_crowns) = battle.crowns();
    if player_crowns > field.destroyed_towers(Faction::Enemy)
        || enemy_crowns > field.destroyed_towers(Faction::Player)
    {
        violations.push(violation(format!(
            "Crowns {player_crowns}-{enemy_crowns} exceed destroyed towers"
        )));
    }
    if battle.is_over() && !battle.schedule().is_empty() {
        violations.push(violation(format!(
            "Battle over with {} scheduled actions pending",
            battle.schedule().len()
        )));
    }

    for v in &violations {
        warn!(message = %v.message, "invariant violated");
    }

    violations
}

/// Assert all battle invariants hold, panicking if any are violated.
///
/// Only active in debug builds. No-op in release builds.
///
/// # Panics
///
/// Panics with detailed message if any invariant is violated.
#[cfg(debug_assertions)]
pub fn assert_invariants(battle: &Battle) {
    let violations = check_invariants(battle);
    if !violations.is_empty() {
        let messages: Vec<_> = violations.iter().map(|v| v.message.as_str()).collect();
        panic!("Battle invariant violations:\n  - {}", messages.join("\n  - "));
    }
}

/// No-op in release builds.
#[cfg(not(debug_assertions))]
pub fn assert_invariants(_battle: &Battle) {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BattleConfig, BattleSetup};
    use crate::game::{Lane, Position};

    fn busy_battle() -> Battle {
        let mut battle = Battle::new(&BattleSetup::standard().unwrap(), 9);
        battle.deploy("doge-warrior", Lane::Left).unwrap();
        for _ in 0..100 {
            battle.tick(100);
        }
        battle
    }

    #[test]
    fn test_valid_battle_passes() {
        let battle = busy_battle();
        let violations = check_invariants(&battle);
        assert!(violations.is_empty(), "{violations:?}");
    }

    #[test]
    fn test_finished_battle_passes() {
        let mut config = BattleConfig::default();
        config.battle.duration_ms = 3_000;
        let mut battle = Battle::new(&BattleSetup::from_config(config).unwrap(), 4);
        battle.run_to_end();
        assert!(check_invariants(&battle).is_empty());
    }

    #[test]
    fn test_faction_mismatch_detected() {
        let mut battle = busy_battle();
        let id = battle
            .spawn_at(Faction::Player, "shiba-tank", Position::new(0.0, -15.0))
            .unwrap();
        battle.field_mut().unit_mut(id).unwrap().faction = Faction::Enemy;

        let violations = check_invariants(&battle);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("listed under"));
    }

    #[test]
    fn test_bad_modifiers_detected() {
        let mut battle = busy_battle();
        let id = battle
            .spawn_at(Faction::Player, "shiba-tank", Position::new(0.0, -15.0))
            .unwrap();
        let unit = battle.field_mut().unit_mut(id).unwrap();
        unit.modifiers.damage_reduction = 1.5;
        unit.modifiers.attack_speed_multiplier = 0.0;

        let violations = check_invariants(&battle);
        assert_eq!(violations.len(), 2, "{violations:?}");
    }

    #[test]
    fn test_reduction_exactly_one_passes() {
        let mut battle = busy_battle();
        let id = battle
            .spawn_at(Faction::Player, "shiba-tank", Position::new(0.0, -15.0))
            .unwrap();
        battle.field_mut().unit_mut(id).unwrap().modifiers.damage_reduction = 1.0;
        assert!(check_invariants(&battle).is_empty());
    }
}
