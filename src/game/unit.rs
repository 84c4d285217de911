//! Mobile combat units and their per-tick state machine.

use serde::{Deserialize, Serialize};

use crate::game::combat::{self, Strike};
use crate::game::{ArenaConfig, Battlefield, Entity, EntityRef, Faction, Position, TroopDef, UnitId, Vitals};

/// What a unit is doing this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitState {
    /// No target in reach; advancing.
    #[default]
    Walking,
    /// Locked onto a target in reach.
    Attacking,
}

/// Transient modifiers written by abilities and reset when they end.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Modifiers {
    /// Multiplies the attack interval; below 1 attacks faster.
    pub attack_speed_multiplier: f32,
    /// Fraction of incoming damage ignored.
    pub damage_reduction: f32,
    /// Empowered shots left.
    pub pierce_shots_remaining: u32,
    /// Damage multiplier while empowered shots remain.
    pub pierce_damage_multiplier: f32,
}

impl Default for Modifiers {
    fn default() -> Self {
        Self {
            attack_speed_multiplier: 1.0,
            damage_reduction: 0.0,
            pierce_shots_remaining: 0,
            pierce_damage_multiplier: 1.0,
        }
    }
}

/// A deployed troop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    /// Stable identifier.
    pub id: UnitId,
    /// Archetype key in the catalog.
    pub archetype: String,
    /// Owning side.
    pub faction: Faction,
    /// Current location.
    pub position: Position,
    /// Health.
    pub vitals: Vitals,
    /// Damage per attack before modifiers.
    pub damage: f32,
    /// Advance speed per second.
    pub speed: f32,
    /// Attack range.
    pub attack_range: f32,
    /// Base milliseconds between attacks.
    pub attack_interval_ms: f32,
    /// Milliseconds until the next attack may land.
    pub attack_cooldown_ms: f32,
    /// Current target, re-validated every tick.
    pub target: Option<EntityRef>,
    /// Walking or attacking.
    pub state: UnitState,
    /// Stunned units skip targeting, movement and attacks.
    pub stunned: bool,
    /// Ability-driven modifiers.
    pub modifiers: Modifiers,
    /// Battle time of the spawn.
    pub spawned_at: u64,
}

impl Unit {
    /// Create a unit from an archetype.
    #[must_use]
    pub fn spawn(id: UnitId, troop: &TroopDef, faction: Faction, position: Position, now: u64) -> Self {
        Self {
            id,
            archetype: troop.id.clone(),
            faction,
            position,
            vitals: Vitals::new(troop.hp),
            damage: troop.damage,
            speed: troop.speed,
            attack_range: troop.attack_range,
            attack_interval_ms: troop.attack_interval_ms(),
            attack_cooldown_ms: 0.0,
            target: None,
            state: UnitState::Walking,
            stunned: false,
            modifiers: Modifiers::default(),
            spawned_at: now,
        }
    }

    /// Handle to this unit.
    #[must_use]
    pub const fn handle(&self) -> EntityRef {
        EntityRef::Unit(self.id)
    }

    /// Attack interval after the speed modifier.
    #[must_use]
    pub fn effective_interval_ms(&self) -> f32 {
        self.attack_interval_ms * self.modifiers.attack_speed_multiplier
    }

    /// Run one tick against the current battlefield.
    ///
    /// The unit must have been taken out of `field` by the caller. Returns
    /// the strike to apply, if the unit attacked.
    #[allow(clippy::cast_precision_loss)]
    pub fn update(&mut self, dt_ms: u64, field: &Battlefield) -> Option<Strike> {
        if !self.vitals.is_alive() || self.stunned {
            return None;
        }

        // A lock holds until its target dies, even once it is out of reach
        let locked = self.target.filter(|&t| field.is_targetable(t));
        self.target = locked.or_else(|| combat::find_target(field, self));

        let Some(target) = self.target.filter(|&t| combat::within_engagement(field, self, t)) else {
            self.state = UnitState::Walking;
            self.advance(dt_ms, field.arena());
            return None;
        };

        let interval = self.effective_interval_ms();
        if self.state == UnitState::Walking {
            self.state = UnitState::Attacking;
            self.attack_cooldown_ms = interval;
        } else {
            self.attack_cooldown_ms -= dt_ms as f32;
        }
        if self.attack_cooldown_ms > 0.0 {
            return None;
        }

        self.attack_cooldown_ms = interval;
        Some(Strike {
            attacker: self.handle(),
            target,
            amount: self.next_shot_damage(),
        })
    }

    /// Damage of the next attack, consuming an empowered shot if any.
    fn next_shot_damage(&mut self) -> f32 {
        if self.modifiers.pierce_shots_remaining == 0 {
            return self.damage;
        }
        let amount = self.damage * self.modifiers.pierce_damage_multiplier;
        self.modifiers.pierce_shots_remaining -= 1;
        if self.modifiers.pierce_shots_remaining == 0 {
            self.modifiers.pierce_damage_multiplier = 1.0;
        }
        amount
    }

    #[allow(clippy::cast_precision_loss)]
    fn advance(&mut self, dt_ms: u64, arena: &ArenaConfig) {
        let step = self.faction.advance_direction() * self.speed * (dt_ms as f32 / 1000.0);
        self.position.z = arena.clamp_advance(self.faction, self.position.z + step);
    }
}

impl Entity for Unit {
    fn vitals(&self) -> &Vitals {
        &self.vitals
    }

    fn vitals_mut(&mut self) -> &mut Vitals {
        &mut self.vitals
    }

    fn position(&self) -> Position {
        self.position
    }

    fn faction(&self) -> Faction {
        self.faction
    }

    fn damage_reduction(&self) -> f32 {
        self.modifiers.damage_reduction
    }
}
