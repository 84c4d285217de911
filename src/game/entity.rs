//! Shared combat actor capabilities: identity handles and health.

use serde::{Deserialize, Serialize};

use crate::game::{Faction, Position};

/// Stable identifier of a unit, assigned at spawn and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitId(pub u32);

impl std::fmt::Display for UnitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Index of a tower in the battlefield's tower table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TowerId(pub u8);

/// A weak handle to any combat actor. Always re-validated on use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum EntityRef {
    /// A unit slot.
    Unit(UnitId),
    /// A tower slot.
    Tower(TowerId),
}

/// Result of one damage application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DamageOutcome {
    /// Health actually removed.
    pub dealt: u32,
    /// Whether this application destroyed the target.
    pub destroyed: bool,
}

/// Health bookkeeping shared by units and towers.
///
/// `health <= max_health` always holds, and `destroyed` flips to true
/// exactly when health reaches zero. It never flips back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vitals {
    health: u32,
    max_health: u32,
    destroyed: bool,
}

impl Vitals {
    /// Full-health vitals. A zero `max_health` is bumped to 1.
    #[must_use]
    pub fn new(max_health: u32) -> Self {
        let max_health = max_health.max(1);
        Self {
            health: max_health,
            max_health,
            destroyed: false,
        }
    }

    /// Current health.
    #[must_use]
    pub const fn health(&self) -> u32 {
        self.health
    }

    /// Maximum health.
    #[must_use]
    pub const fn max_health(&self) -> u32 {
        self.max_health
    }

    /// Whether the entity has been destroyed.
    #[must_use]
    pub const fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Whether the entity may be targeted.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        !self.destroyed && self.health > 0
    }

    /// Health as a fraction of maximum, in `[0, 1]`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn ratio(&self) -> f32 {
        self.health as f32 / self.max_health as f32
    }

    /// Apply `amount` reduced by `reduction` (a fraction in `[0, 1]`).
    ///
    /// Negative or non-finite amounts deal nothing. The effective amount is
    /// rounded to the nearest whole point.
    pub fn apply_damage(&mut self, amount: f32, reduction: f32) -> DamageOutcome {
        if self.destroyed {
            return DamageOutcome::default();
        }
        let effective = effective_damage(amount, reduction);
        let dealt = effective.min(self.health);
        self.health -= dealt;
        let destroyed = self.health == 0;
        if destroyed {
            self.destroyed = true;
        }
        DamageOutcome { dealt, destroyed }
    }

    /// Restore up to `amount` health, capped at maximum. Returns health
    /// restored. Destroyed entities cannot be healed.
    pub fn heal(&mut self, amount: u32) -> u32 {
        if self.destroyed {
            return 0;
        }
        let restored = amount.min(self.max_health - self.health);
        self.health += restored;
        restored
    }
}

/// `amount × (1 − reduction)` rounded, with the inputs sanitised.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn effective_damage(amount: f32, reduction: f32) -> u32 {
    if !amount.is_finite() || amount <= 0.0 {
        return 0;
    }
    let reduction = if reduction.is_finite() {
        reduction.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let scaled = (amount * (1.0 - reduction)).round();
    if scaled >= u32::MAX as f32 {
        u32::MAX
    } else {
        scaled as u32
    }
}

/// Capabilities every combat actor exposes: it is damageable and positioned.
pub trait Entity {
    /// Health state.
    fn vitals(&self) -> &Vitals;

    /// Mutable health state.
    fn vitals_mut(&mut self) -> &mut Vitals;

    /// Current location.
    fn position(&self) -> Position;

    /// Owning side.
    fn faction(&self) -> Faction;

    /// Fraction of incoming damage ignored.
    fn damage_reduction(&self) -> f32 {
        0.0
    }

    /// Apply raw damage through this entity's reduction.
    fn apply_damage(&mut self, amount: f32) -> DamageOutcome {
        let reduction = self.damage_reduction();
        self.vitals_mut().apply_damage(amount, reduction)
    }

    /// Whether this entity may be selected as a target.
    fn is_targetable(&self) -> bool {
        self.vitals().is_alive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_damage_floors_at_zero_and_destroys() {
        let mut v = Vitals::new(100);
        let out = v.apply_damage(60.0, 0.0);
        assert_eq!(out.dealt, 60);
        assert!(!out.destroyed);
        assert_eq!(v.health(), 40);

        let out = v.apply_damage(500.0, 0.0);
        assert_eq!(out.dealt, 40);
        assert!(out.destroyed);
        assert_eq!(v.health(), 0);
        assert!(v.is_destroyed());
    }

    #[test]
    fn test_damage_after_destroyed_is_noop() {
        let mut v = Vitals::new(10);
        v.apply_damage(10.0, 0.0);
        let out = v.apply_damage(10.0, 0.0);
        assert_eq!(out, DamageOutcome::default());
        assert!(v.is_destroyed());
    }

    #[test]
    fn test_damage_reduction_applies_before_subtraction() {
        let mut v = Vitals::new(1000);
        let out = v.apply_damage(400.0, 0.75);
        assert_eq!(out.dealt, 100);
        assert_eq!(v.health(), 900);
    }

    #[test]
    fn test_zero_damage_never_destroys() {
        let mut v = Vitals::new(5);
        let out = v.apply_damage(0.0, 0.0);
        assert_eq!(out.dealt, 0);
        assert!(!v.is_destroyed());
        assert_eq!(effective_damage(-3.0, 0.0), 0);
        assert_eq!(effective_damage(f32::NAN, 0.0), 0);
    }

    #[test]
    fn test_heal_capped() {
        let mut v = Vitals::new(450);
        v.apply_damage(100.0, 0.0);
        assert_eq!(v.heal(150), 100);
        assert_eq!(v.health(), 450);

        v.apply_damage(450.0, 0.0);
        assert_eq!(v.heal(150), 0);
        assert_eq!(v.health(), 0);
    }

    #[test]
    fn test_ratio() {
        let mut v = Vitals::new(200);
        v.apply_damage(50.0, 0.0);
        assert!((v.ratio() - 0.75).abs() < 1e-6);
    }
}
