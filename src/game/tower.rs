//! Stationary towers: each side has a king and two side towers.

use serde::{Deserialize, Serialize};

use crate::game::combat::{self, Strike};
use crate::game::{Battlefield, Entity, EntityRef, Faction, Position, TowerId, Vitals};

/// Which slot a tower occupies on its side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TowerKind {
    /// Primary stronghold; losing it ends the battle.
    King,
    /// Negative-x side tower.
    Left,
    /// Positive-x side tower.
    Right,
}

impl TowerKind {
    /// Slots in table order.
    pub const ALL: [Self; 3] = [Self::King, Self::Left, Self::Right];
}

/// Combat numbers for one class of tower.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TowerStats {
    /// Maximum health.
    pub hp: u32,
    /// Damage per shot.
    pub damage: f32,
    /// Targets must be strictly closer than this.
    pub attack_range: f32,
    /// Seconds between shots.
    pub attack_interval: f32,
}

/// Tower stats and placement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TowerConfig {
    /// King tower stats.
    pub king: TowerStats,
    /// Side tower stats.
    pub side: TowerStats,
    /// |z| of the king towers.
    pub king_depth: f32,
    /// |x| of the side towers.
    pub side_x: f32,
    /// |z| of the side towers.
    pub side_depth: f32,
}

impl Default for TowerConfig {
    fn default() -> Self {
        let side = TowerStats {
            hp: 1500,
            damage: 110.0,
            attack_range: 9.0,
            attack_interval: 1.1,
        };
        Self {
            king: TowerStats { hp: 3000, ..side },
            side,
            king_depth: 24.0,
            side_x: 10.0,
            side_depth: 10.0,
        }
    }
}

impl TowerConfig {
    /// Where a faction's tower of `kind` stands.
    #[must_use]
    pub fn placement(&self, faction: Faction, kind: TowerKind) -> Position {
        let sign = -faction.advance_direction();
        match kind {
            TowerKind::King => Position::new(0.0, sign * self.king_depth),
            TowerKind::Left => Position::new(-self.side_x, sign * self.side_depth),
            TowerKind::Right => Position::new(self.side_x, sign * self.side_depth),
        }
    }

    /// Stats for a slot.
    #[must_use]
    pub const fn stats(&self, kind: TowerKind) -> &TowerStats {
        match kind {
            TowerKind::King => &self.king,
            TowerKind::Left | TowerKind::Right => &self.side,
        }
    }
}

/// A tower. Never moves and never has an ability.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Tower {
    /// Slot in the tower table.
    pub id: TowerId,
    /// King or side.
    pub kind: TowerKind,
    /// Owning side.
    pub faction: Faction,
    /// Fixed location.
    pub position: Position,
    /// Health.
    pub vitals: Vitals,
    /// Damage per shot.
    pub damage: f32,
    /// Strict attack range.
    pub attack_range: f32,
    /// Milliseconds between shots.
    pub attack_interval_ms: f32,
    /// Milliseconds until the next shot, floored at zero.
    pub attack_cooldown_ms: f32,
}

impl Tower {
    /// Build a tower for a slot.
    #[must_use]
    pub fn new(id: TowerId, faction: Faction, kind: TowerKind, config: &TowerConfig) -> Self {
        let stats = config.stats(kind);
        Self {
            id,
            kind,
            faction,
            position: config.placement(faction, kind),
            vitals: Vitals::new(stats.hp),
            damage: stats.damage,
            attack_range: stats.attack_range,
            attack_interval_ms: (stats.attack_interval * 1000.0).round(),
            attack_cooldown_ms: 0.0,
        }
    }

    /// Run one tick: cool down, then shoot the nearest opposing unit in range.
    #[allow(clippy::cast_precision_loss)]
    pub fn update(&mut self, dt_ms: u64, field: &Battlefield) -> Option<Strike> {
        if !self.vitals.is_alive() {
            return None;
        }

        self.attack_cooldown_ms = (self.attack_cooldown_ms - dt_ms as f32).max(0.0);
        if self.attack_cooldown_ms > 0.0 {
            return None;
        }

        let target = combat::nearest_unit_within(
            field,
            self.faction.opponent(),
            self.position,
            self.attack_range,
        )?;
        self.attack_cooldown_ms = self.attack_interval_ms;
        Some(Strike {
            attacker: EntityRef::Tower(self.id),
            target: EntityRef::Unit(target),
            amount: self.damage,
        })
    }
}

impl Entity for Tower {
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
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placement_mirrors_sides() {
        let config = TowerConfig::default();
        let p = config.placement(Faction::Player, TowerKind::King);
        assert!((p.z + 24.0).abs() < 1e-6);
        let e = config.placement(Faction::Enemy, TowerKind::Left);
        assert!((e.x + 10.0).abs() < 1e-6);
        assert!((e.z - 10.0).abs() < 1e-6);
    }

    #[test]
    fn test_king_has_more_health() {
        let config = TowerConfig::default();
        let king = Tower::new(TowerId(0), Faction::Player, TowerKind::King, &config);
        let side = Tower::new(TowerId(1), Faction::Player, TowerKind::Left, &config);
        assert_eq!(king.vitals.max_health(), 3000);
        assert_eq!(side.vitals.max_health(), 1500);
        assert!((side.attack_interval_ms - 1100.0).abs() < f32::EPSILON);
    }
}
