//! Arena geometry: positions, factions, lanes.
//!
//! The arena is a rectangle split by a bridge line at `bridge_z`. The player
//! holds the negative-z half and advances toward +z; the enemy mirrors it.

use serde::{Deserialize, Serialize};

/// A point on the battlefield. Only x and z take part in combat.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal coordinate (lane axis).
    pub x: f32,
    /// Depth coordinate (advance axis).
    pub z: f32,
}

impl Position {
    /// Create a new position.
    #[must_use]
    pub const fn new(x: f32, z: f32) -> Self {
        Self { x, z }
    }

    /// Euclidean distance over x/z.
    #[must_use]
    #[inline]
    pub fn distance(self, other: Self) -> f32 {
        let dx = self.x - other.x;
        let dz = self.z - other.z;
        dx.hypot(dz)
    }
}

/// The two sides of a battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Faction {
    /// The human (or pilot) side, bottom of the arena.
    Player,
    /// The AI side, top of the arena.
    Enemy,
}

impl Faction {
    /// Both factions in update order.
    pub const ALL: [Self; 2] = [Self::Player, Self::Enemy];

    /// The other side.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::Player => Self::Enemy,
            Self::Enemy => Self::Player,
        }
    }

    /// Sign of the z step a unit of this faction takes when advancing.
    #[must_use]
    pub const fn advance_direction(self) -> f32 {
        match self {
            Self::Player => 1.0,
            Self::Enemy => -1.0,
        }
    }

    /// Dense index for per-faction arrays.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Player => 0,
            Self::Enemy => 1,
        }
    }
}

impl std::fmt::Display for Faction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Player => write!(f, "player"),
            Self::Enemy => write!(f, "enemy"),
        }
    }
}

/// One of the two fixed lanes units advance along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lane {
    /// Negative-x lane.
    Left,
    /// Positive-x lane.
    Right,
}

impl Lane {
    /// Both lanes.
    pub const ALL: [Self; 2] = [Self::Left, Self::Right];

    /// The other lane.
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

impl std::str::FromStr for Lane {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "left" | "l" => Ok(Self::Left),
            "right" | "r" => Ok(Self::Right),
            other => Err(format!("unknown lane '{other}' (expected left or right)")),
        }
    }
}

/// Fixed arena geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// z of the player's baseline.
    pub player_baseline_z: f32,
    /// z of the enemy's baseline.
    pub enemy_baseline_z: f32,
    /// z of the bridge line splitting the halves.
    pub bridge_z: f32,
    /// x of the left lane.
    pub left_lane_x: f32,
    /// x of the right lane.
    pub right_lane_x: f32,
    /// Distance from the baseline toward the bridge where units spawn.
    pub spawn_offset: f32,
    /// How far past the opposing baseline a unit may advance.
    pub overshoot: f32,
    /// Extra reach when searching for unit targets.
    pub unit_search_margin: f32,
    /// Extra reach when searching for tower targets.
    pub tower_search_margin: f32,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            player_baseline_z: -20.0,
            enemy_baseline_z: 20.0,
            bridge_z: 0.0,
            left_lane_x: -8.0,
            right_lane_x: 8.0,
            spawn_offset: 2.0,
            overshoot: 2.0,
            unit_search_margin: 0.5,
            tower_search_margin: 1.5,
        }
    }
}

impl ArenaConfig {
    /// x coordinate of a lane.
    #[must_use]
    pub const fn lane_x(&self, lane: Lane) -> f32 {
        match lane {
            Lane::Left => self.left_lane_x,
            Lane::Right => self.right_lane_x,
        }
    }

    /// Lane closest to `x`. Ties go left.
    #[must_use]
    pub fn nearest_lane(&self, x: f32) -> Lane {
        if (x - self.left_lane_x).abs() <= (x - self.right_lane_x).abs() {
            Lane::Left
        } else {
            Lane::Right
        }
    }

    /// Baseline of a faction.
    #[must_use]
    pub const fn baseline_z(&self, faction: Faction) -> f32 {
        match faction {
            Faction::Player => self.player_baseline_z,
            Faction::Enemy => self.enemy_baseline_z,
        }
    }

    /// Where a fresh unit of `faction` appears in `lane`.
    #[must_use]
    pub fn spawn_point(&self, faction: Faction, lane: Lane) -> Position {
        let z = self.baseline_z(faction) + faction.advance_direction() * self.spawn_offset;
        Position::new(self.lane_x(lane), z)
    }

    /// Clamp an advancing unit's z so it cannot pass the opposing baseline
    /// by more than `overshoot`.
    #[must_use]
    pub fn clamp_advance(&self, faction: Faction, z: f32) -> f32 {
        let limit = self.baseline_z(faction.opponent()) + faction.advance_direction() * self.overshoot;
        match faction {
            Faction::Player => z.min(limit),
            Faction::Enemy => z.max(limit),
        }
    }

    /// Whether the player may deploy at depth `z`.
    #[must_use]
    pub fn player_may_deploy_at(&self, z: f32) -> bool {
        z <= self.bridge_z - 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_ignores_nothing_but_xz() {
        let a = Position::new(0.0, 0.0);
        let b = Position::new(3.0, 4.0);
        assert!((a.distance(b) - 5.0).abs() < 1e-6);
        assert!((b.distance(a) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_faction_opponent_and_direction() {
        assert_eq!(Faction::Player.opponent(), Faction::Enemy);
        assert_eq!(Faction::Enemy.opponent(), Faction::Player);
        assert!(Faction::Player.advance_direction() > 0.0);
        assert!(Faction::Enemy.advance_direction() < 0.0);
    }

    #[test]
    fn test_spawn_points() {
        let arena = ArenaConfig::default();
        let p = arena.spawn_point(Faction::Player, Lane::Left);
        assert!((p.x + 8.0).abs() < 1e-6);
        assert!((p.z + 18.0).abs() < 1e-6);

        let e = arena.spawn_point(Faction::Enemy, Lane::Right);
        assert!((e.x - 8.0).abs() < 1e-6);
        assert!((e.z - 18.0).abs() < 1e-6);
    }

    #[test]
    fn test_clamp_advance() {
        let arena = ArenaConfig::default();
        assert!((arena.clamp_advance(Faction::Player, 30.0) - 22.0).abs() < 1e-6);
        assert!((arena.clamp_advance(Faction::Player, 5.0) - 5.0).abs() < 1e-6);
        assert!((arena.clamp_advance(Faction::Enemy, -30.0) + 22.0).abs() < 1e-6);
    }

    #[test]
    fn test_nearest_lane_and_deploy_limit() {
        let arena = ArenaConfig::default();
        assert_eq!(arena.nearest_lane(-3.0), Lane::Left);
        assert_eq!(arena.nearest_lane(0.5), Lane::Right);
        assert_eq!(arena.nearest_lane(0.0), Lane::Left);
        assert!(arena.player_may_deploy_at(-1.0));
        assert!(!arena.player_may_deploy_at(-0.5));
    }

    #[test]
    fn test_lane_from_str() {
        assert_eq!("left".parse::<Lane>(), Ok(Lane::Left));
        assert_eq!("R".parse::<Lane>(), Ok(Lane::Right));
        assert!("middle".parse::<Lane>().is_err());
    }
}
