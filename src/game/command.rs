//! Player inputs as data, so they can be recorded and replayed.

use serde::{Deserialize, Serialize};

use crate::game::{Lane, UnitId};

/// An input from the player side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Deploy a card straight into a lane.
    Deploy {
        /// Card (archetype key).
        card: String,
        /// Target lane.
        lane: Lane,
    },
    /// Deploy a card at a clicked position; snaps to the nearest lane.
    DeployAt {
        /// Card (archetype key).
        card: String,
        /// Clicked x.
        x: f32,
        /// Clicked z.
        z: f32,
    },
    /// Trigger a unit's special ability.
    UseAbility {
        /// Caster.
        unit: UnitId,
    },
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Deploy { card, lane } => write!(f, "deploy {card} {lane:?}"),
            Self::DeployAt { card, x, z } => write!(f, "deploy {card} at ({x:.1}, {z:.1})"),
            Self::UseAbility { unit } => write!(f, "ability {unit}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_json() {
        let cmd = Command::Deploy {
            card: "doge-warrior".into(),
            lane: Lane::Left,
        };
        let json = serde_json::to_string(&cmd).unwrap();
        assert_eq!(json, r#"{"type":"deploy","card":"doge-warrior","lane":"left"}"#);
        let back: Command = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cmd);
    }

    #[test]
    fn test_display() {
        let cmd = Command::UseAbility { unit: UnitId(3) };
        assert_eq!(cmd.to_string(), "ability #3");
    }
}
