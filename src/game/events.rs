//! Fire-and-forget notifications for presentation collaborators.
//!
//! The simulation never reads these back. Hosts drain them after each tick.

use serde::{Deserialize, Serialize};

use crate::game::{BattleSummary, EntityRef, Faction, Lane, Position, TowerId, TowerKind, UnitId};

/// What happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BattleEventKind {
    /// A unit entered the battlefield.
    UnitDeployed {
        /// New unit.
        unit: UnitId,
        /// Owning side.
        faction: Faction,
        /// Archetype key.
        archetype: String,
        /// Lane it spawned in.
        lane: Lane,
        /// Spawn location.
        position: Position,
    },
    /// Damage landed.
    Hit {
        /// Attacker or ability caster.
        source: EntityRef,
        /// Recipient.
        target: EntityRef,
        /// Health removed after reduction.
        damage: u32,
    },
    /// A unit's health reached zero.
    UnitDestroyed {
        /// The fallen unit.
        unit: UnitId,
        /// Its side.
        faction: Faction,
        /// Its archetype key.
        archetype: String,
    },
    /// A tower's health reached zero.
    TowerDestroyed {
        /// The fallen tower.
        tower: TowerId,
        /// Its side.
        faction: Faction,
        /// King or side.
        kind: TowerKind,
    },
    /// An ability was cast.
    AbilityActivated {
        /// Caster.
        unit: UnitId,
        /// Ability name.
        ability: String,
    },
    /// An ability finished.
    AbilityEnded {
        /// Caster.
        unit: UnitId,
        /// Ability name.
        ability: String,
        /// Whether it ended before its duration ran out.
        early: bool,
    },
    /// A unit was stunned.
    Stunned {
        /// Affected unit.
        unit: UnitId,
    },
    /// A unit recovered from a stun.
    Recovered {
        /// Affected unit.
        unit: UnitId,
    },
    /// A unit was healed.
    Healed {
        /// Recipient.
        unit: UnitId,
        /// Health restored.
        amount: u32,
    },
    /// A scheduled cosmetic beat of an ability (e.g. a shockwave pulse).
    EffectBeat {
        /// Caster.
        unit: UnitId,
        /// Ability name.
        ability: String,
        /// Beat number starting at 0.
        beat: u32,
        /// Where the beat is centred.
        position: Position,
    },
    /// The battle reached its terminal state.
    BattleEnded {
        /// Final result.
        summary: BattleSummary,
    },
}

/// A timestamped event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleEvent {
    /// Battle time in milliseconds.
    pub at_ms: u64,
    /// Payload.
    #[serde(flatten)]
    pub kind: BattleEventKind,
}

/// Buffer of events produced since the last drain.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<BattleEvent>,
}

impl EventLog {
    /// Record an event.
    pub fn push(&mut self, at_ms: u64, kind: BattleEventKind) {
        self.events.push(BattleEvent { at_ms, kind });
    }

    /// Take every buffered event.
    pub fn drain(&mut self) -> Vec<BattleEvent> {
        std::mem::take(&mut self.events)
    }

    /// Buffered events.
    #[must_use]
    pub fn as_slice(&self) -> &[BattleEvent] {
        &self.events
    }

    /// Number of buffered events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether nothing is buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_empties() {
        let mut log = EventLog::default();
        log.push(5, BattleEventKind::Stunned { unit: UnitId(1) });
        log.push(6, BattleEventKind::Recovered { unit: UnitId(1) });
        assert_eq!(log.len(), 2);
        let drained = log.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].at_ms, 5);
        assert!(log.is_empty());
    }

    #[test]
    fn test_event_json_shape() {
        let event = BattleEvent {
            at_ms: 100,
            kind: BattleEventKind::Healed {
                unit: UnitId(3),
                amount: 150,
            },
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"event\":\"healed\""));
        assert!(json.contains("\"at_ms\":100"));
        let back: BattleEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
