//! Future work queued on the battle clock.
//!
//! Delayed behaviour (AI spawn cadence, staggered ability beats) is kept
//! here instead of in timers, and is drained by the orchestrator at a fixed
//! point of each tick. Entries due at the same instant run in the order they
//! were scheduled.

use std::collections::BTreeMap;

use crate::game::{Position, UnitId};

/// Something to do at a future battle time.
#[derive(Debug, Clone, PartialEq)]
pub enum ScheduledAction {
    /// Spawn an enemy unit and redraw the delay.
    EnemySpawn,
    /// Emit a cosmetic beat for an ability.
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
}

/// Time-ordered queue of scheduled actions.
#[derive(Debug, Clone, Default)]
pub struct Schedule {
    entries: BTreeMap<(u64, u64), ScheduledAction>,
    next_seq: u64,
}

impl Schedule {
    /// Queue `action` for battle time `due_ms`.
    pub fn at(&mut self, due_ms: u64, action: ScheduledAction) {
        self.entries.insert((due_ms, self.next_seq), action);
        self.next_seq += 1;
    }

    /// Remove and return every action due at or before `now`, in order.
    pub fn pop_due(&mut self, now: u64) -> Vec<(u64, ScheduledAction)> {
        let later = self.entries.split_off(&(now.saturating_add(1), 0));
        let due = std::mem::replace(&mut self.entries, later);
        due.into_iter().map(|((at, _), action)| (at, action)).collect()
    }

    /// Time of the earliest pending action.
    #[must_use]
    pub fn next_due(&self) -> Option<u64> {
        self.entries.keys().next().map(|&(at, _)| at)
    }

    /// Whether an enemy spawn is pending.
    #[must_use]
    pub fn has_enemy_spawn(&self) -> bool {
        self.entries
            .values()
            .any(|a| matches!(a, ScheduledAction::EnemySpawn))
    }

    /// Drop everything. Used when the battle ends.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Pending actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn beat(n: u32) -> ScheduledAction {
        ScheduledAction::EffectBeat {
            unit: UnitId(0),
            ability: "pulse".into(),
            beat: n,
            position: Position::default(),
        }
    }

    #[test]
    fn test_pop_due_in_time_then_insertion_order() {
        let mut s = Schedule::default();
        s.at(300, beat(2));
        s.at(100, beat(0));
        s.at(100, beat(1));
        s.at(500, ScheduledAction::EnemySpawn);

        let due = s.pop_due(300);
        let beats: Vec<_> = due
            .iter()
            .map(|(_, a)| match a {
                ScheduledAction::EffectBeat { beat, .. } => *beat,
                ScheduledAction::EnemySpawn => u32::MAX,
            })
            .collect();
        assert_eq!(beats, vec![0, 1, 2]);
        assert_eq!(s.len(), 1);
        assert_eq!(s.next_due(), Some(500));
        assert!(s.has_enemy_spawn());
    }

    #[test]
    fn test_nothing_due_early() {
        let mut s = Schedule::default();
        s.at(100, ScheduledAction::EnemySpawn);
        assert!(s.pop_due(99).is_empty());
        assert_eq!(s.pop_due(100).len(), 1);
        assert!(s.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut s = Schedule::default();
        s.at(1, ScheduledAction::EnemySpawn);
        s.clear();
        assert!(s.pop_due(u64::MAX).is_empty());
    }
}
