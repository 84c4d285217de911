//! Battle clock.

use serde::{Deserialize, Serialize};

/// Elapsed and remaining battle time in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleClock {
    elapsed_ms: u64,
    duration_ms: u64,
}

impl BattleClock {
    /// A clock for a battle lasting `duration_ms`.
    #[must_use]
    pub const fn new(duration_ms: u64) -> Self {
        Self {
            elapsed_ms: 0,
            duration_ms,
        }
    }

    /// Move time forward, stopping at the duration. Returns the new time.
    pub fn advance(&mut self, dt_ms: u64) -> u64 {
        self.elapsed_ms = self.elapsed_ms.saturating_add(dt_ms).min(self.duration_ms);
        self.elapsed_ms
    }

    /// Battle time so far.
    #[must_use]
    pub const fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    /// Battle time left.
    #[must_use]
    pub const fn remaining_ms(&self) -> u64 {
        self.duration_ms - self.elapsed_ms
    }

    /// Total battle length.
    #[must_use]
    pub const fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    /// Whether no time remains.
    #[must_use]
    pub const fn expired(&self) -> bool {
        self.elapsed_ms >= self.duration_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_saturates_at_duration() {
        let mut clock = BattleClock::new(1000);
        assert_eq!(clock.advance(400), 400);
        assert_eq!(clock.remaining_ms(), 600);
        assert!(!clock.expired());
        assert_eq!(clock.advance(900), 1000);
        assert_eq!(clock.remaining_ms(), 0);
        assert!(clock.expired());
    }
}
