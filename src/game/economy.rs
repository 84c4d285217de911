//! Elixir: the regenerating, capped resource that gates deployment.
//!
//! Regeneration is whole-interval accounting. The regen timestamp advances
//! by exactly `ticks × interval`, so fractional progress toward the next
//! point carries over. While the bar is full the timestamp is left alone.

use serde::{Deserialize, Serialize};

use crate::error::{ActionError, ActionResult};

/// Elixir tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElixirConfig {
    /// Elixir at battle start.
    pub initial: u32,
    /// Maximum elixir.
    pub capacity: u32,
    /// Milliseconds per regenerated point.
    pub regen_interval_ms: u64,
}

impl Default for ElixirConfig {
    fn default() -> Self {
        Self {
            initial: 5,
            capacity: 10,
            regen_interval_ms: 1400,
        }
    }
}

/// The player's elixir bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Elixir {
    current: u32,
    capacity: u32,
    regen_interval_ms: u64,
    last_regen_at: u64,
}

impl Elixir {
    /// A bar holding `initial` (capped), with regen measured from `now`.
    #[must_use]
    pub fn new(config: &ElixirConfig, now: u64) -> Self {
        Self {
            current: config.initial.min(config.capacity),
            capacity: config.capacity,
            regen_interval_ms: config.regen_interval_ms.max(1),
            last_regen_at: now,
        }
    }

    /// Current elixir.
    #[must_use]
    pub const fn current(&self) -> u32 {
        self.current
    }

    /// Maximum elixir.
    #[must_use]
    pub const fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Time of the last credited regen point.
    #[must_use]
    pub const fn last_regen_at(&self) -> u64 {
        self.last_regen_at
    }

    /// Fractional progress toward the next point, in `[0, 1)`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn progress(&self, now: u64) -> f32 {
        if self.current >= self.capacity {
            return 0.0;
        }
        let partial = now.saturating_sub(self.last_regen_at) % self.regen_interval_ms;
        partial as f32 / self.regen_interval_ms as f32
    }

    /// Credit every whole interval elapsed since the last credited point.
    /// Returns points gained.
    pub fn regenerate(&mut self, now: u64) -> u32 {
        if self.current >= self.capacity {
            return 0;
        }
        let ticks = now.saturating_sub(self.last_regen_at) / self.regen_interval_ms;
        if ticks == 0 {
            return 0;
        }
        let room = u64::from(self.capacity - self.current);
        #[allow(clippy::cast_possible_truncation)]
        let gained = ticks.min(room) as u32;
        self.current += gained;
        self.last_regen_at += ticks * self.regen_interval_ms;
        gained
    }

    /// Whether `amount` can be paid now.
    #[must_use]
    pub const fn can_afford(&self, amount: u32) -> bool {
        self.current >= amount
    }

    /// Pay `amount`, or change nothing.
    ///
    /// # Errors
    ///
    /// `InsufficientElixir` if `amount` exceeds the current elixir.
    pub fn spend(&mut self, amount: u32) -> ActionResult<()> {
        if self.current < amount {
            return Err(ActionError::InsufficientElixir {
                required: amount,
                available: self.current,
            });
        }
        self.current -= amount;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar() -> Elixir {
        Elixir::new(&ElixirConfig::default(), 0)
    }

    #[test]
    fn test_overspend_rejected_without_mutation() {
        let mut e = Elixir::new(
            &ElixirConfig {
                initial: 10,
                ..ElixirConfig::default()
            },
            0,
        );
        let err = e.spend(11).unwrap_err();
        assert_eq!(
            err,
            ActionError::InsufficientElixir {
                required: 11,
                available: 10
            }
        );
        assert_eq!(e.current(), 10);
        assert!(e.spend(10).is_ok());
        assert_eq!(e.current(), 0);
    }

    #[test]
    fn test_regen_whole_intervals() {
        let mut e = bar();
        assert_eq!(e.regenerate(1399), 0);
        assert_eq!(e.regenerate(1400), 1);
        assert_eq!(e.current(), 6);
        assert_eq!(e.regenerate(4200), 2);
        assert_eq!(e.current(), 8);
    }

    #[test]
    fn test_fractional_progress_is_kept() {
        let mut e = bar();
        e.regenerate(2000);
        assert_eq!(e.current(), 6);
        assert_eq!(e.last_regen_at(), 1400);
        e.regenerate(2800);
        assert_eq!(e.current(), 7);
        assert!((e.progress(2800)).abs() < f32::EPSILON);
    }

    #[test]
    fn test_caps_at_capacity() {
        let mut e = bar();
        e.regenerate(1400 * 20);
        assert_eq!(e.current(), 10);
        assert_eq!(e.regenerate(1400 * 40), 0);
    }

    #[test]
    fn test_full_bar_holds_timestamp() {
        let mut e = bar();
        e.regenerate(1400 * 5);
        assert_eq!(e.current(), 10);
        let stamp = e.last_regen_at();
        e.regenerate(1400 * 9);
        assert_eq!(e.last_regen_at(), stamp);

        e.spend(3).unwrap();
        // The stale timestamp credits the idle time at once.
        assert_eq!(e.regenerate(1400 * 9), 3);
    }

    #[test]
    fn test_initial_above_capacity_clamped() {
        let e = Elixir::new(
            &ElixirConfig {
                initial: 50,
                capacity: 10,
                regen_interval_ms: 1000,
            },
            0,
        );
        assert_eq!(e.current(), 10);
    }
}
