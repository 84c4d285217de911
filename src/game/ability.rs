//! Special abilities: catalog data, cast lifecycle and per-unit cooldowns.
//!
//! Each cast runs through `activate` once, then `update` every tick while
//! live, then `end` exactly once. Instant abilities (zero duration) get
//! their `end` call straight after `activate`. Trackers are keyed by
//! [`UnitId`], so a unit's cooldown survives nothing but the unit itself.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ActionError, ActionResult, ConfigError};
use crate::game::{effects, Battlefield, BattleEventKind, EventLog, Faction, Schedule, TowerId, UnitId};

/// Pure-data parameters of an ability, one variant per behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AbilityEffect {
    /// Damage and stun every opposing unit in a radius (towers take the
    /// damage too); stuns lift when the ability ends.
    StunStrike {
        /// Radius around the caster.
        radius: f32,
        /// Damage per target.
        damage: f32,
        /// Cosmetic shockwave beats to schedule.
        #[serde(default)]
        pulses: u32,
        /// Milliseconds between beats.
        #[serde(default)]
        pulse_interval_ms: u64,
    },
    /// Multiply the caster's attack interval.
    AttackSpeed {
        /// Interval multiplier; 0.5 attacks twice as fast.
        interval_multiplier: f32,
    },
    /// Reduce damage taken by the caster.
    Shield {
        /// Fraction of incoming damage ignored, in `[0, 1]`.
        reduction: f32,
    },
    /// Instant damage to opposing units and towers in a radius.
    GroundSlam {
        /// Radius around the caster.
        radius: f32,
        /// Damage per target.
        damage: f32,
    },
    /// Empower the next few attacks; ends early once they are spent.
    Overcharge {
        /// Empowered attacks.
        shots: u32,
        /// Damage multiplier for each.
        damage_multiplier: f32,
    },
    /// Instant damage to the caster's current target.
    ArcaneBlast {
        /// Damage dealt.
        damage: f32,
    },
    /// Hit up to `max_targets` nearest opposing entities within
    /// `attack_range + range_bonus` for the caster's damage each.
    Multishot {
        /// Maximum targets hit.
        max_targets: u32,
        /// Added to the caster's attack range.
        range_bonus: f32,
    },
    /// Heal allies in a radius, not including the caster.
    MassHeal {
        /// Radius around the caster.
        radius: f32,
        /// Health restored per ally.
        amount: u32,
    },
}

/// Catalog entry for an ability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbilityDef {
    /// Display name.
    pub name: String,
    /// Milliseconds before the ability may be cast again.
    pub cooldown_ms: u64,
    /// Milliseconds the ability stays live; 0 is instant.
    pub duration_ms: u64,
    /// Behaviour and parameters.
    pub effect: AbilityEffect,
}

impl AbilityDef {
    /// Create an ability definition.
    #[must_use]
    pub fn new(name: &str, cooldown_ms: u64, duration_ms: u64, effect: AbilityEffect) -> Self {
        Self {
            name: name.to_string(),
            cooldown_ms,
            duration_ms,
            effect,
        }
    }

    /// Collect problems with the parameters into `errors`.
    pub fn validate_into(&self, troop: &str, errors: &mut Vec<ConfigError>) {
        let field = |name: &str| format!("troops.{troop}.ability.{name}");
        let positive = |v: f32| v.is_finite() && v > 0.0;
        let non_negative = |v: f32| v.is_finite() && v >= 0.0;

        if self.cooldown_ms == 0 {
            errors.push(ConfigError::invalid(field("cooldown_ms"), "must be positive"));
        }
        match self.effect {
            AbilityEffect::StunStrike { radius, damage, .. }
            | AbilityEffect::GroundSlam { radius, damage } => {
                if !positive(radius) {
                    errors.push(ConfigError::invalid(field("radius"), "must be positive"));
                }
                if !non_negative(damage) {
                    errors.push(ConfigError::invalid(field("damage"), "must be non-negative"));
                }
            }
            AbilityEffect::AttackSpeed { interval_multiplier } => {
                if !positive(interval_multiplier) {
                    errors.push(ConfigError::invalid(
                        field("interval_multiplier"),
                        "must be positive",
                    ));
                }
            }
            AbilityEffect::Shield { reduction } => {
                if !(reduction.is_finite() && (0.0..=1.0).contains(&reduction)) {
                    errors.push(ConfigError::invalid(field("reduction"), "must be within [0, 1]"));
                }
            }
            AbilityEffect::Overcharge {
                shots,
                damage_multiplier,
            } => {
                if shots == 0 {
                    errors.push(ConfigError::invalid(field("shots"), "must be positive"));
                }
                if !non_negative(damage_multiplier) {
                    errors.push(ConfigError::invalid(
                        field("damage_multiplier"),
                        "must be non-negative",
                    ));
                }
            }
            AbilityEffect::ArcaneBlast { damage } => {
                if !non_negative(damage) {
                    errors.push(ConfigError::invalid(field("damage"), "must be non-negative"));
                }
            }
            AbilityEffect::Multishot {
                max_targets,
                range_bonus,
            } => {
                if max_targets == 0 {
                    errors.push(ConfigError::invalid(field("max_targets"), "must be positive"));
                }
                if !non_negative(range_bonus) {
                    errors.push(ConfigError::invalid(field("range_bonus"), "must be non-negative"));
                }
            }
            AbilityEffect::MassHeal { radius, .. } => {
                if !positive(radius) {
                    errors.push(ConfigError::invalid(field("radius"), "must be positive"));
                }
            }
        }
    }
}

/// Mutable battle state an ability hook may touch.
#[derive(Debug)]
pub struct AbilityContext<'a> {
    /// All combat actors.
    pub field: &'a mut Battlefield,
    /// Event sink.
    pub events: &'a mut EventLog,
    /// Battle schedule, for staggered beats.
    pub schedule: &'a mut Schedule,
    /// Current battle time.
    pub now: u64,
}

/// Runs once at cast time.
pub type ActivateHook = fn(&mut AbilityInstance, &mut AbilityContext<'_>);
/// Runs each tick while live; returns true to end early.
pub type UpdateHook = fn(&mut AbilityInstance, &mut AbilityContext<'_>, u64, u64) -> bool;
/// Runs once when the cast terminates.
pub type EndHook = fn(&mut AbilityInstance, &mut AbilityContext<'_>);

/// Strategy functions for an effect, resolved once at catalog build.
#[derive(Debug, Clone, Copy)]
pub struct AbilityHooks {
    /// Cast-time side effects.
    pub activate: ActivateHook,
    /// Per-tick update.
    pub update: UpdateHook,
    /// Cleanup.
    pub end: EndHook,
}

/// An ability definition paired with its resolved hooks.
#[derive(Debug, Clone)]
pub struct AbilitySpec {
    /// Catalog data.
    pub def: AbilityDef,
    /// Resolved behaviour.
    pub hooks: AbilityHooks,
}

impl AbilitySpec {
    /// Resolve the hooks for a definition.
    #[must_use]
    pub fn resolve(def: AbilityDef) -> Self {
        let hooks = effects::hooks_for(&def.effect);
        Self { def, hooks }
    }
}

/// Handles captured when the ability was cast.
///
/// Entities in here may have been destroyed since; hooks re-check every
/// handle before touching it.
#[derive(Debug, Clone, Default)]
pub struct CastSnapshot {
    /// Opposing units alive at cast time.
    pub opponents: Vec<UnitId>,
    /// Opposing towers alive at cast time.
    pub opposing_towers: Vec<TowerId>,
    /// Allied units alive at cast time, caster excluded.
    pub allies: Vec<UnitId>,
}

impl CastSnapshot {
    /// Capture the collections around `caster`.
    #[must_use]
    pub fn capture(field: &Battlefield, caster: UnitId, faction: Faction) -> Self {
        let alive = |id: &&UnitId| field.live_unit(**id).is_some();
        Self {
            opponents: field
                .live_ids(faction.opponent())
                .iter()
                .filter(alive)
                .copied()
                .collect(),
            opposing_towers: field
                .towers_of(faction.opponent())
                .filter(|t| t.vitals.is_alive())
                .map(|t| t.id)
                .collect(),
            allies: field
                .live_ids(faction)
                .iter()
                .filter(alive)
                .filter(|&&id| id != caster)
                .copied()
                .collect(),
        }
    }
}

/// One activation of an ability.
#[derive(Debug, Clone)]
pub struct AbilityInstance {
    /// Caster.
    pub caster: UnitId,
    /// Caster's side.
    pub faction: Faction,
    /// Ability name.
    pub name: String,
    /// Parameters.
    pub effect: AbilityEffect,
    /// Battle time of the cast.
    pub activated_at: u64,
    /// Live duration; 0 for instant.
    pub duration_ms: u64,
    /// Collections captured at cast time.
    pub snapshot: CastSnapshot,
    /// Units this cast changed and must restore when it ends.
    pub affected: Vec<UnitId>,
    hooks: AbilityHooks,
}

/// Per-unit ability state.
#[derive(Debug, Clone, Default)]
pub struct AbilityTracker {
    /// Battle time at which the ability becomes ready again.
    pub cooldown_expires_at: u64,
    /// Cooldown length of the last cast.
    pub cooldown_ms: u64,
    /// The live activation, if one is running.
    pub live: Option<AbilityInstance>,
}

/// Owns every unit's ability tracker.
#[derive(Debug, Clone, Default)]
pub struct AbilityEngine {
    trackers: BTreeMap<UnitId, AbilityTracker>,
}

impl AbilityEngine {
    /// Cast `spec` for `caster`.
    ///
    /// Rejected while the caster's ability is live or cooling down; a
    /// rejected cast changes nothing.
    ///
    /// # Errors
    ///
    /// `UnknownUnit` if the caster is not alive, `AbilityActive` or
    /// `AbilityOnCooldown` if it cannot cast yet.
    pub fn use_ability(
        &mut self,
        caster: UnitId,
        spec: &AbilitySpec,
        ctx: &mut AbilityContext<'_>,
    ) -> ActionResult<()> {
        let faction = ctx
            .field
            .live_unit(caster)
            .map(|u| u.faction)
            .ok_or(ActionError::UnknownUnit(caster.0))?;

        if let Some(tracker) = self.trackers.get(&caster) {
            if tracker.live.is_some() {
                return Err(ActionError::AbilityActive(caster.0));
            }
            if ctx.now < tracker.cooldown_expires_at {
                return Err(ActionError::AbilityOnCooldown {
                    remaining_ms: tracker.cooldown_expires_at - ctx.now,
                });
            }
        }

        let mut instance = AbilityInstance {
            caster,
            faction,
            name: spec.def.name.clone(),
            effect: spec.def.effect,
            activated_at: ctx.now,
            duration_ms: spec.def.duration_ms,
            snapshot: CastSnapshot::capture(ctx.field, caster, faction),
            affected: Vec::new(),
            hooks: spec.hooks,
        };

        ctx.events.push(
            ctx.now,
            BattleEventKind::AbilityActivated {
                unit: caster,
                ability: instance.name.clone(),
            },
        );
        (instance.hooks.activate)(&mut instance, ctx);
        debug!(unit = caster.0, ability = %instance.name, at_ms = ctx.now, "ability activated");

        let tracker = self.trackers.entry(caster).or_default();
        tracker.cooldown_expires_at = ctx.now.saturating_add(spec.def.cooldown_ms);
        tracker.cooldown_ms = spec.def.cooldown_ms;

        if instance.duration_ms > 0 {
            tracker.live = Some(instance);
        } else {
            finish(&mut instance, ctx, false);
        }
        Ok(())
    }

    /// Advance every live ability by one tick.
    pub fn advance(&mut self, dt_ms: u64, ctx: &mut AbilityContext<'_>) {
        for tracker in self.trackers.values_mut() {
            let Some(mut instance) = tracker.live.take() else {
                continue;
            };
            let elapsed = ctx.now.saturating_sub(instance.activated_at);
            if (instance.hooks.update)(&mut instance, ctx, dt_ms, elapsed) {
                finish(&mut instance, ctx, true);
            } else if elapsed >= instance.duration_ms {
                finish(&mut instance, ctx, false);
            } else {
                tracker.live = Some(instance);
            }
        }
    }

    /// Forget everything about a reaped unit.
    ///
    /// A live ability still runs its `end` hook, so effects it placed on
    /// other units (stuns) are released rather than outliving the caster.
    pub fn cleanup(&mut self, unit: UnitId, ctx: &mut AbilityContext<'_>) {
        if let Some(mut instance) = self.trackers.remove(&unit).and_then(|t| t.live) {
            finish(&mut instance, ctx, true);
        }
    }

    /// Drop every live ability and cooldown without running hooks.
    pub fn clear(&mut self) {
        self.trackers.clear();
    }

    /// Milliseconds until `unit` may cast again.
    #[must_use]
    pub fn cooldown_remaining(&self, unit: UnitId, now: u64) -> u64 {
        self.trackers
            .get(&unit)
            .map_or(0, |t| t.cooldown_expires_at.saturating_sub(now))
    }

    /// Readiness in `[0, 1]`: 0 right after a cast, 1 when ready.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn percent_ready(&self, unit: UnitId, now: u64) -> f32 {
        let Some(tracker) = self.trackers.get(&unit) else {
            return 1.0;
        };
        if tracker.cooldown_ms == 0 {
            return 1.0;
        }
        let remaining = tracker.cooldown_expires_at.saturating_sub(now);
        1.0 - remaining as f32 / tracker.cooldown_ms as f32
    }

    /// Whether `unit` has a live ability.
    #[must_use]
    pub fn is_active(&self, unit: UnitId) -> bool {
        self.trackers.get(&unit).is_some_and(|t| t.live.is_some())
    }

    /// Units with a live ability, in id order.
    pub fn active_units(&self) -> impl Iterator<Item = UnitId> + '_ {
        self.trackers
            .iter()
            .filter(|(_, t)| t.live.is_some())
            .map(|(&id, _)| id)
    }

    /// Every tracked unit, in id order.
    pub fn tracked(&self) -> impl Iterator<Item = (UnitId, &AbilityTracker)> {
        self.trackers.iter().map(|(&id, t)| (id, t))
    }
}

fn finish(instance: &mut AbilityInstance, ctx: &mut AbilityContext<'_>, early: bool) {
    (instance.hooks.end)(instance, ctx);
    debug!(unit = instance.caster.0, ability = %instance.name, early, at_ms = ctx.now, "ability ended");
    ctx.events.push(
        ctx.now,
        BattleEventKind::AbilityEnded {
            unit: instance.caster,
            ability: instance.name.clone(),
            early,
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{default_troops, ArenaConfig, EntityRef, Position, TowerConfig, TroopDef};

    struct Rig {
        field: Battlefield,
        events: EventLog,
        schedule: Schedule,
        engine: AbilityEngine,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                field: Battlefield::new(ArenaConfig::default(), &TowerConfig::default()),
                events: EventLog::default(),
                schedule: Schedule::default(),
                engine: AbilityEngine::default(),
            }
        }

        fn cast(&mut self, caster: UnitId, spec: &AbilitySpec, now: u64) -> ActionResult<()> {
            let mut ctx = AbilityContext {
                field: &mut self.field,
                events: &mut self.events,
                schedule: &mut self.schedule,
                now,
            };
            self.engine.use_ability(caster, spec, &mut ctx)
        }

        fn advance(&mut self, dt: u64, now: u64) {
            let mut ctx = AbilityContext {
                field: &mut self.field,
                events: &mut self.events,
                schedule: &mut self.schedule,
                now,
            };
            self.engine.advance(dt, &mut ctx);
        }

        fn cleanup(&mut self, unit: UnitId, now: u64) {
            let mut ctx = AbilityContext {
                field: &mut self.field,
                events: &mut self.events,
                schedule: &mut self.schedule,
                now,
            };
            self.engine.cleanup(unit, &mut ctx);
        }

        fn count(&self, pred: impl Fn(&BattleEventKind) -> bool) -> usize {
            self.events.as_slice().iter().filter(|e| pred(&e.kind)).count()
        }
    }

    fn troop(id: &str) -> TroopDef {
        default_troops().into_iter().find(|t| t.id == id).unwrap()
    }

    fn spec_of(id: &str) -> AbilitySpec {
        AbilitySpec::resolve(troop(id).ability.unwrap())
    }

    #[test]
    fn test_second_cast_within_cooldown_rejected() {
        let mut rig = Rig::new();
        let knight = rig.field.spawn(&troop("bitcoin-knight"), Faction::Player, Position::default(), 0);
        let spec = spec_of("bitcoin-knight");

        rig.cast(knight, &spec, 0).unwrap();
        let err = rig.cast(knight, &spec, 100).unwrap_err();
        assert_eq!(err, ActionError::AbilityActive(knight.0));

        for now in (100..=6_000).step_by(100) {
            rig.advance(100, now);
        }
        let err = rig.cast(knight, &spec, 6_000).unwrap_err();
        assert_eq!(err, ActionError::AbilityOnCooldown { remaining_ms: 14_000 });
        assert_eq!(
            rig.count(|k| matches!(k, BattleEventKind::AbilityActivated { .. })),
            1
        );
        assert!(rig.cast(knight, &spec, 20_000).is_ok());
    }

    #[test]
    fn test_timed_ability_ends_once_at_duration() {
        let mut rig = Rig::new();
        let knight = rig.field.spawn(&troop("bitcoin-knight"), Faction::Player, Position::default(), 0);
        rig.cast(knight, &spec_of("bitcoin-knight"), 0).unwrap();
        assert!(rig.engine.is_active(knight));

        let mut now = 0;
        while now < 8_000 {
            now += 250;
            rig.advance(250, now);
        }
        assert!(!rig.engine.is_active(knight));
        assert_eq!(
            rig.count(|k| matches!(k, BattleEventKind::AbilityEnded { early: false, .. })),
            1
        );
        let ended_at = rig
            .events
            .as_slice()
            .iter()
            .find(|e| matches!(e.kind, BattleEventKind::AbilityEnded { .. }))
            .unwrap()
            .at_ms;
        assert_eq!(ended_at, 5_000);
    }

    #[test]
    fn test_instant_ability_ends_immediately() {
        let mut rig = Rig::new();
        let tank = rig.field.spawn(&troop("shiba-tank"), Faction::Player, Position::default(), 0);
        rig.cast(tank, &spec_of("shiba-tank"), 0).unwrap();
        assert!(!rig.engine.is_active(tank));
        assert_eq!(
            rig.count(|k| matches!(k, BattleEventKind::AbilityEnded { .. })),
            1
        );
        assert_eq!(rig.engine.cooldown_remaining(tank, 5_000), 20_000);
    }

    #[test]
    fn test_cleanup_ends_live_ability_once() {
        let mut rig = Rig::new();
        let knight = rig.field.spawn(&troop("bitcoin-knight"), Faction::Player, Position::default(), 0);
        rig.cast(knight, &spec_of("bitcoin-knight"), 0).unwrap();
        rig.cleanup(knight, 500);
        assert!(!rig.engine.is_active(knight));
        assert_eq!(rig.engine.cooldown_remaining(knight, 500), 0);

        rig.advance(10_000, 10_000);
        rig.cleanup(knight, 10_000);
        assert_eq!(
            rig.count(|k| matches!(k, BattleEventKind::AbilityEnded { early: true, .. })),
            1
        );
        assert_eq!(
            rig.count(|k| matches!(k, BattleEventKind::AbilityEnded { .. })),
            1
        );
    }

    #[test]
    fn test_cleanup_lifts_stuns_of_dead_caster() {
        let mut rig = Rig::new();
        let hero = rig.field.spawn(&troop("bonkhouse"), Faction::Player, Position::new(0.0, -4.0), 0);
        let victim = rig.field.spawn(&troop("shiba-tank"), Faction::Enemy, Position::new(0.0, -1.0), 0);
        rig.cast(hero, &spec_of("bonkhouse"), 0).unwrap();
        assert!(rig.field.unit(victim).unwrap().stunned);

        assert!(rig.field.apply_damage(EntityRef::Unit(hero), 1_000_000.0).unwrap().destroyed);
        assert_eq!(rig.field.reap(), vec![hero]);
        rig.cleanup(hero, 100);

        assert!(!rig.field.unit(victim).unwrap().stunned);
        assert_eq!(
            rig.count(|k| matches!(k, BattleEventKind::Recovered { unit } if *unit == victim)),
            1
        );
    }

    #[test]
    fn test_percent_ready() {
        let mut rig = Rig::new();
        let tank = rig.field.spawn(&troop("shiba-tank"), Faction::Player, Position::default(), 0);
        assert!((rig.engine.percent_ready(tank, 0) - 1.0).abs() < f32::EPSILON);
        rig.cast(tank, &spec_of("shiba-tank"), 0).unwrap();
        assert!(rig.engine.percent_ready(tank, 0).abs() < f32::EPSILON);
        assert!((rig.engine.percent_ready(tank, 12_500) - 0.5).abs() < 1e-6);
        assert!((rig.engine.percent_ready(tank, 30_000) - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_dead_caster_rejected() {
        let mut rig = Rig::new();
        let tank = rig.field.spawn(&troop("shiba-tank"), Faction::Player, Position::default(), 0);
        rig.field.apply_damage(crate::game::EntityRef::Unit(tank), 99_999.0);
        assert_eq!(
            rig.cast(tank, &spec_of("shiba-tank"), 0),
            Err(ActionError::UnknownUnit(tank.0))
        );
    }

    #[test]
    fn test_validate_catches_bad_reduction() {
        let def = AbilityDef::new("Bad", 1000, 0, AbilityEffect::Shield { reduction: 1.5 });
        let mut errors = Vec::new();
        def.validate_into("x", &mut errors);
        assert_eq!(errors.len(), 1);
    }
}
