//! Hook implementations for every [`AbilityEffect`].
//!
//! Hooks read their parameters from the instance and re-validate every
//! captured handle before use; entities destroyed since the cast are skipped.

use crate::game::combat::deal_damage;
use crate::game::{
    AbilityContext, AbilityEffect, AbilityHooks, AbilityInstance, BattleEventKind, EntityRef,
    Position, ScheduledAction,
};

/// Resolve the strategy functions for an effect.
#[must_use]
pub(crate) fn hooks_for(effect: &AbilityEffect) -> AbilityHooks {
    match effect {
        AbilityEffect::StunStrike { .. } => AbilityHooks {
            activate: stun_strike,
            update: keep_running,
            end: lift_stuns,
        },
        AbilityEffect::AttackSpeed { .. } => AbilityHooks {
            activate: haste,
            update: keep_running,
            end: end_haste,
        },
        AbilityEffect::Shield { .. } => AbilityHooks {
            activate: shield,
            update: keep_running,
            end: end_shield,
        },
        AbilityEffect::GroundSlam { .. } => AbilityHooks {
            activate: ground_slam,
            update: keep_running,
            end: nothing,
        },
        AbilityEffect::Overcharge { .. } => AbilityHooks {
            activate: overcharge,
            update: overcharge_spent,
            end: end_overcharge,
        },
        AbilityEffect::ArcaneBlast { .. } => AbilityHooks {
            activate: arcane_blast,
            update: keep_running,
            end: nothing,
        },
        AbilityEffect::Multishot { .. } => AbilityHooks {
            activate: multishot,
            update: keep_running,
            end: nothing,
        },
        AbilityEffect::MassHeal { .. } => AbilityHooks {
            activate: mass_heal,
            update: keep_running,
            end: nothing,
        },
    }
}

fn keep_running(_: &mut AbilityInstance, _: &mut AbilityContext<'_>, _: u64, _: u64) -> bool {
    false
}

fn nothing(_: &mut AbilityInstance, _: &mut AbilityContext<'_>) {}

fn caster_position(inst: &AbilityInstance, ctx: &AbilityContext<'_>) -> Option<Position> {
    ctx.field.live_unit(inst.caster).map(|u| u.position)
}

/// Damage captured opposing units and towers within `radius` of `origin`.
/// Returns the units still alive after the hit.
fn blast(
    inst: &AbilityInstance,
    ctx: &mut AbilityContext<'_>,
    origin: Position,
    radius: f32,
    damage: f32,
) -> Vec<crate::game::UnitId> {
    let source = EntityRef::Unit(inst.caster);
    let mut survivors = Vec::new();

    for &id in &inst.snapshot.opponents {
        let Some(pos) = ctx.field.live_unit(id).map(|u| u.position) else {
            continue;
        };
        if origin.distance(pos) > radius {
            continue;
        }
        let hit = deal_damage(ctx.field, ctx.events, ctx.now, source, EntityRef::Unit(id), damage);
        if hit.is_some_and(|h| !h.destroyed) {
            survivors.push(id);
        }
    }

    for &id in &inst.snapshot.opposing_towers {
        let target = EntityRef::Tower(id);
        let Some(pos) = ctx.field.position_of(target) else {
            continue;
        };
        if origin.distance(pos) <= radius {
            deal_damage(ctx.field, ctx.events, ctx.now, source, target, damage);
        }
    }

    survivors
}

fn stun_strike(inst: &mut AbilityInstance, ctx: &mut AbilityContext<'_>) {
    let AbilityEffect::StunStrike {
        radius,
        damage,
        pulses,
        pulse_interval_ms,
    } = inst.effect
    else {
        return;
    };
    let Some(origin) = caster_position(inst, ctx) else {
        return;
    };

    for id in blast(inst, ctx, origin, radius, damage) {
        if let Some(unit) = ctx.field.live_unit_mut(id) {
            unit.stunned = true;
            inst.affected.push(id);
            ctx.events.push(ctx.now, BattleEventKind::Stunned { unit: id });
        }
    }

    for beat in 0..pulses {
        ctx.schedule.at(
            ctx.now + u64::from(beat) * pulse_interval_ms,
            ScheduledAction::EffectBeat {
                unit: inst.caster,
                ability: inst.name.clone(),
                beat,
                position: origin,
            },
        );
    }
}

fn lift_stuns(inst: &mut AbilityInstance, ctx: &mut AbilityContext<'_>) {
    for &id in &inst.affected {
        if let Some(unit) = ctx.field.live_unit_mut(id)
            && unit.stunned
        {
            unit.stunned = false;
            ctx.events.push(ctx.now, BattleEventKind::Recovered { unit: id });
        }
    }
}

fn haste(inst: &mut AbilityInstance, ctx: &mut AbilityContext<'_>) {
    let AbilityEffect::AttackSpeed { interval_multiplier } = inst.effect else {
        return;
    };
    if let Some(unit) = ctx.field.live_unit_mut(inst.caster) {
        unit.modifiers.attack_speed_multiplier = interval_multiplier;
    }
}

fn end_haste(inst: &mut AbilityInstance, ctx: &mut AbilityContext<'_>) {
    if let Some(unit) = ctx.field.live_unit_mut(inst.caster) {
        unit.modifiers.attack_speed_multiplier = 1.0;
    }
}

fn shield(inst: &mut AbilityInstance, ctx: &mut AbilityContext<'_>) {
    let AbilityEffect::Shield { reduction } = inst.effect else {
        return;
    };
    if let Some(unit) = ctx.field.live_unit_mut(inst.caster) {
        unit.modifiers.damage_reduction = reduction;
    }
}

fn end_shield(inst: &mut AbilityInstance, ctx: &mut AbilityContext<'_>) {
    if let Some(unit) = ctx.field.live_unit_mut(inst.caster) {
        unit.modifiers.damage_reduction = 0.0;
    }
}

fn ground_slam(inst: &mut AbilityInstance, ctx: &mut AbilityContext<'_>) {
    let AbilityEffect::GroundSlam { radius, damage } = inst.effect else {
        return;
    };
    if let Some(origin) = caster_position(inst, ctx) {
        blast(inst, ctx, origin, radius, damage);
    }
}

fn overcharge(inst: &mut AbilityInstance, ctx: &mut AbilityContext<'_>) {
    let AbilityEffect::Overcharge {
        shots,
        damage_multiplier,
    } = inst.effect
    else {
        return;
    };
    if let Some(unit) = ctx.field.live_unit_mut(inst.caster) {
        unit.modifiers.pierce_shots_remaining = shots;
        unit.modifiers.pierce_damage_multiplier = damage_multiplier;
    }
}

fn overcharge_spent(inst: &mut AbilityInstance, ctx: &mut AbilityContext<'_>, _: u64, _: u64) -> bool {
    ctx.field
        .live_unit(inst.caster)
        .is_none_or(|u| u.modifiers.pierce_shots_remaining == 0)
}

fn end_overcharge(inst: &mut AbilityInstance, ctx: &mut AbilityContext<'_>) {
    if let Some(unit) = ctx.field.live_unit_mut(inst.caster) {
        unit.modifiers.pierce_shots_remaining = 0;
        unit.modifiers.pierce_damage_multiplier = 1.0;
    }
}

fn arcane_blast(inst: &mut AbilityInstance, ctx: &mut AbilityContext<'_>) {
    let AbilityEffect::ArcaneBlast { damage } = inst.effect else {
        return;
    };
    let Some(target) = ctx.field.live_unit(inst.caster).and_then(|u| u.target) else {
        return;
    };
    if ctx.field.is_targetable(target) {
        deal_damage(
            ctx.field,
            ctx.events,
            ctx.now,
            EntityRef::Unit(inst.caster),
            target,
            damage,
        );
    }
}

fn multishot(inst: &mut AbilityInstance, ctx: &mut AbilityContext<'_>) {
    let AbilityEffect::Multishot {
        max_targets,
        range_bonus,
    } = inst.effect
    else {
        return;
    };
    let Some((origin, reach, damage)) = ctx
        .field
        .live_unit(inst.caster)
        .map(|u| (u.position, u.attack_range + range_bonus, u.damage))
    else {
        return;
    };

    let mut candidates: Vec<(EntityRef, f32)> = inst
        .snapshot
        .opponents
        .iter()
        .map(|&id| EntityRef::Unit(id))
        .chain(inst.snapshot.opposing_towers.iter().map(|&id| EntityRef::Tower(id)))
        .filter_map(|target| {
            ctx.field
                .position_of(target)
                .map(|pos| (target, origin.distance(pos)))
        })
        .collect();
    candidates.sort_by(|a, b| a.1.total_cmp(&b.1));

    let source = EntityRef::Unit(inst.caster);
    for (target, distance) in candidates.into_iter().take(max_targets as usize) {
        if distance <= reach {
            deal_damage(ctx.field, ctx.events, ctx.now, source, target, damage);
        }
    }
}

fn mass_heal(inst: &mut AbilityInstance, ctx: &mut AbilityContext<'_>) {
    let AbilityEffect::MassHeal { radius, amount } = inst.effect else {
        return;
    };
    let Some(origin) = caster_position(inst, ctx) else {
        return;
    };
    for &id in &inst.snapshot.allies {
        let in_radius = ctx
            .field
            .live_unit(id)
            .is_some_and(|u| origin.distance(u.position) <= radius);
        if !in_radius {
            continue;
        }
        let restored = ctx.field.heal(id, amount);
        if restored > 0 {
            ctx.events.push(
                ctx.now,
                BattleEventKind::Healed {
                    unit: id,
                    amount: restored,
                },
            );
        }
    }
}
