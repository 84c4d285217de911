//! Targeting and damage resolution.
//!
//! Units search opposing units within `attack_range + unit_search_margin` and
//! opposing towers within `attack_range + tower_search_margin`, picking the
//! nearest across both pools. Ties keep the first candidate found, and units
//! are enumerated before towers, so selection is deterministic.
//!
//! The search radius doubles as the engagement radius: a unit whose target
//! lies inside it attacks, and one whose locked target drifts outside it
//! walks on, keeping the lock until that target dies.

use tracing::info;

use crate::game::{
    Battlefield, BattleEventKind, DamageOutcome, EntityRef, EventLog, Faction, Position, Unit,
    UnitId,
};

/// A pending attack produced by an entity update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Strike {
    /// Who attacked.
    pub attacker: EntityRef,
    /// Who gets hit.
    pub target: EntityRef,
    /// Raw damage before the target's reduction.
    pub amount: f32,
}

/// Reach of `unit` against a target of the given kind.
#[must_use]
pub fn engagement_radius(field: &Battlefield, unit: &Unit, target: EntityRef) -> f32 {
    let arena = field.arena();
    match target {
        EntityRef::Unit(_) => unit.attack_range + arena.unit_search_margin,
        EntityRef::Tower(_) => unit.attack_range + arena.tower_search_margin,
    }
}

/// Whether `target` is still valid and within `unit`'s reach.
#[must_use]
pub fn within_engagement(field: &Battlefield, unit: &Unit, target: EntityRef) -> bool {
    field
        .position_of(target)
        .is_some_and(|pos| unit.position.distance(pos) <= engagement_radius(field, unit, target))
}

/// Nearest valid opposing unit or tower within reach of `unit`.
#[must_use]
pub fn find_target(field: &Battlefield, unit: &Unit) -> Option<EntityRef> {
    let arena = field.arena();
    let opponent = unit.faction.opponent();
    let mut best: Option<(EntityRef, f32)> = None;

    let unit_reach = unit.attack_range + arena.unit_search_margin;
    for other in field.units_of(opponent) {
        if !other.vitals.is_alive() {
            continue;
        }
        let d = unit.position.distance(other.position);
        if d <= unit_reach && best.is_none_or(|(_, bd)| d < bd) {
            best = Some((other.handle(), d));
        }
    }

    let tower_reach = unit.attack_range + arena.tower_search_margin;
    for tower in field.towers_of(opponent) {
        if !tower.vitals.is_alive() {
            continue;
        }
        let d = unit.position.distance(tower.position);
        if d <= tower_reach && best.is_none_or(|(_, bd)| d < bd) {
            best = Some((EntityRef::Tower(tower.id), d));
        }
    }

    best.map(|(target, _)| target)
}

/// Nearest live unit of `faction` strictly closer than `range` to `from`.
#[must_use]
pub fn nearest_unit_within(
    field: &Battlefield,
    faction: Faction,
    from: Position,
    range: f32,
) -> Option<UnitId> {
    let mut best = None;
    let mut best_distance = range;
    for unit in field.units_of(faction) {
        if !unit.vitals.is_alive() {
            continue;
        }
        let d = from.distance(unit.position);
        if d < best_distance {
            best_distance = d;
            best = Some(unit.id);
        }
    }
    best
}

/// Apply damage from `source` to `target` and record what happened.
///
/// A stale target (destroyed or reaped since it was chosen) is skipped and
/// yields `None`.
pub fn deal_damage(
    field: &mut Battlefield,
    events: &mut EventLog,
    now: u64,
    source: EntityRef,
    target: EntityRef,
    amount: f32,
) -> Option<DamageOutcome> {
    let outcome = field.apply_damage(target, amount)?;
    events.push(
        now,
        BattleEventKind::Hit {
            source,
            target,
            damage: outcome.dealt,
        },
    );

    if outcome.destroyed {
        match target {
            EntityRef::Unit(id) => {
                if let Some(unit) = field.unit(id) {
                    events.push(
                        now,
                        BattleEventKind::UnitDestroyed {
                            unit: id,
                            faction: unit.faction,
                            archetype: unit.archetype.clone(),
                        },
                    );
                }
            }
            EntityRef::Tower(id) => {
                if let Some(tower) = field.tower(id) {
                    info!(faction = %tower.faction, kind = ?tower.kind, at_ms = now, "tower destroyed");
                    events.push(
                        now,
                        BattleEventKind::TowerDestroyed {
                            tower: id,
                            faction: tower.faction,
                            kind: tower.kind,
                        },
                    );
                }
            }
        }
    }

    Some(outcome)
}

/// Apply a strike produced by an entity update.
pub fn resolve_strike(
    field: &mut Battlefield,
    events: &mut EventLog,
    now: u64,
    strike: Strike,
) -> Option<DamageOutcome> {
    deal_damage(field, events, now, strike.attacker, strike.target, strike.amount)
}
