#![no_main]

use arbitrary::Arbitrary;
use crownfall::game::{check_invariants, Faction, Position};
use crownfall::{Battle, BattleConfig, BattleEventKind, BattleSetup};
use libfuzzer_sys::fuzz_target;

/// Structured input for combat fuzzing.
#[derive(Arbitrary, Debug)]
struct CombatInput {
    /// Attacking archetype index into the stock catalog.
    attacker: u8,
    /// Defending archetype index.
    defender: u8,
    /// Attacker x (scaled into the arena).
    attacker_x: i8,
    /// Attacker z.
    attacker_z: i8,
    /// Defender offset from the attacker, x.
    offset_x: i8,
    /// Defender offset from the attacker, z.
    offset_z: i8,
    /// Whether the attacker casts its ability on the first tick.
    cast: bool,
    /// Tick lengths to run.
    ticks: Vec<u8>,
}

fuzz_target!(|input: CombatInput| {
    let mut config = BattleConfig::default();
    config.enemy_ai.enabled = false;
    let Ok(setup) = BattleSetup::from_config(config) else {
        return;
    };
    let ids: Vec<String> = setup.catalog.ids().map(str::to_string).collect();
    let attacker_kind = &ids[input.attacker as usize % ids.len()];
    let defender_kind = &ids[input.defender as usize % ids.len()];

    // Positions within the arena bounds
    let ax = f32::from(input.attacker_x) / 10.0;
    let az = f32::from(input.attacker_z) / 6.0;
    let dx = ax + f32::from(input.offset_x) / 16.0;
    let dz = az + f32::from(input.offset_z) / 16.0;

    let mut battle = Battle::new(&setup, 0);
    let Ok(attacker) = battle.spawn_at(Faction::Player, attacker_kind, Position::new(ax, az)) else {
        return;
    };
    let Ok(defender) = battle.spawn_at(Faction::Enemy, defender_kind, Position::new(dx, dz)) else {
        return;
    };

    let defender_max = battle.field().unit(defender).map(|u| u.vitals.max_health());

    if input.cast {
        // May be refused, e.g. Arcane Blast without a target; that is fine
        let _ = battle.use_ability(attacker);
    }

    // Cap the run to avoid slow inputs
    for &dt in input.ticks.iter().take(400) {
        battle.tick(u64::from(dt));

        let violations = check_invariants(&battle);
        assert!(violations.is_empty(), "Invariants violated: {violations:?}");

        if let (Some(unit), Some(max)) = (battle.field().unit(defender), defender_max) {
            assert!(unit.vitals.health() <= max);
        }
        if battle.is_over() {
            break;
        }
    }

    // No stock attack or ability hits this hard
    for event in battle.events() {
        if let BattleEventKind::Hit { damage, .. } = &event.kind {
            assert!(*damage <= 1_000, "implausible hit {damage}");
        }
    }
});
