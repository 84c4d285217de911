#![no_main]

use arbitrary::Arbitrary;
use crownfall::game::{check_invariants, Command, Lane, UnitId};
use crownfall::{Battle, BattleConfig, BattleSetup};
use libfuzzer_sys::fuzz_target;

/// A player input, mapped onto the stock catalog.
#[derive(Arbitrary, Debug)]
enum FuzzCommand {
    /// Deploy a card into a lane.
    Deploy { card: u8, right: bool },
    /// Deploy at a position.
    DeployAt { card: u8, x: i8, z: i8 },
    /// Cast an ability.
    UseAbility { unit: u8 },
}

/// Structured input for whole-battle fuzzing.
#[derive(Arbitrary, Debug)]
struct BattleInput {
    /// Battle seed.
    seed: u64,
    /// Headless tick length.
    tick_ms: u8,
    /// Commands, each issued before the tick with its index.
    commands: Vec<(u16, FuzzCommand)>,
}

fn to_command(ids: &[String], cmd: &FuzzCommand) -> Command {
    // One index past the catalog names an unknown card
    let card = |i: u8| {
        ids.get(usize::from(i) % (ids.len() + 1))
            .cloned()
            .unwrap_or_else(|| "unknown".to_string())
    };
    match *cmd {
        FuzzCommand::Deploy { card: c, right } => Command::Deploy {
            card: card(c),
            lane: if right { Lane::Right } else { Lane::Left },
        },
        FuzzCommand::DeployAt { card: c, x, z } => Command::DeployAt {
            card: card(c),
            x: f32::from(x) / 8.0,
            z: f32::from(z) / 5.0,
        },
        FuzzCommand::UseAbility { unit } => Command::UseAbility {
            unit: UnitId(u32::from(unit)),
        },
    }
}

fuzz_target!(|input: BattleInput| {
    // Short battles keep each run fast
    let mut config = BattleConfig::default();
    config.battle.duration_ms = 30_000;
    let Ok(setup) = BattleSetup::from_config(config) else {
        return;
    };
    let ids: Vec<String> = setup.catalog.ids().map(str::to_string).collect();
    let dt = u64::from(input.tick_ms).max(10);

    let mut commands: Vec<(u16, Command)> = input
        .commands
        .iter()
        .take(200)
        .map(|(tick, cmd)| (*tick, to_command(&ids, cmd)))
        .collect();
    commands.sort_by_key(|(tick, _)| *tick);
    let mut pending = commands.into_iter().peekable();

    let mut battle = Battle::new(&setup, input.seed);
    let mut tick = 0u16;
    while !battle.is_over() {
        while let Some((_, command)) = pending.next_if(|(t, _)| *t <= tick) {
            let before = battle.snapshot();
            if battle.apply(&command).is_err() {
                assert_eq!(battle.snapshot(), before, "rejected command mutated state");
            }
        }
        battle.tick(dt);
        battle.drain_events();

        let violations = check_invariants(&battle);
        assert!(violations.is_empty(), "Invariants violated at tick {tick}: {violations:?}");
        tick = tick.saturating_add(1);
    }

    let summary = battle.outcome().expect("finished battle has a summary");
    assert!(summary.duration_ms <= setup.config.battle.duration_ms);
    assert!(battle.schedule().is_empty());
});
