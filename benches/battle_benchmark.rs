//! Benchmarks for running complete battles.
//!
//! This benchmarks the headless battle loop, the hot path of tournaments.

#![allow(missing_docs)]

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use crownfall::tournament::{PilotKind, run_battle};
use crownfall::{Battle, BattleConfig, BattleSetup, Faction, Position};

fn setup() -> BattleSetup {
    BattleSetup::standard().unwrap_or_else(|e| panic!("stock config rejected: {e}"))
}

fn bench_single_battle(c: &mut Criterion) {
    let setup = setup();

    c.bench_function("single_battle_greedy", |b| {
        b.iter(|| {
            let result = run_battle(black_box(42), black_box(PilotKind::Greedy), black_box(&setup));
            black_box(result)
        });
    });
}

fn bench_idle_battle(c: &mut Criterion) {
    // Enemy only; isolates the simulation from pilot decisions
    let setup = setup();

    c.bench_function("single_battle_passive", |b| {
        b.iter(|| {
            let result = run_battle(black_box(42), black_box(PilotKind::Passive), black_box(&setup));
            black_box(result)
        });
    });
}

fn bench_battle_batch(c: &mut Criterion) {
    // 10 battles sequentially, without parallel overhead
    let setup = setup();

    c.bench_function("10_battles_sequential", |b| {
        b.iter(|| {
            for seed in 0..10u64 {
                let result = run_battle(black_box(seed), black_box(PilotKind::Random), black_box(&setup));
                let _ = black_box(result);
            }
        });
    });
}

fn bench_crowded_tick(c: &mut Criterion) {
    // One tick with 40 units locked in melee at the bridge
    let mut config = BattleConfig::default();
    config.enemy_ai.enabled = false;
    let setup = BattleSetup::from_config(config).unwrap_or_else(|e| panic!("config rejected: {e}"));
    let mut battle = Battle::new(&setup, 42);
    for i in 0..20u8 {
        let x = -9.0 + f32::from(i) * 0.9;
        let _ = battle.spawn_at(Faction::Player, "doge-warrior", Position::new(x, -1.0));
        let _ = battle.spawn_at(Faction::Enemy, "doge-warrior", Position::new(x, 1.0));
    }

    c.bench_function("crowded_tick_40_units", |b| {
        b.iter_batched(
            || battle.clone(),
            |mut battle| {
                battle.tick(black_box(50));
                battle
            },
            criterion::BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, bench_single_battle, bench_idle_battle, bench_battle_batch, bench_crowded_tick);
criterion_main!(benches);
