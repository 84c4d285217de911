//! Whole-battle integration tests.
//!
//! These run battles from start to finish through the public API and check
//! that they end the way the rules say, with invariants intact throughout.
//!
//! Run with: cargo test --release battle_integration

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use crownfall::game::{check_invariants, BattleEventKind, EndReason, Faction, Lane, Position};
use crownfall::tournament::{run_battle, PilotKind};
use crownfall::{ActionError, Battle, BattleConfig, BattleResult, BattleSetup};

/// Stock config with the enemy switched off and a shorter clock.
fn quiet_setup(duration_ms: u64) -> BattleSetup {
    let mut config = BattleConfig::default();
    config.enemy_ai.enabled = false;
    config.battle.duration_ms = duration_ms;
    BattleSetup::from_config(config).unwrap()
}

fn assert_clean(battle: &Battle) {
    let violations = check_invariants(battle);
    assert!(violations.is_empty(), "invariants violated at {}ms: {violations:?}", battle.now());
}

#[test]
fn test_full_battle_no_panic() {
    let setup = BattleSetup::standard().unwrap();
    let mut battle = Battle::new(&setup, 12345);
    let dt = setup.config.battle.tick_ms;

    while !battle.is_over() {
        battle.tick(dt);
        assert_clean(&battle);
        battle.drain_events();
    }

    let summary = battle.outcome().unwrap();
    assert!(summary.duration_ms <= setup.config.battle.duration_ms);
    assert!(battle.schedule().is_empty());
}

#[test]
fn test_idle_battle_is_time_up_draw() {
    let setup = quiet_setup(5_000);
    let mut battle = Battle::new(&setup, 1);

    let summary = battle.run_to_end().unwrap().clone();
    assert_eq!(summary.result, BattleResult::Draw);
    assert_eq!(summary.reason, EndReason::TimeUp);
    assert_eq!(summary.duration_ms, 5_000);
    assert_eq!(summary.towers_destroyed, 0);
    assert_eq!(summary.towers_lost, 0);
    assert_eq!(summary.gold_earned, setup.config.rewards.draw);
}

#[test]
fn test_summary_emitted_once() {
    let setup = quiet_setup(2_000);
    let mut battle = Battle::new(&setup, 1);
    battle.run_to_end();
    for _ in 0..10 {
        battle.tick(50);
    }

    let ended = battle
        .events()
        .iter()
        .filter(|e| matches!(e.kind, BattleEventKind::BattleEnded { .. }))
        .count();
    assert_eq!(ended, 1);
    assert_eq!(battle.now(), 2_000);
}

#[test]
fn test_siege_on_enemy_king_is_victory() {
    let setup = quiet_setup(180_000);
    let mut battle = Battle::new(&setup, 7);

    for x in [-2.0, -1.0, -0.5, 0.5, 1.0, 2.0] {
        battle
            .spawn_at(Faction::Player, "shiba-tank", Position::new(x, 22.0))
            .unwrap();
    }
    let summary = battle.run_to_end().unwrap().clone();

    assert_eq!(summary.result, BattleResult::Victory);
    assert_eq!(summary.reason, EndReason::KingTower);
    assert!(summary.towers_destroyed >= 1);
    assert_eq!(
        summary.gold_earned,
        setup.config.rewards.gold(BattleResult::Victory, summary.towers_destroyed)
    );
    assert!(summary.duration_ms < 60_000);
    assert_clean(&battle);
}

#[test]
fn test_siege_on_player_king_is_defeat() {
    let setup = quiet_setup(180_000);
    let mut battle = Battle::new(&setup, 7);

    for x in [-2.0, -1.0, -0.5, 0.5, 1.0, 2.0] {
        battle
            .spawn_at(Faction::Enemy, "shiba-tank", Position::new(x, -22.0))
            .unwrap();
    }
    let summary = battle.run_to_end().unwrap().clone();

    assert_eq!(summary.result, BattleResult::Defeat);
    assert_eq!(summary.reason, EndReason::KingTower);
    assert!(summary.towers_lost >= 1);
    assert_eq!(summary.gold_earned, setup.config.rewards.defeat);
}

#[test]
fn test_actions_rejected_after_end() {
    let setup = quiet_setup(1_000);
    let mut battle = Battle::new(&setup, 3);
    let unit = battle.deploy("doge-warrior", Lane::Left).unwrap();
    battle.run_to_end();

    assert_eq!(battle.deploy("bitcoin-knight", Lane::Right), Err(ActionError::BattleOver));
    assert_eq!(battle.use_ability(unit), Err(ActionError::BattleOver));
    assert_eq!(
        battle.spawn_at(Faction::Enemy, "doge-warrior", Position::new(0.0, 0.0)),
        Err(ActionError::BattleOver)
    );
}

#[test]
fn test_elixir_gates_deployment() {
    let setup = quiet_setup(60_000);
    let mut battle = Battle::new(&setup, 1);
    assert_eq!(battle.elixir().current(), 5);

    battle.deploy("doge-warrior", Lane::Left).unwrap();
    assert_eq!(battle.elixir().current(), 2);

    // bitcoin-knight costs 4
    let before = battle.snapshot();
    let err = battle.deploy("bitcoin-knight", Lane::Right).unwrap_err();
    assert_eq!(
        err,
        ActionError::InsufficientElixir {
            required: 4,
            available: 2
        }
    );
    assert_eq!(battle.snapshot(), before);

    // Two regen intervals bring it back to 4
    for _ in 0..56 {
        battle.tick(50);
    }
    assert_eq!(battle.elixir().current(), 4);
    battle.deploy("bitcoin-knight", Lane::Right).unwrap();
    assert_eq!(battle.elixir().current(), 0);
}

#[test]
fn test_elixir_caps_at_capacity() {
    let setup = quiet_setup(60_000);
    let mut battle = Battle::new(&setup, 1);
    for _ in 0..400 {
        battle.tick(50);
    }
    assert_eq!(battle.elixir().current(), battle.elixir().capacity());
}

#[test]
fn test_deploy_cycles_hand() {
    let setup = quiet_setup(60_000);
    let mut battle = Battle::new(&setup, 1);
    let hand: Vec<String> = battle.deck().hand().to_vec();
    let next = battle.deck().next_card().unwrap().to_string();

    battle.deploy(&hand[1], Lane::Left).unwrap();
    let after = battle.deck().hand();
    assert_eq!(after[1], next);
    assert!(!battle.deck().holds(&hand[1]));
    assert_eq!(after[0], hand[0]);

    // The played card went to the back of the queue
    assert_eq!(battle.deck().queue().last(), Some(hand[1].as_str()));
}

#[test]
fn test_card_outside_hand_rejected() {
    let setup = quiet_setup(60_000);
    let mut battle = Battle::new(&setup, 1);
    // Stock deck deals the first four troops; bonkhouse is last
    assert!(!battle.deck().holds("bonkhouse"));
    assert_eq!(
        battle.deploy("bonkhouse", Lane::Left),
        Err(ActionError::CardNotInHand("bonkhouse".into()))
    );
    assert_eq!(
        battle.deploy("dragon", Lane::Left),
        Err(ActionError::UnknownArchetype("dragon".into()))
    );
    assert_eq!(battle.elixir().current(), 5);
}

#[test]
fn test_deploy_at_snaps_and_guards_half() {
    let setup = quiet_setup(60_000);
    let mut battle = Battle::new(&setup, 1);

    let err = battle.deploy_at("doge-warrior", -8.0, 5.0).unwrap_err();
    assert!(matches!(err, ActionError::InvalidDeployPosition { .. }));
    assert!(battle.field().live_ids(Faction::Player).is_empty());

    let id = battle.deploy_at("doge-warrior", 3.0, -12.0).unwrap();
    let unit = battle.field().live_unit(id).unwrap();
    let arena = setup.config.arena;
    assert!((unit.position.x - arena.right_lane_x).abs() < f32::EPSILON);
    assert!((unit.position.z - (arena.player_baseline_z + arena.spawn_offset)).abs() < f32::EPSILON);
}

#[test]
fn test_enemy_spawns_over_time() {
    let setup = BattleSetup::standard().unwrap();
    let mut battle = Battle::new(&setup, 99);
    for _ in 0..(20_000 / 50) {
        battle.tick(50);
    }
    let enemy_deploys = battle
        .events()
        .iter()
        .filter(|e| {
            matches!(
                e.kind,
                BattleEventKind::UnitDeployed {
                    faction: Faction::Enemy,
                    ..
                }
            )
        })
        .count();
    // Spawn delays are 2.6s to 5.2s
    assert!((3..=8).contains(&enemy_deploys), "got {enemy_deploys} enemy spawns");
}

#[test]
fn test_tick_size_does_not_break_end_time() {
    let setup = quiet_setup(3_000);
    for dt in [1, 16, 50, 333, 5_000] {
        let mut battle = Battle::new(&setup, 1);
        while !battle.is_over() {
            battle.tick(dt);
        }
        assert_eq!(battle.outcome().unwrap().duration_ms, 3_000, "dt={dt}");
    }
}

#[test]
fn test_pilots_finish_cleanly() {
    let setup = BattleSetup::standard().unwrap();
    for pilot in PilotKind::ALL {
        let outcome = run_battle(2024, pilot, &setup).unwrap();
        assert!(outcome.ticks > 0);
        assert_eq!(outcome.seed, 2024);
        assert_eq!(outcome.pilot, pilot);
    }
}
