//! Structured text output for LLM consumption.
//!
//! This format is optimized for machine readability while remaining
//! human-parseable. It provides all relevant battle state information
//! in a structured format.

// Allow format! with push_str for readability - the allocation overhead is negligible for text rendering
#![allow(clippy::format_push_string, clippy::cast_precision_loss)]

use crate::game::{Battle, BattleSnapshot, EntityRef, Faction, TowerKind};

/// Render battle state to structured text format for LLM consumption.
///
/// Output format:
/// ```text
/// === TICK 120 (6.0s OF 180.0s) ===
///
/// PLAYER STATUS:
/// - Elixir: 7/10
/// - Hand: doge-warrior, shiba-tank, ...
/// - Crowns: 1
/// - Towers: king 3000/3000, left 0/1500 (destroyed), right 1500/1500
/// - Units (2):
///   - #3 doge-warrior at (-8.0, -4.2) hp 100% attacking tower #4
///
/// ENEMY STATUS:
/// ...
/// ```
#[must_use]
pub fn render_llm(battle: &Battle) -> String {
    let snap = battle.snapshot();
    let mut output = String::new();

    render_header(&mut output, battle);
    for faction in Faction::ALL {
        render_side(&mut output, battle, &snap, faction);
    }
    render_battle_status(&mut output, battle);

    output
}

/// Render the header.
fn render_header(output: &mut String, battle: &Battle) {
    let clock = battle.clock();
    output.push_str(&format!(
        "=== TICK {} ({:.1}s OF {:.1}s) ===\n\n",
        battle.ticks(),
        clock.elapsed_ms() as f32 / 1000.0,
        clock.duration_ms() as f32 / 1000.0
    ));
}

/// Render one side's towers, units and (for the player) economy.
fn render_side(output: &mut String, battle: &Battle, snap: &BattleSnapshot, faction: Faction) {
    output.push_str(&format!("{} STATUS:\n", faction.to_string().to_uppercase()));

    if faction == Faction::Player {
        output.push_str(&format!("- Elixir: {}/{}\n", snap.elixir, snap.elixir_capacity));
        output.push_str(&format!("- Hand: {}\n", snap.hand.join(", ")));
        if let Some(next) = &snap.next_card {
            output.push_str(&format!("- Next card: {next}\n"));
        }
        output.push_str(&format!("- Crowns: {}\n", snap.player_crowns));
    } else {
        output.push_str(&format!("- Crowns: {}\n", snap.enemy_crowns));
    }

    let towers: Vec<String> = battle
        .field()
        .towers_of(faction)
        .map(|t| {
            let name = match t.kind {
                TowerKind::King => "king",
                TowerKind::Left => "left",
                TowerKind::Right => "right",
            };
            let destroyed = if t.vitals.is_destroyed() { " (destroyed)" } else { "" };
            format!(
                "{name} {}/{}{destroyed}",
                t.vitals.health(),
                t.vitals.max_health()
            )
        })
        .collect();
    output.push_str(&format!("- Towers: {}\n", towers.join(", ")));

    let units: Vec<_> = snap.units.iter().filter(|u| u.faction == faction).collect();
    output.push_str(&format!("- Units ({}):\n", units.len()));
    for u in units {
        let action = match u.target {
            Some(EntityRef::Unit(id)) => format!("attacking unit {id}"),
            Some(EntityRef::Tower(id)) => format!("attacking tower #{}", id.0),
            None => "walking".to_string(),
        };
        let mut flags = String::new();
        if u.stunned {
            flags.push_str(" [stunned]");
        }
        if u.ability_active {
            flags.push_str(" [ability active]");
        } else if battle.catalog().get(&u.archetype).is_some_and(|a| a.ability.is_some()) {
            flags.push_str(&format!(" [ability {:.0}% ready]", u.ability_ready * 100.0));
        }
        output.push_str(&format!(
            "  - {} {} at ({:.1}, {:.1}) hp {}% {action}{flags}\n",
            u.id,
            u.archetype,
            u.position.x,
            u.position.z,
            (u.health_ratio * 100.0).round()
        ));
    }
    output.push('\n');
}

/// Render the overall battle status.
fn render_battle_status(output: &mut String, battle: &Battle) {
    output.push_str("BATTLE STATUS:\n");
    match battle.outcome() {
        Some(summary) => {
            output.push_str(&format!("- Result: {}\n", summary.result));
            output.push_str(&format!("- Reason: {:?}\n", summary.reason));
            output.push_str(&format!(
                "- Towers destroyed: {}, lost: {}\n",
                summary.towers_destroyed, summary.towers_lost
            ));
            output.push_str(&format!("- Duration: {}s\n", summary.duration_secs()));
            output.push_str(&format!("- Gold earned: {}\n", summary.gold_earned));
        }
        None => {
            output.push_str("- In progress\n");
            output.push_str(&format!(
                "- Time remaining: {:.1}s\n",
                battle.clock().remaining_ms() as f32 / 1000.0
            ));
            let next = battle
                .schedule()
                .next_due()
                .map_or_else(|| "none".to_string(), |ms| format!("{:.1}s", ms as f32 / 1000.0));
            output.push_str(&format!("- Next scheduled action: {next}\n"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BattleConfig, BattleSetup};
    use crate::game::Lane;

    #[test]
    fn test_render_llm_in_progress() {
        let mut battle = Battle::new(&BattleSetup::standard().unwrap(), 8);
        battle.deploy("doge-warrior", Lane::Right).unwrap();
        battle.tick(100);
        let output = render_llm(&battle);

        assert!(output.contains("=== TICK 1 (0.1s OF 180.0s) ==="));
        assert!(output.contains("PLAYER STATUS:"));
        assert!(output.contains("ENEMY STATUS:"));
        assert!(output.contains("- Units (1):"));
        assert!(output.contains("doge-warrior"));
        assert!(output.contains("king 3000/3000"));
        assert!(output.contains("- In progress"));
    }

    #[test]
    fn test_render_llm_finished() {
        let mut config = BattleConfig::default();
        config.battle.duration_ms = 1_000;
        let mut battle = Battle::new(&BattleSetup::from_config(config).unwrap(), 8);
        battle.run_to_end();
        let output = render_llm(&battle);

        assert!(output.contains("- Result: draw"));
        assert!(output.contains("TimeUp"));
        assert!(output.contains("- Gold earned: 50"));
    }
}
