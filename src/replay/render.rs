//! ASCII renderer for terminal viewing with ANSI colors.

// Grid maths on small arena coordinates
#![allow(
    clippy::format_push_string,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]

use crate::game::{Battle, BattleSnapshot, Faction, Position, TowerKind, UnitView};

/// ANSI color codes per faction.
const FACTION_COLORS: [&str; 2] = [
    "\x1b[34m", // Player: Blue
    "\x1b[31m", // Enemy: Red
];

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GRAY: &str = "\x1b[90m";
const YELLOW: &str = "\x1b[33m";

/// World units per column.
const CELL_X: f32 = 1.0;
/// World units per row.
const CELL_Z: f32 = 2.0;
/// Empty border around the outermost towers.
const MARGIN: f32 = 2.0;

/// Render battle state to ASCII with ANSI colors.
///
/// Enemy side is at the top. Output format:
/// ```text
/// Tick 120  6.0s / 180.0s          Elixir 7/10   Crowns 1-0
/// ┌───────────────────────────┐
/// │ .  .  T  .  .  K  .  .  T │
/// │ .  :  .  .  d  .  .  :  . │
/// │ ~  ~  ~  ~  ~  ~  ~  ~  ~ │
/// └───────────────────────────┘
/// ```
#[must_use]
pub fn render_ascii(battle: &Battle) -> String {
    let snap = battle.snapshot();
    let mut output = String::new();

    render_header(&mut output, battle, &snap);
    render_field(&mut output, battle, &snap);

    output.push_str(
        "\nLegend: K=King  T=Tower  x=Destroyed  :=Lane  ~=Bridge  a-z=Unit  *=Stunned  \
         (blue=player, red=enemy)\n\n",
    );

    render_units(&mut output, &snap);

    output.push_str(&format!("\nHand: {}", snap.hand.join(", ")));
    if let Some(next) = &snap.next_card {
        output.push_str(&format!("   Next: {next}"));
    }
    output.push('\n');

    if let Some(summary) = battle.outcome() {
        output.push_str(&format!(
            "\n{BOLD}{}{RESET} ({:?}) - crowns {}-{}, gold {}\n",
            summary.result.to_string().to_uppercase(),
            summary.reason,
            summary.towers_destroyed,
            summary.towers_lost,
            summary.gold_earned
        ));
    }

    output.push_str("\n[<] Back  [>] Forward  [g] Goto tick  [q] Quit\n");
    output
}

fn render_header(output: &mut String, battle: &Battle, snap: &BattleSnapshot) {
    let clock = battle.clock();
    let left = format!(
        "Tick {}  {:.1}s / {:.1}s",
        battle.ticks(),
        clock.elapsed_ms() as f32 / 1000.0,
        clock.duration_ms() as f32 / 1000.0
    );
    output.push_str(&left);
    for _ in 0..36usize.saturating_sub(left.len()) {
        output.push(' ');
    }
    output.push_str(&format!(
        "{YELLOW}Elixir {}/{}{RESET}   Crowns {}{}{RESET}-{}{}{RESET}\n",
        snap.elixir,
        snap.elixir_capacity,
        FACTION_COLORS[0],
        snap.player_crowns,
        FACTION_COLORS[1],
        snap.enemy_crowns
    ));
}

/// World bounds `(min_x, max_x, min_z, max_z)` covering every tower.
fn bounds(snap: &BattleSnapshot) -> (f32, f32, f32, f32) {
    let (mut min_x, mut max_x, mut min_z, mut max_z) = (0.0f32, 0.0f32, 0.0f32, 0.0f32);
    for t in &snap.towers {
        min_x = min_x.min(t.position.x);
        max_x = max_x.max(t.position.x);
        min_z = min_z.min(t.position.z);
        max_z = max_z.max(t.position.z);
    }
    (min_x - MARGIN, max_x + MARGIN, min_z - MARGIN, max_z + MARGIN)
}

fn render_field(output: &mut String, battle: &Battle, snap: &BattleSnapshot) {
    let (min_x, max_x, min_z, max_z) = bounds(snap);
    let cols = ((max_x - min_x) / CELL_X).round() as usize + 1;
    let rows = ((max_z - min_z) / CELL_Z).round() as usize + 1;

    let cell_of = |p: Position| -> Option<(usize, usize)> {
        let col = ((p.x - min_x) / CELL_X).round();
        let row = ((max_z - p.z) / CELL_Z).round();
        (col >= 0.0 && row >= 0.0 && (col as usize) < cols && (row as usize) < rows)
            .then(|| (row as usize, col as usize))
    };

    // Terrain
    let arena = battle.field().arena();
    let mut grid: Vec<Vec<String>> = (0..rows)
        .map(|_| (0..cols).map(|_| format!("{GRAY}.{RESET}")).collect())
        .collect();
    for row in 0..rows {
        let z = max_z - row as f32 * CELL_Z;
        for x in [arena.left_lane_x, arena.right_lane_x] {
            if let Some((r, c)) = cell_of(Position::new(x, z)) {
                grid[r][c] = format!("{GRAY}:{RESET}");
            }
        }
    }
    if let Some((bridge_row, _)) = cell_of(Position::new(min_x, arena.bridge_z)) {
        for cell in &mut grid[bridge_row] {
            *cell = format!("{DIM}~{RESET}");
        }
    }

    // Towers, then units on top
    for t in &snap.towers {
        if let Some((r, c)) = cell_of(t.position) {
            let color = FACTION_COLORS[t.faction.index()];
            let symbol = match (t.destroyed, t.kind) {
                (true, _) => 'x',
                (false, TowerKind::King) => 'K',
                (false, _) => 'T',
            };
            grid[r][c] = format!("{color}{BOLD}{symbol}{RESET}");
        }
    }
    for u in &snap.units {
        if let Some((r, c)) = cell_of(u.position) {
            let color = FACTION_COLORS[u.faction.index()];
            grid[r][c] = format!("{color}{}{RESET}", unit_symbol(u));
        }
    }

    let width = cols * 2 + 1;
    output.push('┌');
    output.push_str(&"─".repeat(width));
    output.push_str("┐\n");
    for row in grid {
        output.push_str("│ ");
        for cell in row {
            output.push_str(&cell);
            output.push(' ');
        }
        output.push_str("│\n");
    }
    output.push('└');
    output.push_str(&"─".repeat(width));
    output.push_str("┘\n");
}

/// First letter of the archetype, or `*` while stunned.
fn unit_symbol(unit: &UnitView) -> char {
    if unit.stunned {
        return '*';
    }
    unit.archetype
        .chars()
        .next()
        .map_or('?', |c| c.to_ascii_lowercase())
}

fn render_units(output: &mut String, snap: &BattleSnapshot) {
    for faction in Faction::ALL {
        let color = FACTION_COLORS[faction.index()];
        let units: Vec<&UnitView> = snap.units.iter().filter(|u| u.faction == faction).collect();
        output.push_str(&format!("{color}{faction} units ({}){RESET}\n", units.len()));
        for u in units {
            let ability = if u.ability_active {
                " [ABILITY]".to_string()
            } else if u.ability_ready < 1.0 {
                format!(" [{:.0}%]", u.ability_ready * 100.0)
            } else {
                String::new()
            };
            output.push_str(&format!(
                "  {} {:<14} hp {:>5} ({:>3.0}%)  ({:>5.1}, {:>5.1})  {:?}{}{}\n",
                u.id,
                u.archetype,
                u.health,
                u.health_ratio * 100.0,
                u.position.x,
                u.position.z,
                u.state,
                if u.stunned { " stunned" } else { "" },
                ability
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BattleSetup;
    use crate::game::{Lane, UnitId, UnitState};

    #[test]
    fn test_render_ascii_basic() {
        let mut battle = Battle::new(&BattleSetup::standard().unwrap(), 2);
        battle.deploy("doge-warrior", Lane::Left).unwrap();
        battle.tick(50);
        let output = render_ascii(&battle);

        assert!(output.contains("Tick 1"));
        assert!(output.contains("┌"));
        assert!(output.contains("┘"));
        assert!(output.contains("Legend"));
        assert!(output.contains("doge-warrior"));
        assert!(output.contains("Hand:"));
        // Six towers on the field
        assert_eq!(output.matches(&format!("{BOLD}K{RESET}")).count(), 2);
        assert_eq!(output.matches(&format!("{BOLD}T{RESET}")).count(), 4);
    }

    #[test]
    fn test_unit_symbol() {
        let mut view = UnitView {
            id: UnitId(1),
            archetype: "Shiba-tank".into(),
            faction: Faction::Enemy,
            position: Position::new(0.0, 0.0),
            health: 10,
            health_ratio: 1.0,
            state: UnitState::Walking,
            stunned: false,
            target: None,
            ability_active: false,
            ability_ready: 1.0,
        };
        assert_eq!(unit_symbol(&view), 's');
        view.stunned = true;
        assert_eq!(unit_symbol(&view), '*');
        view.stunned = false;
        view.archetype = String::new();
        assert_eq!(unit_symbol(&view), '?');
    }
}
