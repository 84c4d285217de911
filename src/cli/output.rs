//! Output formatting utilities for CLI.

use crownfall::tournament::{BattleOutcome, PilotKind, TournamentStats};
use serde::Serialize;

/// Format a battle outcome as human-readable text.
pub(super) fn format_text(outcome: &BattleOutcome) -> String {
    let summary = &outcome.summary;
    let mut output = String::new();

    output.push_str(&format!("Battle Result (seed: {}, pilot: {})\n", outcome.seed, outcome.pilot));
    output.push_str(&format!(
        "  Result: {} ({:?})\n",
        summary.result.to_string().to_uppercase(),
        summary.reason
    ));
    output.push_str(&format!(
        "  Crowns: {} taken, {} lost\n",
        summary.towers_destroyed, summary.towers_lost
    ));
    output.push_str(&format!(
        "  Duration: {}s ({} ticks)\n",
        summary.duration_secs(),
        outcome.ticks
    ));
    output.push_str(&format!("  Gold earned: {}\n\n", summary.gold_earned));
    output.push_str(&format!(
        "  Units deployed: {} player, {} enemy\n",
        outcome.units_deployed[0], outcome.units_deployed[1]
    ));
    output.push_str(&format!("  Abilities cast: {}\n", outcome.abilities_cast));
    output.push_str(&format!(
        "  Commands: {} applied, {} rejected\n",
        outcome.commands_applied, outcome.commands_rejected
    ));

    output
}

/// JSON-serializable tournament result.
#[derive(Debug, Serialize)]
pub(super) struct JsonTournamentResult {
    /// Pilot used for every battle.
    pilot: PilotKind,
    /// First seed.
    base_seed: u64,
    /// Raw tallies.
    stats: TournamentStats,
    /// Victory rate (0.0-1.0).
    victory_rate: f64,
    /// Draw rate (0.0-1.0).
    draw_rate: f64,
    /// Defeat rate (0.0-1.0).
    defeat_rate: f64,
    /// Average crowns taken.
    avg_crowns: f64,
    /// Average crowns lost.
    avg_crowns_lost: f64,
    /// Average battle length in seconds.
    avg_duration_secs: f64,
    /// Average gold.
    avg_gold: f64,
}

impl JsonTournamentResult {
    /// Create from stats.
    pub(super) fn from_stats(stats: &TournamentStats, pilot: PilotKind, base_seed: u64) -> Self {
        Self {
            pilot,
            base_seed,
            stats: *stats,
            victory_rate: stats.victory_rate(),
            draw_rate: stats.draw_rate(),
            defeat_rate: stats.defeat_rate(),
            avg_crowns: stats.avg_crowns(),
            avg_crowns_lost: stats.avg_crowns_lost(),
            avg_duration_secs: stats.avg_duration_secs(),
            avg_gold: stats.avg_gold(),
        }
    }
}

/// Format tournament stats as human-readable text.
pub(super) fn format_tournament_text(stats: &TournamentStats, pilot: PilotKind) -> String {
    let mut output = String::new();

    output.push_str(&format!("Tournament Results ({} battles, pilot: {pilot})\n", stats.battles));
    output.push_str("========================================\n\n");

    output.push_str("Outcomes:\n");
    output.push_str(&format!(
        "  Victories: {:.1}% ({})\n",
        stats.victory_rate() * 100.0,
        stats.victories
    ));
    output.push_str(&format!("  Draws:     {:.1}% ({})\n", stats.draw_rate() * 100.0, stats.draws));
    output.push_str(&format!(
        "  Defeats:   {:.1}% ({})\n",
        stats.defeat_rate() * 100.0,
        stats.defeats
    ));
    output.push_str(&format!("  King tower finishes: {}\n\n", stats.king_finishes));

    output.push_str("Averages per battle:\n");
    output.push_str(&format!("  Crowns taken: {:.2}\n", stats.avg_crowns()));
    output.push_str(&format!("  Crowns lost:  {:.2}\n", stats.avg_crowns_lost()));
    output.push_str(&format!("  Duration:     {:.1}s\n", stats.avg_duration_secs()));
    output.push_str(&format!("  Gold:         {:.1}\n", stats.avg_gold()));

    output.push_str(&format!(
        "\nUnits deployed: {} player, {} enemy; abilities cast: {}\n",
        stats.units_deployed[0], stats.units_deployed[1], stats.abilities_cast
    ));

    output
}

/// Format tournament stats as CSV.
pub(super) fn format_tournament_csv(stats: &TournamentStats, pilot: PilotKind) -> String {
    let mut output = String::new();

    output.push_str(
        "pilot,battles,victories,draws,defeats,victory_rate,avg_crowns,avg_crowns_lost,avg_duration_secs,avg_gold\n",
    );
    output.push_str(&format!(
        "{},{},{},{},{},{:.4},{:.3},{:.3},{:.2},{:.2}\n",
        pilot,
        stats.battles,
        stats.victories,
        stats.draws,
        stats.defeats,
        stats.victory_rate(),
        stats.avg_crowns(),
        stats.avg_crowns_lost(),
        stats.avg_duration_secs(),
        stats.avg_gold()
    ));

    output
}
