//! Serializable views of a battle for rendering collaborators.

use serde::{Deserialize, Serialize};

use crate::game::{
    Battle, BattleResult, EntityRef, Faction, Position, TowerId, TowerKind, UnitId, UnitState,
};

/// One unit as the renderer sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitView {
    /// Identifier.
    pub id: UnitId,
    /// Archetype key.
    pub archetype: String,
    /// Side.
    pub faction: Faction,
    /// Location.
    pub position: Position,
    /// Current health.
    pub health: u32,
    /// Health over maximum.
    pub health_ratio: f32,
    /// Walking or attacking.
    pub state: UnitState,
    /// Whether stunned.
    pub stunned: bool,
    /// Current target.
    pub target: Option<EntityRef>,
    /// Whether an ability is live.
    pub ability_active: bool,
    /// Ability readiness in `[0, 1]`.
    pub ability_ready: f32,
}

/// One tower as the renderer sees it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TowerView {
    /// Identifier.
    pub id: TowerId,
    /// Side.
    pub faction: Faction,
    /// King or side.
    pub kind: TowerKind,
    /// Location.
    pub position: Position,
    /// Current health.
    pub health: u32,
    /// Health over maximum.
    pub health_ratio: f32,
    /// Whether destroyed.
    pub destroyed: bool,
}

/// Everything a frame needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleSnapshot {
    /// Battle time.
    pub at_ms: u64,
    /// Time left.
    pub remaining_ms: u64,
    /// Player elixir.
    pub elixir: u32,
    /// Elixir capacity.
    pub elixir_capacity: u32,
    /// Cards in hand.
    pub hand: Vec<String>,
    /// Next card to be drawn.
    pub next_card: Option<String>,
    /// Enemy towers destroyed.
    pub player_crowns: u32,
    /// Player towers destroyed.
    pub enemy_crowns: u32,
    /// Live units, player side first.
    pub units: Vec<UnitView>,
    /// All towers.
    pub towers: Vec<TowerView>,
    /// Set once the battle has ended.
    pub result: Option<BattleResult>,
}

impl BattleSnapshot {
    /// Capture the current state of `battle`.
    #[must_use]
    pub fn capture(battle: &Battle) -> Self {
        let field = battle.field();
        let now = battle.now();
        let abilities = battle.abilities();
        let (player_crowns, enemy_crowns) = battle.crowns();

        let units = Faction::ALL
            .into_iter()
            .flat_map(|f| field.units_of(f))
            .map(|u| UnitView {
                id: u.id,
                archetype: u.archetype.clone(),
                faction: u.faction,
                position: u.position,
                health: u.vitals.health(),
                health_ratio: u.vitals.ratio(),
                state: u.state,
                stunned: u.stunned,
                target: u.target,
                ability_active: abilities.is_active(u.id),
                ability_ready: abilities.percent_ready(u.id, now),
            })
            .collect();

        let towers = field
            .towers()
            .iter()
            .map(|t| TowerView {
                id: t.id,
                faction: t.faction,
                kind: t.kind,
                position: t.position,
                health: t.vitals.health(),
                health_ratio: t.vitals.ratio(),
                destroyed: t.vitals.is_destroyed(),
            })
            .collect();

        Self {
            at_ms: now,
            remaining_ms: battle.clock().remaining_ms(),
            elixir: battle.elixir().current(),
            elixir_capacity: battle.elixir().capacity(),
            hand: battle.deck().hand().to_vec(),
            next_card: battle.deck().next_card().map(str::to_string),
            player_crowns,
            enemy_crowns,
            units,
            towers,
            result: battle.outcome().map(|s| s.result),
        }
    }

    /// A unit by id.
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&UnitView> {
        self.units.iter().find(|u| u.id == id)
    }
}
