//! The battlefield: a stable slot table of units plus the tower table.
//!
//! Unit identifiers index directly into the slot table and are never reused,
//! so a handle to a reaped unit resolves to `None` rather than to a newcomer.

use crate::game::{
    ArenaConfig, DamageOutcome, Entity, EntityRef, Faction, Position, Tower, TowerConfig, TowerId,
    TowerKind, TroopDef, Unit, UnitId,
};

/// All combat actors of a battle.
#[derive(Debug, Clone)]
pub struct Battlefield {
    arena: ArenaConfig,
    // Reaped units leave `None` behind; length equals units ever spawned.
    slots: Vec<Option<Unit>>,
    live: [Vec<UnitId>; 2],
    towers: Vec<Tower>,
}

impl Battlefield {
    /// Create a battlefield with both sides' towers at full health.
    #[must_use]
    pub fn new(arena: ArenaConfig, towers: &TowerConfig) -> Self {
        let mut table = Vec::with_capacity(6);
        for faction in Faction::ALL {
            for kind in TowerKind::ALL {
                #[allow(clippy::cast_possible_truncation)]
                let id = TowerId(table.len() as u8);
                table.push(Tower::new(id, faction, kind, towers));
            }
        }
        Self {
            arena,
            slots: Vec::new(),
            live: [Vec::new(), Vec::new()],
            towers: table,
        }
    }

    /// Arena geometry.
    #[must_use]
    pub const fn arena(&self) -> &ArenaConfig {
        &self.arena
    }

    /// Spawn a unit and return its identifier.
    pub fn spawn(&mut self, troop: &TroopDef, faction: Faction, position: Position, now: u64) -> UnitId {
        #[allow(clippy::cast_possible_truncation)]
        let id = UnitId(self.slots.len() as u32);
        self.slots.push(Some(Unit::spawn(id, troop, faction, position, now)));
        self.live[faction.index()].push(id);
        id
    }

    /// Number of units ever spawned.
    #[must_use]
    pub fn spawned(&self) -> usize {
        self.slots.len()
    }

    /// A unit still in the table (it may be destroyed but not yet reaped).
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.slots.get(id.0 as usize).and_then(Option::as_ref)
    }

    /// Mutable access to a unit still in the table.
    pub fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.slots.get_mut(id.0 as usize).and_then(Option::as_mut)
    }

    /// A unit that is alive and targetable.
    #[must_use]
    pub fn live_unit(&self, id: UnitId) -> Option<&Unit> {
        self.unit(id).filter(|u| u.is_targetable())
    }

    /// Mutable access to a unit that is alive.
    pub fn live_unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.unit_mut(id).filter(|u| u.is_targetable())
    }

    /// Identifiers in a faction's live collection, in spawn order.
    #[must_use]
    pub fn live_ids(&self, faction: Faction) -> &[UnitId] {
        &self.live[faction.index()]
    }

    /// Units in a faction's live collection (including destroyed-but-unreaped).
    pub fn units_of(&self, faction: Faction) -> impl Iterator<Item = &Unit> {
        self.live[faction.index()].iter().filter_map(|&id| self.unit(id))
    }

    /// Remove a unit from its slot for an update. Pair with [`Self::restore`].
    pub(crate) fn take(&mut self, id: UnitId) -> Option<Unit> {
        self.slots.get_mut(id.0 as usize).and_then(Option::take)
    }

    /// Put back a unit taken with [`Self::take`].
    pub(crate) fn restore(&mut self, unit: Unit) {
        if let Some(slot) = self.slots.get_mut(unit.id.0 as usize) {
            *slot = Some(unit);
        }
    }

    /// All towers in table order (player king, left, right, then enemy).
    #[must_use]
    pub fn towers(&self) -> &[Tower] {
        &self.towers
    }

    /// Mutable tower table.
    pub fn towers_mut(&mut self) -> &mut [Tower] {
        &mut self.towers
    }

    /// A tower by handle.
    #[must_use]
    pub fn tower(&self, id: TowerId) -> Option<&Tower> {
        self.towers.get(usize::from(id.0))
    }

    /// Towers of one side.
    pub fn towers_of(&self, faction: Faction) -> impl Iterator<Item = &Tower> {
        self.towers.iter().filter(move |t| t.faction == faction)
    }

    /// A side's tower in a given slot.
    #[must_use]
    pub fn tower_at(&self, faction: Faction, kind: TowerKind) -> Option<&Tower> {
        self.towers
            .iter()
            .find(|t| t.faction == faction && t.kind == kind)
    }

    /// Whether a side's king tower has fallen.
    #[must_use]
    pub fn king_destroyed(&self, faction: Faction) -> bool {
        self.tower_at(faction, TowerKind::King)
            .is_some_and(|t| t.vitals.is_destroyed())
    }

    /// Destroyed towers of one side.
    #[must_use]
    pub fn destroyed_towers(&self, faction: Faction) -> u32 {
        #[allow(clippy::cast_possible_truncation)]
        let count = self
            .towers_of(faction)
            .filter(|t| t.vitals.is_destroyed())
            .count() as u32;
        count
    }

    /// Position of a still-targetable entity.
    #[must_use]
    pub fn position_of(&self, target: EntityRef) -> Option<Position> {
        match target {
            EntityRef::Unit(id) => self.live_unit(id).map(|u| u.position),
            EntityRef::Tower(id) => self
                .tower(id)
                .filter(|t| t.is_targetable())
                .map(|t| t.position),
        }
    }

    /// Whether a handle still resolves to a targetable entity.
    #[must_use]
    pub fn is_targetable(&self, target: EntityRef) -> bool {
        self.position_of(target).is_some()
    }

    /// Apply damage through the target's reduction. Stale handles are
    /// skipped and return `None`.
    pub fn apply_damage(&mut self, target: EntityRef, amount: f32) -> Option<DamageOutcome> {
        match target {
            EntityRef::Unit(id) => self.live_unit_mut(id).map(|u| u.apply_damage(amount)),
            EntityRef::Tower(id) => self
                .towers
                .get_mut(usize::from(id.0))
                .filter(|t| t.is_targetable())
                .map(|t| t.apply_damage(amount)),
        }
    }

    /// Heal a live unit. Returns health restored.
    pub fn heal(&mut self, id: UnitId, amount: u32) -> u32 {
        self.live_unit_mut(id).map_or(0, |u| u.vitals.heal(amount))
    }

    /// Drop destroyed units from both live collections and free their slots.
    /// Returns the reaped identifiers in update order.
    pub fn reap(&mut self) -> Vec<UnitId> {
        let mut reaped = Vec::new();
        for faction in Faction::ALL {
            let (alive, dead): (Vec<UnitId>, Vec<UnitId>) = self.live[faction.index()]
                .iter()
                .partition(|&&id| self.unit(id).is_some_and(|u| u.is_targetable()));
            self.live[faction.index()] = alive;
            for id in dead {
                if let Some(slot) = self.slots.get_mut(id.0 as usize) {
                    *slot = None;
                }
                reaped.push(id);
            }
        }
        reaped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::default_troops;

    fn field() -> Battlefield {
        Battlefield::new(ArenaConfig::default(), &TowerConfig::default())
    }

    #[test]
    fn test_tower_table_layout() {
        let field = field();
        assert_eq!(field.towers().len(), 6);
        assert_eq!(field.towers()[0].kind, TowerKind::King);
        assert_eq!(field.towers()[0].faction, Faction::Player);
        assert_eq!(field.towers()[3].faction, Faction::Enemy);
        assert_eq!(field.destroyed_towers(Faction::Enemy), 0);
        assert!(!field.king_destroyed(Faction::Player));
    }

    #[test]
    fn test_spawn_assigns_sequential_ids() {
        let mut field = field();
        let troop = &default_troops()[0];
        let a = field.spawn(troop, Faction::Player, Position::new(-8.0, -18.0), 0);
        let b = field.spawn(troop, Faction::Enemy, Position::new(8.0, 18.0), 0);
        assert_eq!(a, UnitId(0));
        assert_eq!(b, UnitId(1));
        assert_eq!(field.live_ids(Faction::Player), &[a]);
        assert_eq!(field.live_ids(Faction::Enemy), &[b]);
    }

    #[test]
    fn test_reap_frees_slot_and_keeps_ids_unique() {
        let mut field = field();
        let troop = &default_troops()[0];
        let a = field.spawn(troop, Faction::Player, Position::default(), 0);
        field.apply_damage(EntityRef::Unit(a), 10_000.0);
        assert!(field.unit(a).is_some());
        assert_eq!(field.reap(), vec![a]);
        assert!(field.unit(a).is_none());
        assert!(field.live_ids(Faction::Player).is_empty());

        let b = field.spawn(troop, Faction::Player, Position::default(), 0);
        assert_ne!(a, b);
        assert!(field.apply_damage(EntityRef::Unit(a), 10.0).is_none());
    }

    #[test]
    fn test_slot_table_grows_with_spawns_only() {
        let mut field = field();
        let troop = &default_troops()[0];
        for round in 0..5 {
            let id = field.spawn(troop, Faction::Enemy, Position::default(), 0);
            field.apply_damage(EntityRef::Unit(id), 10_000.0);
            assert_eq!(field.reap(), vec![id]);
            assert_eq!(field.spawned(), round + 1);
        }
        assert!(field.live_ids(Faction::Enemy).is_empty());
        assert!((0..5).all(|i| field.unit(UnitId(i)).is_none()));
    }

    #[test]
    fn test_stale_tower_damage_skipped() {
        let mut field = field();
        let king = EntityRef::Tower(TowerId(3));
        let out = field.apply_damage(king, 5000.0).unwrap();
        assert!(out.destroyed);
        assert!(field.king_destroyed(Faction::Enemy));
        assert!(field.apply_damage(king, 5.0).is_none());
        assert_eq!(field.destroyed_towers(Faction::Enemy), 1);
    }

    #[test]
    fn test_take_and_restore() {
        let mut field = field();
        let troop = &default_troops()[0];
        let a = field.spawn(troop, Faction::Player, Position::default(), 0);
        let unit = field.take(a).unwrap();
        assert!(field.unit(a).is_none());
        field.restore(unit);
        assert!(field.unit(a).is_some());
    }
}
