//! Troop archetypes and the immutable catalog built from them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::game::{AbilityDef, AbilityEffect, AbilitySpec};

/// Immutable template of stats (and optionally an ability) for a troop type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TroopDef {
    /// Archetype key, e.g. `doge-warrior`.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Elixir cost to deploy.
    pub cost: u32,
    /// Maximum health.
    pub hp: u32,
    /// Damage per attack.
    pub damage: f32,
    /// Advance speed in distance units per second.
    pub speed: f32,
    /// Attack range in distance units.
    pub attack_range: f32,
    /// Seconds between attacks.
    pub attack_interval: f32,
    /// Special ability, if the archetype has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ability: Option<AbilityDef>,
}

impl TroopDef {
    /// Attack interval in milliseconds.
    #[must_use]
    pub fn attack_interval_ms(&self) -> f32 {
        (self.attack_interval * 1000.0).round()
    }

    /// Collect problems with this troop's numbers into `errors`.
    pub fn validate_into(&self, errors: &mut Vec<ConfigError>) {
        let field = |name: &str| format!("troops.{}.{name}", self.id);
        if self.hp == 0 {
            errors.push(ConfigError::invalid(field("hp"), "must be positive"));
        }
        if !(self.damage.is_finite() && self.damage >= 0.0) {
            errors.push(ConfigError::invalid(field("damage"), "must be non-negative"));
        }
        if !(self.speed.is_finite() && self.speed >= 0.0) {
            errors.push(ConfigError::invalid(field("speed"), "must be non-negative"));
        }
        if !(self.attack_range.is_finite() && self.attack_range > 0.0) {
            errors.push(ConfigError::invalid(field("attack_range"), "must be positive"));
        }
        if !(self.attack_interval.is_finite() && self.attack_interval > 0.0) {
            errors.push(ConfigError::invalid(field("attack_interval"), "must be positive"));
        }
        if let Some(ability) = &self.ability {
            ability.validate_into(&self.id, errors);
        }
    }
}

/// A resolved catalog entry.
#[derive(Debug, Clone)]
pub struct Archetype {
    /// Stats as configured.
    pub troop: TroopDef,
    /// Ability with its hooks resolved, if any.
    pub ability: Option<AbilitySpec>,
}

/// Lookup table of archetypes by key.
///
/// Built once per configuration and shared between battles.
#[derive(Debug, Clone)]
pub struct Catalog {
    archetypes: Vec<Archetype>,
    index: HashMap<String, usize>,
}

impl Catalog {
    /// Build a catalog, rejecting empty, duplicate or malformed entries.
    ///
    /// # Errors
    ///
    /// Returns the single problem found, or `ConfigError::Multiple`.
    pub fn new(troops: &[TroopDef]) -> Result<Self, ConfigError> {
        if troops.is_empty() {
            return Err(ConfigError::EmptyCatalog);
        }

        let mut errors = Vec::new();
        let mut index = HashMap::with_capacity(troops.len());
        let mut archetypes = Vec::with_capacity(troops.len());

        for (i, troop) in troops.iter().enumerate() {
            if troop.id.trim().is_empty() {
                errors.push(ConfigError::EmptyTroopId(i));
                continue;
            }
            if index.contains_key(&troop.id) {
                errors.push(ConfigError::DuplicateTroop(troop.id.clone()));
                continue;
            }
            troop.validate_into(&mut errors);
            index.insert(troop.id.clone(), archetypes.len());
            archetypes.push(Archetype {
                troop: troop.clone(),
                ability: troop.ability.clone().map(AbilitySpec::resolve),
            });
        }

        match errors.len() {
            0 => Ok(Self { archetypes, index }),
            1 => Err(errors.remove(0)),
            _ => Err(ConfigError::Multiple(errors)),
        }
    }

    /// Look up an archetype by key.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Archetype> {
        self.index.get(id).map(|&i| &self.archetypes[i])
    }

    /// Whether `id` names an archetype.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Archetypes in configuration order.
    pub fn iter(&self) -> impl Iterator<Item = &Archetype> {
        self.archetypes.iter()
    }

    /// Archetype keys in configuration order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.archetypes.iter().map(|a| a.troop.id.as_str())
    }

    /// Archetype at a configuration index.
    #[must_use]
    pub fn by_index(&self, i: usize) -> Option<&Archetype> {
        self.archetypes.get(i)
    }

    /// Number of archetypes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.archetypes.len()
    }

    /// Always false for a successfully built catalog.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.archetypes.is_empty()
    }
}

#[allow(clippy::too_many_arguments)]
fn troop(
    id: &str,
    name: &str,
    cost: u32,
    hp: u32,
    damage: f32,
    speed: f32,
    attack_range: f32,
    attack_interval: f32,
    ability: AbilityDef,
) -> TroopDef {
    TroopDef {
        id: id.to_string(),
        name: name.to_string(),
        cost,
        hp,
        damage,
        speed,
        attack_range,
        attack_interval,
        ability: Some(ability),
    }
}

/// The stock troop roster with every ability.
#[must_use]
#[allow(clippy::too_many_lines)]
pub fn default_troops() -> Vec<TroopDef> {
    vec![
        troop(
            "doge-warrior",
            "Doge Warrior",
            3,
            700,
            80.0,
            4.0,
            1.8,
            1.0,
            AbilityDef::new(
                "Berserker Rage",
                15_000,
                4_000,
                AbilityEffect::AttackSpeed {
                    interval_multiplier: 0.5,
                },
            ),
        ),
        troop(
            "bitcoin-knight",
            "Bitcoin Knight",
            4,
            950,
            90.0,
            3.0,
            1.8,
            1.1,
            AbilityDef::new(
                "Golden Shield",
                20_000,
                5_000,
                AbilityEffect::Shield { reduction: 0.75 },
            ),
        ),
        troop(
            "shiba-tank",
            "Shiba Tank",
            5,
            1600,
            60.0,
            2.0,
            1.5,
            1.4,
            AbilityDef::new(
                "Ground Slam",
                25_000,
                0,
                AbilityEffect::GroundSlam {
                    radius: 5.0,
                    damage: 200.0,
                },
            ),
        ),
        troop(
            "ethereum-archer",
            "Ethereum Archer",
            3,
            500,
            65.0,
            3.0,
            6.5,
            1.0,
            AbilityDef::new(
                "Multishot",
                16_000,
                0,
                AbilityEffect::Multishot {
                    max_targets: 5,
                    range_bonus: 3.0,
                },
            ),
        ),
        troop(
            "laser-punk",
            "Laser Punk",
            4,
            550,
            90.0,
            3.0,
            6.5,
            0.9,
            AbilityDef::new(
                "Overcharge",
                18_000,
                10_000,
                AbilityEffect::Overcharge {
                    shots: 3,
                    damage_multiplier: 1.5,
                },
            ),
        ),
        troop(
            "wojak-healer",
            "Wojak Healer",
            4,
            450,
            40.0,
            3.0,
            5.5,
            1.2,
            AbilityDef::new(
                "Mass Heal",
                22_000,
                0,
                AbilityEffect::MassHeal {
                    radius: 8.0,
                    amount: 150,
                },
            ),
        ),
        troop(
            "pepe-mage",
            "Pepe Mage",
            4,
            520,
            110.0,
            3.0,
            7.5,
            1.3,
            AbilityDef::new(
                "Arcane Blast",
                20_000,
                0,
                AbilityEffect::ArcaneBlast { damage: 300.0 },
            ),
        ),
        troop(
            "bonkhouse",
            "Bonkhouse",
            6,
            1200,
            120.0,
            3.0,
            1.8,
            1.2,
            AbilityDef::new(
                "Legendary Strike",
                30_000,
                2_000,
                AbilityEffect::StunStrike {
                    radius: 6.0,
                    damage: 400.0,
                    pulses: 3,
                    pulse_interval_ms: 250,
                },
            ),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog_builds() {
        let catalog = Catalog::new(&default_troops()).unwrap();
        assert_eq!(catalog.len(), 8);
        assert!(catalog.contains("bonkhouse"));
        let doge = catalog.get("doge-warrior").unwrap();
        assert_eq!(doge.troop.hp, 700);
        assert!(doge.ability.is_some());
        assert_eq!(catalog.ids().next(), Some("doge-warrior"));
    }

    #[test]
    fn test_unknown_lookup_is_none() {
        let catalog = Catalog::new(&default_troops()).unwrap();
        assert!(catalog.get("dragon").is_none());
    }

    #[test]
    fn test_duplicate_and_empty_ids_rejected() {
        let mut troops = default_troops();
        troops.push(troops[0].clone());
        let err = Catalog::new(&troops).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateTroop(ref id) if id == "doge-warrior"));

        let mut troops = default_troops();
        troops[1].id = String::new();
        let err = Catalog::new(&troops).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyTroopId(1)));

        assert!(matches!(Catalog::new(&[]), Err(ConfigError::EmptyCatalog)));
    }

    #[test]
    fn test_bad_stats_collected() {
        let mut troops = default_troops();
        troops[0].hp = 0;
        troops[0].attack_interval = 0.0;
        let err = Catalog::new(&troops).unwrap_err();
        match err {
            ConfigError::Multiple(errors) => assert_eq!(errors.len(), 2),
            other => panic!("expected multiple errors, got {other}"),
        }
    }

    #[test]
    fn test_interval_ms() {
        let troops = default_troops();
        assert!((troops[1].attack_interval_ms() - 1100.0).abs() < f32::EPSILON);
    }
}
