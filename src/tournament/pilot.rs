//! Scripted players for headless battles.
//!
//! A pilot looks at the battle once per tick and returns the commands it
//! wants applied. Pilots only see public state, so anything a pilot does a
//! human could do through the same commands.

use std::fmt;
use std::str::FromStr;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::game::{Battle, Command, Faction, Lane, UnitState};

/// Drives the player side of a battle.
pub trait Pilot: Send {
    /// Short name for reports.
    fn name(&self) -> &'static str;

    /// Commands to apply before the next tick.
    fn decide(&mut self, battle: &Battle) -> Vec<Command>;
}

/// The built-in pilots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PilotKind {
    /// Never acts.
    Passive,
    /// Spends elixir as soon as it can and casts every ready ability.
    Greedy,
    /// Seeded random play.
    Random,
}

impl PilotKind {
    /// Every built-in pilot.
    pub const ALL: [Self; 3] = [Self::Passive, Self::Greedy, Self::Random];

    /// Build a fresh pilot. `seed` only matters for [`PilotKind::Random`].
    #[must_use]
    pub fn build(self, seed: u64) -> Box<dyn Pilot> {
        match self {
            Self::Passive => Box::new(PassivePilot),
            Self::Greedy => Box::new(GreedyPilot::default()),
            Self::Random => Box::new(RandomPilot::new(seed)),
        }
    }
}

impl fmt::Display for PilotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passive => write!(f, "passive"),
            Self::Greedy => write!(f, "greedy"),
            Self::Random => write!(f, "random"),
        }
    }
}

impl FromStr for PilotKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "passive" => Ok(Self::Passive),
            "greedy" => Ok(Self::Greedy),
            "random" => Ok(Self::Random),
            other => Err(format!("unknown pilot: {other}")),
        }
    }
}

/// Does nothing. Measures how the enemy fares against an empty board.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassivePilot;

impl Pilot for PassivePilot {
    fn name(&self) -> &'static str {
        "passive"
    }

    fn decide(&mut self, _battle: &Battle) -> Vec<Command> {
        Vec::new()
    }
}

/// Deploys the most expensive affordable card, alternating lanes, and casts
/// abilities on every unit that is ready and engaged.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyPilot {
    next_lane: Option<Lane>,
}

impl Pilot for GreedyPilot {
    fn name(&self) -> &'static str {
        "greedy"
    }

    fn decide(&mut self, battle: &Battle) -> Vec<Command> {
        let mut commands = ready_casts(battle, |state| state == UnitState::Attacking);

        let elixir = battle.elixir().current();
        let best = battle
            .deck()
            .hand()
            .iter()
            .filter_map(|card| battle.catalog().get(card).map(|a| (card, a.troop.cost)))
            .filter(|&(_, cost)| cost <= elixir)
            .max_by_key(|&(_, cost)| cost);

        if let Some((card, _)) = best {
            let lane = self.next_lane.unwrap_or(Lane::Left);
            self.next_lane = Some(lane.other());
            commands.push(Command::Deploy {
                card: card.clone(),
                lane,
            });
        }
        commands
    }
}

/// Plays a random affordable card now and then, and casts abilities at
/// random. Same seed, same choices.
#[derive(Debug, Clone)]
pub struct RandomPilot {
    rng: ChaCha8Rng,
}

impl RandomPilot {
    /// Chance per decision of trying to deploy.
    const DEPLOY_CHANCE: f64 = 0.05;
    /// Chance per ready unit of casting its ability.
    const CAST_CHANCE: f64 = 0.02;

    /// Create from a seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl Pilot for RandomPilot {
    fn name(&self) -> &'static str {
        "random"
    }

    fn decide(&mut self, battle: &Battle) -> Vec<Command> {
        let mut commands: Vec<Command> = ready_casts(battle, |_| true)
            .into_iter()
            .filter(|_| self.rng.gen_bool(Self::CAST_CHANCE))
            .collect();

        let hand = battle.deck().hand();
        if !hand.is_empty() && self.rng.gen_bool(Self::DEPLOY_CHANCE) {
            let card = &hand[self.rng.gen_range(0..hand.len())];
            let affordable = battle
                .catalog()
                .get(card)
                .is_some_and(|a| battle.elixir().can_afford(a.troop.cost));
            if affordable {
                let arena = battle.field().arena();
                let x = self.rng.gen_range(arena.left_lane_x..=arena.right_lane_x);
                let deepest = (arena.bridge_z - 1.0).max(arena.player_baseline_z);
                let z = self.rng.gen_range(arena.player_baseline_z..=deepest);
                commands.push(Command::DeployAt {
                    card: card.clone(),
                    x,
                    z,
                });
            }
        }
        commands
    }
}

/// `UseAbility` for every live player unit whose ability is off cooldown,
/// not already running and whose state passes `state_ok`.
fn ready_casts(battle: &Battle, state_ok: impl Fn(UnitState) -> bool) -> Vec<Command> {
    let now = battle.now();
    let abilities = battle.abilities();
    battle
        .field()
        .units_of(Faction::Player)
        .filter(|u| state_ok(u.state))
        .filter(|u| {
            battle
                .catalog()
                .get(&u.archetype)
                .is_some_and(|a| a.ability.is_some())
        })
        .filter(|u| !abilities.is_active(u.id) && abilities.cooldown_remaining(u.id, now) == 0)
        .map(|u| Command::UseAbility { unit: u.id })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BattleSetup;

    #[test]
    fn test_pilot_kind_parse() {
        assert_eq!("Greedy".parse::<PilotKind>(), Ok(PilotKind::Greedy));
        assert!("aggressive".parse::<PilotKind>().is_err());
        for kind in PilotKind::ALL {
            assert_eq!(kind.to_string().parse::<PilotKind>(), Ok(kind));
            assert_eq!(kind.build(0).name(), kind.to_string());
        }
    }

    #[test]
    fn test_greedy_spends_and_alternates() {
        let setup = BattleSetup::standard().unwrap();
        let battle = Battle::new(&setup, 1);
        let mut pilot = GreedyPilot::default();

        let first = pilot.decide(&battle);
        let Some(Command::Deploy { card, lane }) = first.last() else {
            panic!("expected a deploy, got {first:?}");
        };
        assert_eq!(*lane, Lane::Left);
        let cost = setup.catalog.get(card).unwrap().troop.cost;
        assert!(cost <= 5);
        for other in battle.deck().hand() {
            let other_cost = setup.catalog.get(other).unwrap().troop.cost;
            assert!(other_cost > 5 || other_cost <= cost, "{other} beats {card}");
        }

        let second = pilot.decide(&battle);
        assert!(matches!(second.last(), Some(Command::Deploy { lane: Lane::Right, .. })));
    }

    #[test]
    fn test_random_pilot_is_seeded() {
        let setup = BattleSetup::standard().unwrap();
        let mut battle = Battle::new(&setup, 3);
        let mut a = RandomPilot::new(11);
        let mut b = RandomPilot::new(11);
        for _ in 0..200 {
            let ca = a.decide(&battle);
            assert_eq!(ca, b.decide(&battle));
            for cmd in &ca {
                let _ = battle.apply(cmd);
            }
            battle.tick(50);
        }
    }

    #[test]
    fn test_random_deploys_are_legal_positions() {
        let setup = BattleSetup::standard().unwrap();
        let battle = Battle::new(&setup, 3);
        let mut pilot = RandomPilot::new(5);
        for _ in 0..500 {
            for cmd in pilot.decide(&battle) {
                if let Command::DeployAt { z, .. } = cmd {
                    assert!(battle.field().arena().player_may_deploy_at(z));
                }
            }
        }
    }
}
