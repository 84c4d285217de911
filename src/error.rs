//! Error types for battle actions and configuration.
//!
//! Rejected actions never mutate battle state. A stale handle (an entity
//! destroyed between capture and use) is never an error; it is skipped.

use thiserror::Error;

/// A player or AI action the battle refused.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ActionError {
    /// The battle has reached its terminal state.
    #[error("battle is over")]
    BattleOver,

    /// The archetype key is not in the catalog.
    #[error("unknown archetype: {0}")]
    UnknownArchetype(String),

    /// The card exists but is not currently in the player's hand.
    #[error("card not in hand: {0}")]
    CardNotInHand(String),

    /// Not enough elixir to pay for the action.
    #[error("insufficient elixir: need {required}, have {available}")]
    InsufficientElixir {
        /// Elixir cost of the action.
        required: u32,
        /// Elixir currently available.
        available: u32,
    },

    /// Deploy position is outside the player's half of the arena.
    #[error("invalid deploy position ({x:.1}, {z:.1})")]
    InvalidDeployPosition {
        /// Requested x coordinate.
        x: f32,
        /// Requested z coordinate.
        z: f32,
    },

    /// No live unit carries this identifier.
    #[error("unknown unit: {0}")]
    UnknownUnit(u32),

    /// The unit's archetype has no special ability.
    #[error("unit {0} has no ability")]
    NoAbility(u32),

    /// The ability was used too recently.
    #[error("ability on cooldown for {remaining_ms}ms")]
    AbilityOnCooldown {
        /// Milliseconds until the ability is ready.
        remaining_ms: u64,
    },

    /// A timed ability of this unit is still running.
    #[error("ability of unit {0} is still active")]
    AbilityActive(u32),
}

/// A problem with a battle configuration or troop catalog.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Two troops share an identifier.
    #[error("duplicate troop id: {0}")]
    DuplicateTroop(String),

    /// A troop has an empty identifier.
    #[error("troop at index {0} has an empty id")]
    EmptyTroopId(usize),

    /// A deck entry names a troop that is not in the catalog.
    #[error("deck references unknown troop: {0}")]
    UnknownDeckEntry(String),

    /// The deck cannot fill a hand.
    #[error("deck has {found} cards, need at least {required}")]
    DeckTooSmall {
        /// Cards in the configured deck.
        found: usize,
        /// Hand size.
        required: usize,
    },

    /// A numeric field is out of its valid range.
    #[error("invalid value for {field}: {reason}")]
    InvalidValue {
        /// Dotted path of the offending field.
        field: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The catalog has no troops at all.
    #[error("troop catalog is empty")]
    EmptyCatalog,

    /// TOML could not be parsed into a config.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Config file could not be read or written.
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),

    /// Several problems were found at once.
    #[error("{} config errors, first: {}", .0.len(), .0.first().map_or_else(String::new, ToString::to_string))]
    Multiple(Vec<ConfigError>),
}

impl ConfigError {
    /// Build an `InvalidValue` error.
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for battle actions.
pub type ActionResult<T> = Result<T, ActionError>;
