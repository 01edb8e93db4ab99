//! # Delve
//!
//! The simulation core of a turn-based dungeon crawler: combat resolution and
//! procedural dungeon layout.
//!
//! ## Architecture Overview
//!
//! Delve keeps every piece of game logic free of presentation concerns. The
//! hosting shell supplies definition data, a battle-log sink and a persistence
//! hook, and drives turn pacing itself.
//!
//! - **Definitions**: Read-only enemy, attack, spell, summon and condition tables
//! - **Combat System**: Conditions, aggro, action resolution, creature turns and
//!   the per-encounter step queue
//! - **Generation System**: Tile-graph dungeon layout with boss placement, and
//!   enemy instantiation from definitions
//! - **Game State**: Dungeon progress, tile movement, encounter start and snapshots
//!
//! ## Determinism
//!
//! All randomness flows through a caller-provided [`rand::Rng`], so a seeded
//! `StdRng` reproduces a whole run.

pub mod combat;
pub mod data;
pub mod game;
pub mod generation;
pub mod utils;

pub use combat::*;
pub use data::*;
pub use game::*;
pub use generation::*;
pub use utils::*;

/// Core error type for the Delve engine.
#[derive(thiserror::Error, Debug)]
pub enum DelveError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// A name referenced by content data is missing from its table
    #[error("Unknown {kind}: {name}")]
    UnknownDefinition { kind: &'static str, name: String },

    /// Definition data is malformed
    #[error("Invalid definition: {0}")]
    InvalidDefinition(String),

    /// A minion with no turns left was asked to act
    #[error("Minion {name} ({id}) was not properly removed")]
    MinionNotRemoved { name: String, id: uuid::Uuid },

    /// Game state is invalid
    #[error("Invalid game state: {0}")]
    InvalidState(String),

    /// Action cannot be performed
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    /// Generation failed
    #[error("Generation failed: {0}")]
    GenerationFailed(String),
}

impl DelveError {
    /// Shorthand for a missing table entry.
    pub fn unknown(kind: &'static str, name: impl Into<String>) -> Self {
        DelveError::UnknownDefinition {
            kind,
            name: name.into(),
        }
    }
}

/// Result type used throughout the Delve codebase.
pub type DelveResult<T> = Result<T, DelveError>;

/// Version information for the crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine tuning constants.
pub mod config {
    /// Attempts per tile to place an orthogonal neighbor during dungeon growth
    pub const MAX_GROWTH_ATTEMPTS: u32 = 50;

    /// Number of farthest tiles the boss room is drawn from
    pub const BOSS_CANDIDATES: usize = 3;

    /// Default grid spacing between tiles
    pub const DEFAULT_TILE_SIZE: i32 = 60;

    /// Default room count per level
    pub const DEFAULT_NUM_TILES: usize = 10;

    /// A flee roll must exceed this on a d20
    pub const FLEE_THRESHOLD: u32 = 10;

    /// Suggested delay before the enemy acts, in milliseconds
    pub const STEP_DELAY_MS: u64 = 1000;

    /// Suggested delay before each minion acts, in milliseconds
    pub const MINION_STEP_DELAY_MS: u64 = 500;

    /// Share of pre-reduction damage returned by lifesteal
    pub const LIFESTEAL_FRACTION: f64 = 0.5;

    /// Upper bound on armor damage reduction
    pub const MAX_DAMAGE_REDUCTION: f64 = 0.925;

    /// Damage dealt by the execute condition
    pub const EXECUTE_DAMAGE: f64 = 9999.0;

    /// Threat added to each stun source when a stunned enemy skips its turn
    pub const STUN_THREAT: u32 = 10;

    /// Name of the enemy that can always be fled from
    pub const TRAINING_DUMMY: &str = "training dummy";
}
