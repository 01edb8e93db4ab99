//! # Generation Module
//!
//! Procedural content for a dungeon run: the tile graph of each level and
//! the creatures met on it.
//!
//! Generation is a pure computation over a seeded [`StdRng`], so the same
//! [`GenerationConfig`] always yields the same level.

pub mod dungeon;
pub mod encounters;

pub use dungeon::*;
pub use encounters::*;

use crate::config::{BOSS_CANDIDATES, DEFAULT_NUM_TILES, DEFAULT_TILE_SIZE, MAX_GROWTH_ATTEMPTS};
use crate::DelveResult;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Configuration for tile graph generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Random seed for reproducible generation
    pub seed: u64,
    /// Target number of tiles; growth is best effort
    pub num_tiles: usize,
    /// Grid spacing between neighboring tiles
    pub tile_size: i32,
    /// Skips boss placement when the level's boss is already dead
    pub boss_defeated: bool,
    /// Neighbor placements tried per growth step
    pub max_growth_attempts: u32,
    /// How many of the farthest tiles the boss room is drawn from
    pub boss_candidates: usize,
}

impl GenerationConfig {
    /// Creates a configuration with the default level size.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::GenerationConfig;
    ///
    /// let config = GenerationConfig::new(7);
    /// assert_eq!(config.num_tiles, 10);
    /// assert!(!config.boss_defeated);
    /// ```
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            num_tiles: DEFAULT_NUM_TILES,
            tile_size: DEFAULT_TILE_SIZE,
            boss_defeated: false,
            max_growth_attempts: MAX_GROWTH_ATTEMPTS,
            boss_candidates: BOSS_CANDIDATES,
        }
    }

    /// Small levels on a unit grid.
    pub fn for_testing(seed: u64) -> Self {
        Self {
            num_tiles: 6,
            tile_size: 1,
            ..Self::new(seed)
        }
    }

    pub fn with_num_tiles(mut self, num_tiles: usize) -> Self {
        self.num_tiles = num_tiles;
        self
    }

    pub fn with_tile_size(mut self, tile_size: i32) -> Self {
        self.tile_size = tile_size;
        self
    }

    pub fn with_boss_defeated(mut self, boss_defeated: bool) -> Self {
        self.boss_defeated = boss_defeated;
        self
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::new(42)
    }
}

/// Trait for procedural generators.
pub trait Generator<T> {
    /// Generates content using the provided configuration and random number generator.
    fn generate(&self, config: &GenerationConfig, rng: &mut StdRng) -> DelveResult<T>;

    /// Validates that the generated content meets requirements.
    fn validate(&self, content: &T, config: &GenerationConfig) -> DelveResult<()>;

    /// Generator name for logging.
    fn generator_type(&self) -> &'static str;
}

/// Creates a seeded random number generator from the config.
pub fn create_rng(config: &GenerationConfig) -> StdRng {
    StdRng::seed_from_u64(config.seed)
}
