//! # Dungeon Generation
//!
//! Tile-graph generation for a dungeon level and the per-instance level
//! progression it is driven by.
//!
//! A level is a set of tiles on a grid spaced `tile_size` apart. Generation:
//! 1. Places a cleared start tile at a random grid cell
//! 2. Grows the set by walking a cursor over the placed tiles in placement
//!    order, trying random orthogonal neighbors of each
//! 3. Marks one of the tiles farthest from the start (by BFS hop count) as
//!    the boss room, unless the level's boss is already defeated

use crate::{DelveError, DelveResult, Direction, GenerationConfig, Generator, Position};
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};

/// A room on the dungeon map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tile {
    pub x: i32,
    pub y: i32,
    /// The room's encounter has been resolved
    pub cleared_room: bool,
    pub is_boss_room: bool,
}

impl Tile {
    pub fn new(position: Position) -> Self {
        Self {
            x: position.x,
            y: position.y,
            cleared_room: false,
            is_boss_room: false,
        }
    }

    pub fn position(&self) -> Position {
        Position::new(self.x, self.y)
    }
}

/// Extent of a tile set, for layout by a renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub width: i32,
    pub height: i32,
    pub offset_x: i32,
    pub offset_y: i32,
}

/// Computes the box enclosing every tile, each tile `tile_size` wide.
///
/// Returns `None` for an empty tile set.
///
/// # Examples
///
/// ```
/// use delve::{bounding_box, Position, Tile};
///
/// let tiles = vec![Tile::new(Position::new(60, 0)), Tile::new(Position::new(120, 60))];
/// let bounds = bounding_box(&tiles, 60).unwrap();
/// assert_eq!((bounds.width, bounds.height), (120, 120));
/// assert_eq!((bounds.offset_x, bounds.offset_y), (60, 0));
/// ```
pub fn bounding_box(tiles: &[Tile], tile_size: i32) -> Option<BoundingBox> {
    let min_x = tiles.iter().map(|t| t.x).min()?;
    let max_x = tiles.iter().map(|t| t.x).max()?;
    let min_y = tiles.iter().map(|t| t.y).min()?;
    let max_y = tiles.iter().map(|t| t.y).max()?;

    Some(BoundingBox {
        width: max_x - min_x + tile_size,
        height: max_y - min_y + tile_size,
        offset_x: min_x,
        offset_y: min_y,
    })
}

/// Hop distance from `tiles[0]` to every reachable tile over 4-directional
/// adjacency, as `(tile index, distance)` pairs in BFS discovery order.
pub fn bfs_distances(tiles: &[Tile], tile_size: i32) -> Vec<(usize, u32)> {
    let index: HashMap<Position, usize> = tiles
        .iter()
        .enumerate()
        .map(|(i, tile)| (tile.position(), i))
        .collect();

    let mut order = Vec::with_capacity(tiles.len());
    if tiles.is_empty() {
        return order;
    }

    let mut seen = HashSet::new();
    let mut queue = VecDeque::new();
    seen.insert(0);
    queue.push_back((0, 0));

    while let Some((current, distance)) = queue.pop_front() {
        order.push((current, distance));
        for neighbor in tiles[current].position().cardinal_neighbors(tile_size) {
            if let Some(&next) = index.get(&neighbor) {
                if seen.insert(next) {
                    queue.push_back((next, distance + 1));
                }
            }
        }
    }

    order
}

/// Builds a level's tile graph with a far-away boss room.
#[derive(Debug, Clone, Default)]
pub struct TileGraphGenerator;

impl TileGraphGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Places the start tile and grows the set toward `config.num_tiles`.
    ///
    /// Growth is best effort: when a full pass of the cursor over every
    /// tile places nothing, the level stays smaller than requested. Fails
    /// when the grid the level can spread over does not fit in `i32`.
    pub fn grow_tiles(
        &self,
        config: &GenerationConfig,
        rng: &mut StdRng,
    ) -> DelveResult<Vec<Tile>> {
        let target = config.num_tiles.max(1);
        // Growth never reaches past twice the target on either axis
        let cells = i32::try_from(target)
            .ok()
            .filter(|cells| {
                cells
                    .checked_mul(2)
                    .and_then(|span| span.checked_mul(config.tile_size))
                    .is_some()
            })
            .ok_or_else(|| {
                DelveError::GenerationFailed(format!(
                    "{} tiles of size {} overflow the map grid",
                    target, config.tile_size
                ))
            })?;
        let start = Position::new(
            rng.gen_range(0..cells) * config.tile_size,
            rng.gen_range(0..cells) * config.tile_size,
        );

        let mut tiles = vec![Tile {
            cleared_room: true,
            ..Tile::new(start)
        }];
        let mut occupied: HashSet<Position> = HashSet::from([start]);

        let mut cursor = 0;
        let mut misses = 0;
        while tiles.len() < target && misses < tiles.len() {
            let anchor = tiles[cursor].position();
            match self.try_neighbor(anchor, &occupied, config, rng) {
                Some(position) => {
                    occupied.insert(position);
                    tiles.push(Tile::new(position));
                    misses = 0;
                }
                None => misses += 1,
            }
            cursor = (cursor + 1) % tiles.len();
        }

        if tiles.len() < target {
            log::warn!(
                "Tile growth stalled at {} of {} tiles",
                tiles.len(),
                target
            );
        }
        Ok(tiles)
    }

    fn try_neighbor(
        &self,
        anchor: Position,
        occupied: &HashSet<Position>,
        config: &GenerationConfig,
        rng: &mut StdRng,
    ) -> Option<Position> {
        let directions = Direction::cardinal();
        for _ in 0..config.max_growth_attempts {
            let direction = directions[rng.gen_range(0..directions.len())];
            let candidate = anchor.step(direction, config.tile_size);
            if candidate.is_on_grid(config.tile_size) && !occupied.contains(&candidate) {
                return Some(candidate);
            }
        }
        None
    }

    /// Marks a boss room among the tiles farthest from the start.
    ///
    /// Candidates are the `boss_candidates` greatest BFS distances, ties
    /// kept in discovery order; the start tile is never chosen. Returns the
    /// chosen tile index.
    pub fn place_boss(
        &self,
        tiles: &mut [Tile],
        config: &GenerationConfig,
        rng: &mut StdRng,
    ) -> Option<usize> {
        let mut ranked: Vec<(usize, u32)> = bfs_distances(tiles, config.tile_size)
            .into_iter()
            .filter(|&(index, _)| index != 0)
            .collect();
        if ranked.is_empty() {
            return None;
        }

        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        let candidates = &ranked[..config.boss_candidates.clamp(1, ranked.len())];
        let (chosen, distance) = candidates[rng.gen_range(0..candidates.len())];
        tiles[chosen].is_boss_room = true;

        log::info!(
            "Boss room placed {} step(s) from the entrance at ({}, {})",
            distance,
            tiles[chosen].x,
            tiles[chosen].y
        );
        Some(chosen)
    }
}

impl Generator<Vec<Tile>> for TileGraphGenerator {
    fn generate(&self, config: &GenerationConfig, rng: &mut StdRng) -> DelveResult<Vec<Tile>> {
        if config.tile_size <= 0 {
            return Err(DelveError::GenerationFailed(format!(
                "tile size must be positive, got {}",
                config.tile_size
            )));
        }

        let mut tiles = self.grow_tiles(config, rng)?;
        if !config.boss_defeated {
            self.place_boss(&mut tiles, config, rng);
        }

        self.validate(&tiles, config)?;
        log::info!(
            "Generated {} tiles (seed {}, boss defeated: {})",
            tiles.len(),
            config.seed,
            config.boss_defeated
        );
        Ok(tiles)
    }

    fn validate(&self, tiles: &Vec<Tile>, config: &GenerationConfig) -> DelveResult<()> {
        let fail = |reason: String| Err(DelveError::GenerationFailed(reason));

        let start = match tiles.first() {
            Some(start) => start,
            None => return fail("no tiles generated".to_string()),
        };
        if !start.cleared_room || start.is_boss_room {
            return fail("start tile must be cleared and not a boss room".to_string());
        }

        let unique: HashSet<Position> = tiles.iter().map(Tile::position).collect();
        if unique.len() != tiles.len() {
            return fail("two tiles share coordinates".to_string());
        }
        if let Some(tile) = tiles
            .iter()
            .find(|t| !t.position().is_on_grid(config.tile_size))
        {
            return fail(format!("tile ({}, {}) is off the grid", tile.x, tile.y));
        }

        let cleared = tiles.iter().filter(|t| t.cleared_room).count();
        if cleared != 1 {
            return fail(format!("expected one cleared tile, found {}", cleared));
        }
        let bosses = tiles.iter().filter(|t| t.is_boss_room).count();
        let expected = usize::from(!config.boss_defeated && tiles.len() > 1);
        if bosses != expected {
            return fail(format!("expected {} boss room(s), found {}", expected, bosses));
        }

        if bfs_distances(tiles, config.tile_size).len() != tiles.len() {
            return fail("tile graph is not connected".to_string());
        }
        Ok(())
    }

    fn generator_type(&self) -> &'static str {
        "TileGraphGenerator"
    }
}

/// Generates a level's tiles with [`TileGraphGenerator`].
///
/// The start tile is always `tiles[0]`.
pub fn generate_tiles(config: &GenerationConfig, rng: &mut StdRng) -> DelveResult<Vec<Tile>> {
    TileGraphGenerator::new().generate(config, rng)
}

/// One level of a dungeon instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DungeonLevel {
    pub level: u32,
    /// Boss names; the first leads the boss fight
    #[serde(default)]
    pub bosses: Vec<String>,
    /// Enemy names a normal encounter is drawn from
    #[serde(default)]
    pub enemies: Vec<String>,
    #[serde(alias = "tiles")]
    pub num_tiles: usize,
    #[serde(default)]
    pub unlocked: bool,
    #[serde(default)]
    pub boss_defeated: bool,
}

impl DungeonLevel {
    /// The first level is always open.
    pub fn is_open(&self) -> bool {
        self.unlocked || self.level == 1
    }

    /// Generation settings for entering this level.
    pub fn generation_config(&self, seed: u64) -> GenerationConfig {
        GenerationConfig::new(seed)
            .with_num_tiles(self.num_tiles)
            .with_boss_defeated(self.boss_defeated)
    }
}

/// A named dungeon and its ordered levels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DungeonInstance {
    pub name: String,
    pub levels: Vec<DungeonLevel>,
}

impl DungeonInstance {
    pub fn level(&self, depth: u32) -> DelveResult<&DungeonLevel> {
        self.levels
            .iter()
            .find(|l| l.level == depth)
            .ok_or_else(|| DelveError::unknown("dungeon level", format!("{} {}", self.name, depth)))
    }

    pub fn level_mut(&mut self, depth: u32) -> DelveResult<&mut DungeonLevel> {
        let name = self.name.clone();
        self.levels
            .iter_mut()
            .find(|l| l.level == depth)
            .ok_or_else(|| DelveError::unknown("dungeon level", format!("{} {}", name, depth)))
    }

    /// Unlocks the level after the deepest open one. Returns whether a level
    /// was unlocked.
    pub fn unlock_next_level(&mut self) -> bool {
        let deepest = self
            .levels
            .iter()
            .filter(|l| l.is_open())
            .map(|l| l.level)
            .max()
            .unwrap_or(0);

        match self.levels.iter_mut().find(|l| l.level == deepest + 1) {
            Some(next) => {
                next.unlocked = true;
                log::info!("{} level {} unlocked", self.name, next.level);
                true
            }
            None => false,
        }
    }

    /// Records a boss kill on `depth` and opens the next level.
    pub fn set_boss_defeated(&mut self, depth: u32) -> DelveResult<bool> {
        self.level_mut(depth)?.boss_defeated = true;
        Ok(self.unlock_next_level())
    }
}
