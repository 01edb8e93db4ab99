//! # Game Module
//!
//! Dungeon-run state that sits above combat: where the player stands on the
//! current level's tile graph, which encounter is active, and how that state
//! is snapshotted for persistence.
//!
//! Tile coordinates are map units on a grid spaced `tile_size` apart, so
//! every geometric helper here takes the grid step explicitly.

pub mod state;

pub use state::*;

use serde::{Deserialize, Serialize};

/// A point on the dungeon map, in map units.
///
/// # Examples
///
/// ```
/// use delve::{Direction, Position};
///
/// let pos = Position::new(60, 120);
/// assert_eq!(pos.step(Direction::North, 60), Position::new(60, 60));
/// assert!(pos.is_cardinal_step(Position::new(60, 60), 60));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub const fn origin() -> Self {
        Self::new(0, 0)
    }

    /// The position one grid step away in `direction`.
    pub fn step(self, direction: Direction, tile_size: i32) -> Position {
        let (dx, dy) = direction.unit();
        Position::new(self.x + dx * tile_size, self.y + dy * tile_size)
    }

    /// The four positions one grid step away, in north, west, east, south
    /// order.
    pub fn cardinal_neighbors(self, tile_size: i32) -> [Position; 4] {
        Direction::cardinal().map(|direction| self.step(direction, tile_size))
    }

    /// Whether `other` is exactly one grid step away along an axis.
    pub fn is_cardinal_step(self, other: Position, tile_size: i32) -> bool {
        self.cardinal_neighbors(tile_size).contains(&other)
    }

    /// Non-negative and aligned to the grid.
    pub fn is_on_grid(self, tile_size: i32) -> bool {
        tile_size > 0
            && self.x >= 0
            && self.y >= 0
            && self.x % tile_size == 0
            && self.y % tile_size == 0
    }
}

/// Travel directions between neighboring tiles. North is negative y.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    West,
    East,
    South,
}

impl Direction {
    /// Unit offset `(dx, dy)`.
    pub const fn unit(self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::West => (-1, 0),
            Direction::East => (1, 0),
            Direction::South => (0, 1),
        }
    }

    pub const fn cardinal() -> [Direction; 4] {
        [
            Direction::North,
            Direction::West,
            Direction::East,
            Direction::South,
        ]
    }
}
