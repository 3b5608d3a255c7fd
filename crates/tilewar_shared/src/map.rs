//! # Tile Map
//!
//! The arena is a row-major grid of one-byte tiles.
//!
//! ```text
//!   x →  0   1   2   3
//! y 0  [ . ][ A ][ # ][ . ]
//! ↓ 1  [ . ][ A ][ # ][ B ]
//!   2  [ . ][ . ][ . ][ B ]
//!
//! index = y * width + x
//! ```
//!
//! Reads outside the grid return [`Tile::Wall`], so the map behaves like a
//! closed room. Writes outside the grid are dropped.

use serde::{Deserialize, Serialize};

/// One cell of the map grid.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tile {
    /// Unclaimed floor.
    #[default]
    Empty = 0,
    /// Floor painted by team A.
    TeamA = 1,
    /// Floor painted by team B.
    TeamB = 2,
    /// Impassable, never painted.
    Wall = 3,
}

impl Tile {
    /// Converts a wire byte into a tile.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Empty),
            1 => Some(Self::TeamA),
            2 => Some(Self::TeamB),
            3 => Some(Self::Wall),
            _ => None,
        }
    }

    /// Wire byte of this tile.
    #[inline]
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Tile painted by a team index (team + 1).
    #[must_use]
    pub const fn for_team(team: u8) -> Option<Self> {
        match team {
            0 => Some(Self::TeamA),
            1 => Some(Self::TeamB),
            _ => None,
        }
    }

    /// Returns true for walls.
    #[inline]
    #[must_use]
    pub const fn is_wall(self) -> bool {
        matches!(self, Self::Wall)
    }
}

/// The four cells touched by a unit square whose top-left corner lies in `tile`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Surroundings {
    /// Cell containing the corner.
    pub tile: Tile,
    /// Cell below.
    pub bottom: Tile,
    /// Cell to the right.
    pub right: Tile,
    /// Cell diagonally below-right.
    pub bottom_right: Tile,
}

/// Row-major tile grid.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileMap {
    width: usize,
    height: usize,
    tiles: Vec<Tile>,
}

impl TileMap {
    /// Creates a map filled with [`Tile::Empty`].
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            tiles: vec![Tile::Empty; width * height],
        }
    }

    /// Wraps an existing tile vector.
    ///
    /// Returns `None` if `tiles.len() != width * height`.
    #[must_use]
    pub fn from_tiles(width: usize, height: usize, tiles: Vec<Tile>) -> Option<Self> {
        if width.checked_mul(height)? != tiles.len() {
            return None;
        }
        Some(Self { width, height, tiles })
    }

    /// Width in cells.
    #[inline]
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Height in cells.
    #[inline]
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// All tiles in row-major order.
    #[inline]
    #[must_use]
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Flat index of a cell, or `None` outside the grid.
    #[inline]
    #[must_use]
    pub fn index(&self, x: i64, y: i64) -> Option<usize> {
        let x = usize::try_from(x).ok()?;
        let y = usize::try_from(y).ok()?;
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y * self.width + x)
    }

    /// Returns true if the cell lies inside the grid.
    #[inline]
    #[must_use]
    pub fn contains(&self, x: i64, y: i64) -> bool {
        self.index(x, y).is_some()
    }

    /// Reads a cell. Outside the grid everything is a wall.
    #[inline]
    #[must_use]
    pub fn get(&self, x: i64, y: i64) -> Tile {
        self.index(x, y).map_or(Tile::Wall, |i| self.tiles[i])
    }

    /// Reads the 2x2 block whose top-left cell is `(x, y)`.
    #[must_use]
    pub fn get_around(&self, x: i64, y: i64) -> Surroundings {
        Surroundings {
            tile: self.get(x, y),
            bottom: self.get(x, y + 1),
            right: self.get(x + 1, y),
            bottom_right: self.get(x + 1, y + 1),
        }
    }

    /// Writes a cell. Returns false (and does nothing) outside the grid.
    pub fn set(&mut self, x: i64, y: i64, tile: Tile) -> bool {
        match self.index(x, y) {
            Some(i) => {
                self.tiles[i] = tile;
                true
            }
            None => false,
        }
    }

    /// Resets every non-wall tile to [`Tile::Empty`].
    pub fn clear(&mut self) {
        for tile in &mut self.tiles {
            if !tile.is_wall() {
                *tile = Tile::Empty;
            }
        }
    }

    /// Paints a `size` x `size` square centred on `(cx, cy)`.
    ///
    /// Walls and cells outside the grid are skipped. Returns the number of
    /// cells written.
    pub fn paint_square(&mut self, cx: i64, cy: i64, size: u32, tile: Tile) -> usize {
        let half = i64::from(size.saturating_sub(1) / 2);
        let (xs, ys) = (
            clip(cx.saturating_sub(half), size, self.width),
            clip(cy.saturating_sub(half), size, self.height),
        );
        let mut painted = 0;

        for x in xs {
            for y in ys.clone() {
                let Some(i) = self.index(x, y) else {
                    continue;
                };
                if self.tiles[i].is_wall() {
                    continue;
                }
                self.tiles[i] = tile;
                painted += 1;
            }
        }

        painted
    }

    /// Counts tiles of one kind.
    #[must_use]
    pub fn count(&self, tile: Tile) -> usize {
        self.tiles.iter().filter(|&&t| t == tile).count()
    }
}

/// Part of `start..start + size` that lies in `0..len`.
fn clip(start: i64, size: u32, len: usize) -> std::ops::Range<i64> {
    let len = i64::try_from(len).unwrap_or(i64::MAX);
    let end = start.saturating_add(i64::from(size)).min(len);
    start.max(0)..end
}
