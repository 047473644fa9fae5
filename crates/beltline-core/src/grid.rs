//! Chunked spatial index locating machines by grid coordinate.
//!
//! The infinite plane is split into [`CHUNK_SIZE`] x [`CHUNK_SIZE`] chunks.
//! Chunks are allocated whole on first placement and kept in a `BTreeMap`
//! ordered row-major, which makes [`Grid::traverse`] deterministic: chunk
//! rows top to bottom, chunks left to right, then tiles row-major within each
//! chunk.

use crate::config::GridConfig;
use crate::machine::Machine;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Width and height of a chunk, in tiles.
pub const CHUNK_SIZE: usize = 16;

const CHUNK_TILES: usize = CHUNK_SIZE * CHUNK_SIZE;

/// Largest absolute chunk coordinate that can ever be allocated. Every tile
/// inside this range has four neighbours that fit in an `i32`.
pub const MAX_CHUNK_RADIUS: i32 = i32::MAX / CHUNK_SIZE as i32 - 1;

// ---------------------------------------------------------------------------
// Coordinates
// ---------------------------------------------------------------------------

/// A tile position on the grid. `y` grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPosition {
    pub x: i32,
    pub y: i32,
}

impl GridPosition {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The adjacent position in `dir`.
    pub fn step(self, dir: Direction) -> Self {
        self.offset(dir, 1)
    }

    /// The position `distance` tiles away in `dir`. Neighbours (`distance`
    /// of 1) of any placeable tile are always representable.
    pub fn offset(self, dir: Direction, distance: i32) -> Self {
        let (dx, dy) = dir.offset();
        Self::new(self.x + dx * distance, self.y + dy * distance)
    }
}

/// Cardinal directions, declared clockwise starting at `Up`.
///
/// The declaration order doubles as the junction merge priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Unit offset for this direction.
    pub fn offset(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Right => (1, 0),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
        }
    }

    pub fn opposite(self) -> Self {
        Self::ALL[(self.index() + 2) % 4]
    }

    pub fn rotate_cw(self) -> Self {
        Self::ALL[(self.index() + 1) % 4]
    }

    pub fn rotate_ccw(self) -> Self {
        Self::ALL[(self.index() + 3) % 4]
    }

    pub fn is_perpendicular(self, other: Direction) -> bool {
        self.index() % 2 != other.index() % 2
    }
}

/// One of the two parallel lanes, relative to the direction of travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub const ALL: [Side; 2] = [Side::Left, Side::Right];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn other(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    /// The side of something travelling `travel` on which a neighbour lying
    /// in direction `toward` sits. `None` if `toward` is ahead or behind.
    pub fn facing(travel: Direction, toward: Direction) -> Option<Side> {
        if toward == travel.rotate_ccw() {
            Some(Side::Left)
        } else if toward == travel.rotate_cw() {
            Some(Side::Right)
        } else {
            None
        }
    }
}

/// Chunk coordinates. Fields are declared `y` first so the derived ordering
/// is row-major.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkPosition {
    pub y: i32,
    pub x: i32,
}

impl ChunkPosition {
    pub fn containing(pos: GridPosition) -> Self {
        let size = CHUNK_SIZE as i32;
        Self {
            y: pos.y.div_euclid(size),
            x: pos.x.div_euclid(size),
        }
    }

    fn local_index(pos: GridPosition) -> usize {
        let size = CHUNK_SIZE as i32;
        pos.y.rem_euclid(size) as usize * CHUNK_SIZE + pos.x.rem_euclid(size) as usize
    }

    fn tile_position(self, index: usize) -> GridPosition {
        let size = CHUNK_SIZE as i32;
        GridPosition::new(
            self.x * size + (index % CHUNK_SIZE) as i32,
            self.y * size + (index / CHUNK_SIZE) as i32,
        )
    }
}

// ---------------------------------------------------------------------------
// Tiles and chunks
// ---------------------------------------------------------------------------

/// One grid cell. Hosts at most one machine.
#[derive(Debug, Clone, Default)]
pub struct Tile {
    machine: Option<Machine>,
}

impl Tile {
    pub fn machine(&self) -> Option<&Machine> {
        self.machine.as_ref()
    }

    pub fn machine_mut(&mut self) -> Option<&mut Machine> {
        self.machine.as_mut()
    }

    pub fn is_empty(&self) -> bool {
        self.machine.is_none()
    }
}

/// A fully populated block of tiles.
#[derive(Debug, Clone)]
pub struct Chunk {
    tiles: Vec<Tile>,
}

impl Chunk {
    fn new() -> Self {
        Self {
            tiles: vec![Tile::default(); CHUNK_TILES],
        }
    }

    pub fn machine_count(&self) -> usize {
        self.tiles.iter().filter(|t| !t.is_empty()).count()
    }
}

/// Errors from [`Grid::place`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlacementError {
    #[error("tile ({}, {}) already hosts a machine", .0.x, .0.y)]
    Occupied(GridPosition),
    #[error("tile ({}, {}) lies outside the allowed chunk range", .0.x, .0.y)]
    OutOfBounds(GridPosition),
    #[error("cannot allocate another chunk: limit of {limit} reached")]
    ChunkAllocation { limit: usize },
}

// ---------------------------------------------------------------------------
// Grid
// ---------------------------------------------------------------------------

/// The chunked spatial index.
#[derive(Debug, Clone, Default)]
pub struct Grid {
    chunks: BTreeMap<ChunkPosition, Chunk>,
    limits: GridConfig,
}

impl Grid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: GridConfig) -> Self {
        Self {
            chunks: BTreeMap::new(),
            limits,
        }
    }

    // -- Point queries --

    /// The tile at `pos`, or `None` if its chunk has not been allocated.
    pub fn get(&self, pos: GridPosition) -> Option<&Tile> {
        self.chunks
            .get(&ChunkPosition::containing(pos))
            .map(|chunk| &chunk.tiles[ChunkPosition::local_index(pos)])
    }

    pub fn get_mut(&mut self, pos: GridPosition) -> Option<&mut Tile> {
        self.chunks
            .get_mut(&ChunkPosition::containing(pos))
            .map(|chunk| &mut chunk.tiles[ChunkPosition::local_index(pos)])
    }

    pub fn machine(&self, pos: GridPosition) -> Option<&Machine> {
        self.get(pos).and_then(Tile::machine)
    }

    pub fn machine_mut(&mut self, pos: GridPosition) -> Option<&mut Machine> {
        self.get_mut(pos).and_then(Tile::machine_mut)
    }

    pub fn is_occupied(&self, pos: GridPosition) -> bool {
        self.machine(pos).is_some()
    }

    // -- Placement --

    /// Largest absolute chunk coordinate this grid allocates.
    pub fn chunk_radius(&self) -> i32 {
        self.limits
            .chunk_radius
            .map_or(MAX_CHUNK_RADIUS, |radius| radius.min(MAX_CHUNK_RADIUS))
    }

    /// Place a machine, allocating its chunk on demand.
    pub fn place(&mut self, pos: GridPosition, machine: Machine) -> Result<(), PlacementError> {
        let chunk_pos = ChunkPosition::containing(pos);
        let radius = self.chunk_radius();
        if chunk_pos.x.abs() > radius || chunk_pos.y.abs() > radius {
            return Err(PlacementError::OutOfBounds(pos));
        }
        if !self.chunks.contains_key(&chunk_pos) {
            if let Some(limit) = self.limits.max_chunks
                && self.chunks.len() >= limit
            {
                return Err(PlacementError::ChunkAllocation { limit });
            }
            self.chunks.insert(chunk_pos, Chunk::new());
        }

        let tile = self
            .get_mut(pos)
            .ok_or(PlacementError::OutOfBounds(pos))?;
        if tile.machine.is_some() {
            return Err(PlacementError::Occupied(pos));
        }
        tile.machine = Some(machine);
        Ok(())
    }

    /// Remove the machine at `pos`. Chunks stay allocated.
    pub fn remove(&mut self, pos: GridPosition) -> Option<Machine> {
        self.get_mut(pos).and_then(|tile| tile.machine.take())
    }

    /// Move a machine out of its tile so it can be updated while borrowing
    /// the rest of the grid. Pair with [`Grid::restore_machine`].
    pub(crate) fn take_machine(&mut self, pos: GridPosition) -> Option<Machine> {
        self.remove(pos)
    }

    pub(crate) fn restore_machine(&mut self, pos: GridPosition, machine: Machine) {
        if let Some(tile) = self.get_mut(pos) {
            debug_assert!(tile.machine.is_none(), "tile refilled during update");
            tile.machine = Some(machine);
        }
    }

    // -- Traversal --

    /// Every tile of every allocated chunk in deterministic order.
    pub fn traverse(&self) -> impl Iterator<Item = (GridPosition, &Tile)> + '_ {
        self.chunks.iter().flat_map(|(&chunk_pos, chunk)| {
            chunk
                .tiles
                .iter()
                .enumerate()
                .map(move |(i, tile)| (chunk_pos.tile_position(i), tile))
        })
    }

    /// Machines in traversal order.
    pub fn machines(&self) -> impl Iterator<Item = (GridPosition, &Machine)> + '_ {
        self.traverse()
            .filter_map(|(pos, tile)| tile.machine().map(|m| (pos, m)))
    }

    /// Snapshot of the occupied positions in traversal order.
    pub fn occupied_positions(&self) -> Vec<GridPosition> {
        self.machines().map(|(pos, _)| pos).collect()
    }

    // -- Stats --

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn machine_count(&self) -> usize {
        self.chunks.values().map(Chunk::machine_count).sum()
    }
}
