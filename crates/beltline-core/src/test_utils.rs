//! Shared test helpers for unit tests, integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available to integration tests and benchmarks through the
//! `test-utils` feature.

use crate::belt::ConveyorBelt;
use crate::catalog::{ItemCatalog, ItemCatalogBuilder};
use crate::config::LaneConfig;
use crate::engine::GameState;
use crate::fixed::Fixed64;
use crate::grid::{Direction, GridPosition, Side};
use crate::id::ItemTypeId;
use crate::junction::Junction;
use crate::machine::Machine;
use crate::processor::{ItemSink, ItemSource};
use crate::transport::{BeltItem, Lane, LaneGeometry};

// ===========================================================================
// Fixed-point helper
// ===========================================================================

pub fn fixed(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

// ===========================================================================
// Items
// ===========================================================================

pub fn iron() -> ItemTypeId {
    ItemTypeId(0)
}
pub fn copper() -> ItemTypeId {
    ItemTypeId(1)
}

/// A catalog whose ids line up with [`iron`] and [`copper`].
pub fn catalog() -> ItemCatalog {
    let mut builder = ItemCatalogBuilder::new();
    for name in ["iron", "copper"] {
        if let Err(e) = builder.register(name) {
            panic!("test catalog: {e}");
        }
    }
    builder.build()
}

// ===========================================================================
// Lanes and machines
// ===========================================================================

/// Length 100, speed 1, spacing 5.
pub fn standard_geometry() -> LaneGeometry {
    LaneConfig::default().geometry()
}

/// A lane of iron at the given positions.
pub fn lane_with(positions: &[f64]) -> Lane {
    Lane::from_items(positions.iter().map(|&p| BeltItem::new(iron(), fixed(p))))
}

pub fn belt(direction: Direction) -> Machine {
    Machine::ConveyorBelt(ConveyorBelt::new(direction, standard_geometry()))
}

pub fn junction() -> Machine {
    Machine::Junction(Junction::new(standard_geometry(), 4))
}

pub fn sink() -> Machine {
    Machine::Sink(ItemSink::new())
}

pub fn source(item: ItemTypeId, direction: Direction, interval: u32) -> Machine {
    Machine::Source(ItemSource::new(item, direction, interval))
}

// ===========================================================================
// Game state helpers
// ===========================================================================

/// Put iron at `positions` on one lane of the belt or junction at `pos`.
/// Junction items go into the queue entered from the junction's top side.
pub fn seed_lane(gs: &mut GameState, pos: GridPosition, side: Side, positions: &[f64]) {
    let (lane, geometry) = match gs.machine_mut(pos) {
        Some(Machine::ConveyorBelt(b)) => {
            let geometry = *b.geometry();
            (b.line_mut().lane_mut(side), geometry)
        }
        Some(Machine::Junction(j)) => {
            let geometry = *j.geometry();
            (j.queue_mut(Direction::Up).lane_mut(side), geometry)
        }
        other => panic!("cannot seed items on {other:?}"),
    };
    for &p in positions {
        assert!(
            lane.insert(BeltItem::new(iron(), fixed(p)), &geometry),
            "seed position {p} breaks lane spacing"
        );
    }
}

/// Lane positions of the belt at `pos`.
pub fn belt_positions(gs: &GameState, pos: GridPosition, side: Side) -> Vec<Fixed64> {
    match gs.machine(pos) {
        Some(Machine::ConveyorBelt(b)) => b.line().lane(side).positions(),
        other => panic!("expected belt at {pos:?}, found {other:?}"),
    }
}

/// Tiles of a clockwise rectangular loop with its top-left corner at
/// `origin`, `width` x `height` tiles, with the direction each belt faces.
pub fn loop_tiles(origin: GridPosition, width: i32, height: i32) -> Vec<(GridPosition, Direction)> {
    let mut tiles = Vec::new();
    for dx in 0..width - 1 {
        tiles.push((GridPosition::new(origin.x + dx, origin.y), Direction::Right));
    }
    for dy in 0..height - 1 {
        tiles.push((
            GridPosition::new(origin.x + width - 1, origin.y + dy),
            Direction::Down,
        ));
    }
    for dx in (1..width).rev() {
        tiles.push((
            GridPosition::new(origin.x + dx, origin.y + height - 1),
            Direction::Left,
        ));
    }
    for dy in (1..height).rev() {
        tiles.push((GridPosition::new(origin.x, origin.y + dy), Direction::Up));
    }
    tiles
}

/// Place a closed clockwise loop of belts. Returns its tiles in travel order.
pub fn place_loop(
    gs: &mut GameState,
    origin: GridPosition,
    width: i32,
    height: i32,
) -> Vec<(GridPosition, Direction)> {
    let tiles = loop_tiles(origin, width, height);
    for &(pos, dir) in &tiles {
        if let Err(e) = gs.place_belt(pos, dir) {
            panic!("loop belt at {pos:?}: {e}");
        }
    }
    tiles
}

/// The six-belt loop with ten items per lane on its first belt, spaced at
/// 0, 5, .., 45.
pub fn seeded_six_belt_loop() -> (GameState, Vec<(GridPosition, Direction)>) {
    let mut gs = GameState::with_catalog(catalog());
    let tiles = place_loop(&mut gs, GridPosition::new(0, 0), 3, 2);
    let positions: Vec<f64> = (0..10).map(|i| f64::from(i) * 5.0).collect();
    for side in Side::ALL {
        seed_lane(&mut gs, tiles[0].0, side, &positions);
    }
    (gs, tiles)
}
