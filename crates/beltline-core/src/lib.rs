//! Beltline Core -- a deterministic, tick-driven transport simulation.
//!
//! Conveyor belts, junctions and loaders move discrete items along
//! continuous lane positions across a sparse chunked grid. Sources inject
//! items and sinks consume them; everything in between only moves them.
//!
//! # Tick
//!
//! Each call to [`engine::GameState::step`] (or [`engine::GameState::frame`])
//! runs one tick: the occupied coordinates are snapshotted in traversal order
//! and every machine is updated exactly once, with neighbours resolved by
//! coordinate on every access.
//!
//! ```rust,ignore
//! let mut catalog = ItemCatalogBuilder::new();
//! let iron = catalog.register("iron")?;
//! let mut gs = GameState::new(catalog.build(), EngineConfig::default())?;
//! gs.place_source(GridPosition::new(0, 0), iron, Direction::Right)?;
//! gs.place_belt(GridPosition::new(1, 0), Direction::Right)?;
//! gs.place_sink(GridPosition::new(2, 0))?;
//! gs.step();
//! ```
//!
//! # Key Types
//!
//! - [`engine::GameState`] -- owns the grid, clock and event bus; places and
//!   removes machines.
//! - [`grid::Grid`] -- chunked spatial index with deterministic traversal.
//! - [`transport::Lane`] -- ordered, spaced item positions on one lane.
//! - [`machine::Machine`] -- closed set of machine variants.
//! - [`event::EventBus`] -- synchronous lifecycle events.
//! - [`fixed::Fixed64`] -- Q32.32 fixed-point type for deterministic math.

pub mod belt;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod event;
pub mod fixed;
pub mod grid;
pub mod id;
pub mod junction;
pub mod loader;
pub mod machine;
pub mod processor;
pub mod query;
pub mod sim;
pub mod transport;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
