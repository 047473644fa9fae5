//! Loaders bridging a gap at a fixed cadence, driven by the tick loop.

use beltline_core::config::EngineConfig;
use beltline_core::engine::{GameState, RemovalPolicy};
use beltline_core::grid::{Direction, GridPosition};
use beltline_core::test_utils::*;

#[test]
fn cadence_three_transfers_on_every_third_tick() {
    let mut gs = GameState::with_catalog(catalog());
    assert_eq!(gs.config().loader.cadence, 3);
    gs.place(GridPosition::new(0, 0), source(iron(), Direction::Right, 1))
        .unwrap();
    gs.place_loader(GridPosition::new(1, 0), Direction::Right).unwrap();
    gs.place_sink(GridPosition::new(2, 0)).unwrap();

    let mut transfers = Vec::new();
    let mut consumed = 0;
    for _ in 0..9 {
        gs.step();
        if gs.items_consumed() > consumed {
            consumed = gs.items_consumed();
            transfers.push(gs.tick());
        }
    }
    assert_eq!(transfers, vec![3, 6, 9]);
}

#[test]
fn loader_bridges_two_belts() {
    let mut config = EngineConfig::default();
    config.loader.cadence = 1;
    let mut gs = GameState::new(catalog(), config).unwrap();
    gs.place(GridPosition::new(0, 0), source(iron(), Direction::Right, 5))
        .unwrap();
    gs.place_belt(GridPosition::new(1, 0), Direction::Right).unwrap();
    gs.place_loader(GridPosition::new(2, 0), Direction::Right).unwrap();
    gs.place_belt(GridPosition::new(3, 0), Direction::Right).unwrap();
    gs.place_sink(GridPosition::new(4, 0)).unwrap();

    for _ in 0..1_000 {
        gs.step();
        assert_eq!(
            gs.items_produced(),
            gs.items_in_transit() as u64 + gs.items_consumed()
        );
    }
    // One item every five ticks, minus those still travelling.
    assert!(gs.items_consumed() >= 150);
}

#[test]
fn loader_waits_for_destination_space() {
    let mut gs = GameState::with_catalog(catalog());
    gs.place(GridPosition::new(0, 0), source(iron(), Direction::Right, 1))
        .unwrap();
    gs.place_loader(GridPosition::new(1, 0), Direction::Right).unwrap();
    gs.place_belt(GridPosition::new(2, 0), Direction::Right).unwrap();

    for _ in 0..1_000 {
        gs.step();
    }
    // The belt dead-ends: it fills and the loader stalls.
    let stalled = gs.items_in_transit();
    for _ in 0..100 {
        gs.step();
    }
    assert_eq!(gs.items_in_transit(), stalled);

    // Removing the loader leaves its neighbours untouched.
    let removal = gs
        .remove(GridPosition::new(1, 0), RemovalPolicy::HandOff)
        .unwrap();
    assert!(removal.spilled.is_empty());
    assert_eq!(gs.items_in_transit(), stalled);
}
