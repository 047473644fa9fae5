//! Headless run of a belt loop and a loader line.
//!
//! A source fills a closed ring until it backs up. A second source feeds a
//! short line in which a loader bridges a one-tile gap in front of a sink.
//! Prints a summary every 60 ticks.
//!
//! Run with: `cargo run -p beltline-core --example belt_loop`

use beltline_core::catalog::ItemCatalogBuilder;
use beltline_core::config::EngineConfig;
use beltline_core::engine::GameState;
use beltline_core::grid::{Direction, GridPosition};
use beltline_core::machine::MachineKind;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut catalog = ItemCatalogBuilder::new();
    let iron = catalog.register("iron")?;
    let mut gs = GameState::new(catalog.build(), EngineConfig::default())?;

    // Loop A: 4x3 clockwise ring at the origin, fed from the left.
    for x in 0..3 {
        gs.place_belt(GridPosition::new(x, 0), Direction::Right)?;
        gs.place_belt(GridPosition::new(x + 1, 2), Direction::Left)?;
    }
    for y in 0..2 {
        gs.place_belt(GridPosition::new(3, y), Direction::Down)?;
        gs.place_belt(GridPosition::new(0, y + 1), Direction::Up)?;
    }
    gs.place_source(GridPosition::new(-1, 0), iron, Direction::Right)?;

    // Line below the ring: source, belt, loader over the gap, belt, sink.
    gs.place_source(GridPosition::new(0, 5), iron, Direction::Right)?;
    gs.place_belt(GridPosition::new(1, 5), Direction::Right)?;
    gs.place_loader(GridPosition::new(2, 5), Direction::Right)?;
    gs.place_belt(GridPosition::new(3, 5), Direction::Right)?;
    gs.place_sink(GridPosition::new(4, 5))?;

    for _ in 0..600 {
        let report = gs.step();
        if gs.tick() % 60 == 0 {
            println!(
                "tick {:>4}: {} in transit, {} consumed, {} advanced / {} blocked",
                gs.tick(),
                gs.items_in_transit(),
                gs.items_consumed(),
                report.advanced,
                report.blocked,
            );
        }
    }

    for (kind, machines) in gs.machines_by_kind() {
        let items: usize = machines.iter().map(|m| m.item_count).sum();
        if kind != MachineKind::Sink {
            println!("{kind:?}: {} placed, {items} items", machines.len());
        }
    }
    println!("state hash {:016x}", gs.state_hash());
    Ok(())
}
