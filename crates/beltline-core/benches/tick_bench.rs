//! Criterion benchmarks for the tick loop.
//!
//! - `belt_grid`: 64 parallel source -> belt -> sink lines, 30 belts each
//! - `junction_mesh`: crossing streams through a row of junctions

use beltline_core::engine::GameState;
use beltline_core::grid::{Direction, GridPosition};
use beltline_core::test_utils::*;
use criterion::{Criterion, criterion_group, criterion_main};

fn build_belt_grid(lines: i32, length: i32) -> GameState {
    let mut gs = GameState::with_catalog(catalog());
    for y in 0..lines {
        gs.place_source(GridPosition::new(0, y), iron(), Direction::Right)
            .unwrap();
        for x in 1..=length {
            gs.place_belt(GridPosition::new(x, y), Direction::Right)
                .unwrap();
        }
        gs.place_sink(GridPosition::new(length + 1, y)).unwrap();
    }
    gs
}

/// Vertical streams cross a horizontal stream at every junction.
fn build_junction_mesh(columns: i32) -> GameState {
    let mut gs = GameState::with_catalog(catalog());
    let row = 10;
    gs.place_source(GridPosition::new(0, row), copper(), Direction::Right)
        .unwrap();
    for c in 0..columns {
        let x = 2 * c + 1;
        gs.place_belt(GridPosition::new(x, row), Direction::Right)
            .unwrap();
        gs.place_junction(GridPosition::new(x + 1, row)).unwrap();
        gs.place_source(GridPosition::new(x + 1, 0), iron(), Direction::Down)
            .unwrap();
        for y in 1..row {
            gs.place_belt(GridPosition::new(x + 1, y), Direction::Down)
                .unwrap();
        }
        for y in row + 1..row + 5 {
            gs.place_belt(GridPosition::new(x + 1, y), Direction::Down)
                .unwrap();
        }
        gs.place_sink(GridPosition::new(x + 1, row + 5)).unwrap();
    }
    gs.place_sink(GridPosition::new(2 * columns + 1, row)).unwrap();
    gs
}

fn warm(mut gs: GameState, ticks: usize) -> GameState {
    for _ in 0..ticks {
        gs.step();
    }
    gs
}

fn bench_belt_grid(c: &mut Criterion) {
    let mut group = c.benchmark_group("belt_grid");
    group.sample_size(50);
    let mut gs = warm(build_belt_grid(64, 30), 500);
    group.bench_function("64_lines_30_belts", |b| {
        b.iter(|| gs.step());
    });
    group.finish();
}

fn bench_junction_mesh(c: &mut Criterion) {
    let mut group = c.benchmark_group("junction_mesh");
    group.sample_size(50);
    let mut gs = warm(build_junction_mesh(32), 500);
    group.bench_function("32_crossings", |b| {
        b.iter(|| gs.step());
    });
    group.finish();
}

criterion_group!(benches, bench_belt_grid, bench_junction_mesh);
criterion_main!(benches);
