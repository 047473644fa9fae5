//! A complete map loaded from data files and run headless.

use beltline_core::engine::RemovalPolicy;
use beltline_core::grid::GridPosition;
use beltline_core::machine::MachineKind;
use beltline_data::load_game_state;
use std::fs;
use std::path::PathBuf;

fn make_test_dir(suffix: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "beltline_integration_{suffix}_{}",
        std::process::id()
    ));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

const LAYOUT: &str = r#"
[[machines]]
kind = "source"
x = 0
y = 0
direction = "Right"
item = "iron"
limit = 20

[[machines]]
kind = "belt"
x = 1
y = 0
direction = "Right"

[[machines]]
kind = "loader"
x = 2
y = 0
direction = "Right"
cadence = 2

[[machines]]
kind = "belt"
x = 3
y = 0
direction = "Right"

[[machines]]
kind = "junction"
x = 4
y = 0
routes = [{ entered_from = "Left", exit = "Down" }]

[[machines]]
kind = "belt"
x = 4
y = 1
direction = "Down"

[[machines]]
kind = "sink"
x = 4
y = 2
"#;

#[test]
fn loaded_map_delivers_everything() {
    let dir = make_test_dir("map");
    fs::write(dir.join("items.json"), r#"[{"name": "iron"}]"#).unwrap();
    fs::write(dir.join("config.ron"), "(source_interval: 2)").unwrap();
    fs::write(dir.join("layout.toml"), LAYOUT).unwrap();

    let mut gs = load_game_state(&dir).unwrap();
    let kinds = gs.machines_by_kind();
    assert_eq!(kinds[&MachineKind::ConveyorBelt].len(), 3);
    assert_eq!(kinds[&MachineKind::Loader].len(), 1);

    for _ in 0..1_000 {
        gs.step();
    }
    assert_eq!(gs.items_produced(), 20);
    assert_eq!(gs.items_consumed(), 20);

    let removal = gs
        .remove(GridPosition::new(4, 0), RemovalPolicy::Spill)
        .unwrap();
    assert!(removal.spilled.is_empty());
    let _ = fs::remove_dir_all(&dir);
}
