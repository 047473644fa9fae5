//! Builds a ready [`GameState`] from a data directory.
//!
//! Files, by base name (any of `.ron`, `.toml`, `.json`):
//! - `items` (required): the item catalog
//! - `config` (optional): engine configuration, defaults otherwise
//! - `layout` (optional): machines and pre-seeded lane items
//!
//! Item names are resolved strictly. Layout entries missing a field their
//! kind needs are skipped with a warning so a partly edited map still loads.

use crate::loader::{DataLoadError, deserialize_file, deserialize_list, find_data_file, require_data_file};
use crate::schema::{ConfigData, ItemData, LayoutData, MachineData, MachineKindData, SeedData};
use beltline_core::belt::ConveyorBelt;
use beltline_core::catalog::{ItemCatalog, ItemCatalogBuilder};
use beltline_core::config::EngineConfig;
use beltline_core::engine::GameState;
use beltline_core::fixed::f64_to_fixed64;
use beltline_core::grid::{Direction, GridPosition};
use beltline_core::junction::Junction;
use beltline_core::loader::Loader;
use beltline_core::machine::Machine;
use beltline_core::processor::{ItemSink, ItemSource};
use beltline_core::transport::BeltItem;
use log::{debug, warn};
use std::path::Path;

/// Load the catalog from an items file.
pub fn load_catalog(path: &Path) -> Result<ItemCatalog, DataLoadError> {
    let items: Vec<ItemData> = deserialize_list(path, "items")?;
    let mut builder = ItemCatalogBuilder::new();
    for item in &items {
        let sprite = item.sprite.as_deref().unwrap_or(&item.name);
        builder
            .register_with_sprite(&item.name, sprite)
            .map_err(|e| DataLoadError::from_catalog(path, e))?;
    }
    Ok(builder.build())
}

/// Load engine configuration from a config file.
pub fn load_config(path: &Path) -> Result<EngineConfig, DataLoadError> {
    let data: ConfigData = deserialize_file(path)?;
    let config = data.into_config();
    config.validate().map_err(|source| DataLoadError::Config {
        file: path.to_path_buf(),
        source,
    })?;
    Ok(config)
}

/// Load everything in `dir` and build the game state.
pub fn load_game_state(dir: &Path) -> Result<GameState, DataLoadError> {
    let items_path = require_data_file(dir, "items")?;
    let catalog = load_catalog(&items_path)?;

    let (config, config_path) = match find_data_file(dir, "config")? {
        Some(path) => (load_config(&path)?, path),
        None => (EngineConfig::default(), dir.to_path_buf()),
    };
    let mut gs = GameState::new(catalog, config).map_err(|source| DataLoadError::Config {
        file: config_path,
        source,
    })?;

    if let Some(path) = find_data_file(dir, "layout")? {
        let layout: LayoutData = deserialize_file(&path)?;
        apply_layout(&mut gs, &layout, &path)?;
    }
    debug!(
        "loaded {} items, {} machines from {}",
        gs.catalog().len(),
        gs.grid().machine_count(),
        dir.display()
    );
    Ok(gs)
}

/// Place the machines of `layout`, then seed its lane items.
pub fn apply_layout(gs: &mut GameState, layout: &LayoutData, file: &Path) -> Result<(), DataLoadError> {
    for entry in &layout.machines {
        let Some(machine) = build_machine(gs, entry, file)? else {
            continue;
        };
        let position = GridPosition::new(entry.x, entry.y);
        gs.place(position, machine)
            .map_err(|source| DataLoadError::Placement {
                file: file.to_path_buf(),
                position,
                source,
            })?;
    }
    for seed in &layout.items {
        seed_item(gs, seed, file)?;
    }
    Ok(())
}

fn build_machine(
    gs: &GameState,
    entry: &MachineData,
    file: &Path,
) -> Result<Option<Machine>, DataLoadError> {
    let config = gs.config();
    let needs_direction = matches!(
        entry.kind,
        MachineKindData::Belt | MachineKindData::Loader | MachineKindData::Source
    );
    if needs_direction && entry.direction.is_none() {
        warn!(
            "{}: skipping {:?} at ({}, {}) without a direction",
            file.display(),
            entry.kind,
            entry.x,
            entry.y
        );
        return Ok(None);
    }
    let direction = entry.direction.unwrap_or(Direction::Up);

    let machine = match entry.kind {
        MachineKindData::Belt => {
            Machine::ConveyorBelt(ConveyorBelt::new(direction, config.belt.geometry()))
        }
        MachineKindData::Junction => Machine::Junction(entry.routes.iter().fold(
            Junction::new(config.junction.lane.geometry(), config.junction.queue_capacity),
            |j, route| j.with_route(route.entered_from, route.exit),
        )),
        MachineKindData::Loader => Machine::Loader(Loader::new(
            direction,
            entry.cadence.unwrap_or(config.loader.cadence),
        )),
        MachineKindData::Source => {
            let Some(name) = &entry.item else {
                warn!(
                    "{}: skipping source at ({}, {}) without an item",
                    file.display(),
                    entry.x,
                    entry.y
                );
                return Ok(None);
            };
            let item = gs
                .catalog()
                .item(name)
                .map_err(|e| DataLoadError::from_catalog(file, e))?;
            let source = ItemSource::new(
                item,
                direction,
                entry.interval.unwrap_or(config.source.interval),
            );
            Machine::Source(match entry.limit {
                Some(limit) => source.finite(limit),
                None => source,
            })
        }
        MachineKindData::Sink => Machine::Sink(match entry.capacity {
            Some(capacity) => ItemSink::with_capacity(capacity),
            None => ItemSink::new(),
        }),
    };
    Ok(Some(machine))
}

fn seed_item(gs: &mut GameState, seed: &SeedData, file: &Path) -> Result<(), DataLoadError> {
    let item = gs
        .catalog()
        .item(&seed.item)
        .map_err(|e| DataLoadError::from_catalog(file, e))?;
    let position = GridPosition::new(seed.x, seed.y);
    let placed = match gs.machine_mut(position) {
        Some(Machine::ConveyorBelt(belt)) => {
            let geometry = *belt.geometry();
            belt.line_mut()
                .lane_mut(seed.side)
                .insert(BeltItem::new(item, f64_to_fixed64(seed.position)), &geometry)
        }
        _ => false,
    };
    if !placed {
        warn!(
            "{}: skipping {} at ({}, {}) {:?} lane position {}",
            file.display(),
            seed.item,
            seed.x,
            seed.y,
            seed.side,
            seed.position
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use beltline_core::grid::Side;
    use beltline_core::machine::MachineKind;
    use std::fs;
    use std::path::PathBuf;

    fn make_test_dir(suffix: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "beltline_world_test_{suffix}_{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn cleanup(dir: &Path) {
        let _ = fs::remove_dir_all(dir);
    }

    const ITEMS_RON: &str = r#"[(name: "iron"), (name: "copper", sprite: Some("copper_plate"))]"#;

    #[test]
    fn items_only_uses_default_config() {
        let dir = make_test_dir("items_only");
        fs::write(dir.join("items.ron"), ITEMS_RON).unwrap();
        let gs = load_game_state(&dir).unwrap();
        assert_eq!(gs.catalog().len(), 2);
        let copper = gs.catalog().item("copper").unwrap();
        assert_eq!(gs.catalog().get(copper).unwrap().sprite, "copper_plate");
        assert_eq!(*gs.config(), EngineConfig::default());
        assert_eq!(gs.grid().machine_count(), 0);
        cleanup(&dir);
    }

    #[test]
    fn missing_items_file_is_an_error() {
        let dir = make_test_dir("no_items");
        assert!(matches!(
            load_game_state(&dir),
            Err(DataLoadError::MissingRequired { .. })
        ));
        cleanup(&dir);
    }

    #[test]
    fn duplicate_item_is_reported() {
        let dir = make_test_dir("dup");
        fs::write(dir.join("items.json"), r#"[{"name": "iron"}, {"name": "iron"}]"#).unwrap();
        assert!(matches!(
            load_game_state(&dir),
            Err(DataLoadError::DuplicateName { ref name, .. }) if name == "iron"
        ));
        cleanup(&dir);
    }

    #[test]
    fn invalid_config_is_reported() {
        let dir = make_test_dir("bad_config");
        fs::write(dir.join("items.ron"), ITEMS_RON).unwrap();
        fs::write(dir.join("config.toml"), "loader_cadence = 0\n").unwrap();
        assert!(matches!(
            load_game_state(&dir),
            Err(DataLoadError::Config { .. })
        ));
        cleanup(&dir);
    }

    #[test]
    fn layout_places_machines_and_seeds_items() {
        let dir = make_test_dir("layout");
        fs::write(dir.join("items.ron"), ITEMS_RON).unwrap();
        fs::write(dir.join("config.toml"), "[belt]\nspeed = 2.0\n").unwrap();
        fs::write(
            dir.join("layout.json"),
            r#"{
                "machines": [
                    {"kind": "source", "x": 0, "y": 0, "direction": "Right", "item": "iron", "limit": 3},
                    {"kind": "belt", "x": 1, "y": 0, "direction": "Right"},
                    {"kind": "junction", "x": 2, "y": 0,
                     "routes": [{"entered_from": "Left", "exit": "Down"}]},
                    {"kind": "sink", "x": 2, "y": 1, "capacity": 10},
                    {"kind": "belt", "x": 5, "y": 5}
                ],
                "items": [
                    {"x": 1, "y": 0, "side": "Left", "position": 20.0, "item": "copper"},
                    {"x": 1, "y": 0, "side": "Left", "position": 22.0, "item": "copper"}
                ]
            }"#,
        )
        .unwrap();

        let mut gs = load_game_state(&dir).unwrap();
        // The direction-less belt is skipped.
        assert_eq!(gs.grid().machine_count(), 4);
        let groups = gs.machines_by_kind();
        assert_eq!(groups[&MachineKind::Junction][0].position, GridPosition::new(2, 0));
        // The second seed is too close to the first.
        assert_eq!(gs.items_in_transit(), 1);
        let Some(Machine::ConveyorBelt(belt)) = gs.machine(GridPosition::new(1, 0)) else {
            panic!("expected belt");
        };
        assert_eq!(belt.geometry().speed, f64_to_fixed64(2.0));
        assert_eq!(belt.line().lane(Side::Left).len(), 1);

        for _ in 0..200 {
            gs.step();
        }
        // Three iron from the source plus the seeded copper reach the sink.
        assert_eq!(gs.items_consumed(), 4);
        cleanup(&dir);
    }

    #[test]
    fn unknown_source_item_is_unresolved() {
        let dir = make_test_dir("unknown_item");
        fs::write(dir.join("items.ron"), ITEMS_RON).unwrap();
        fs::write(
            dir.join("layout.toml"),
            "[[machines]]\nkind = \"source\"\nx = 0\ny = 0\ndirection = \"Up\"\nitem = \"gold\"\n",
        )
        .unwrap();
        assert!(matches!(
            load_game_state(&dir),
            Err(DataLoadError::UnresolvedRef { ref name, .. }) if name == "gold"
        ));
        cleanup(&dir);
    }

    #[test]
    fn overlapping_machines_fail_placement() {
        let dir = make_test_dir("overlap");
        fs::write(dir.join("items.ron"), ITEMS_RON).unwrap();
        fs::write(
            dir.join("layout.ron"),
            "(machines: [(kind: sink, x: 1, y: 1), (kind: sink, x: 1, y: 1)])",
        )
        .unwrap();
        assert!(matches!(
            load_game_state(&dir),
            Err(DataLoadError::Placement { .. })
        ));
        cleanup(&dir);
    }
}
