//! Serde data file structs for item catalogs, engine configuration and map
//! layouts.
//!
//! Numbers are plain `f64` / integers on disk and converted to engine types
//! (fixed-point geometry, `Duration`) when the data is resolved.

use beltline_core::config::{
    EngineConfig, GridConfig, JunctionConfig, LaneConfig, LoaderConfig, SimConfig, SourceConfig,
};
use beltline_core::fixed::f64_to_fixed64;
use beltline_core::grid::{Direction, Side};
use serde::Deserialize;
use std::time::Duration;

// ===========================================================================
// Items
// ===========================================================================

/// An item type definition in a data file.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemData {
    pub name: String,
    /// Sprite key; defaults to the item name.
    #[serde(default)]
    pub sprite: Option<String>,
}

// ===========================================================================
// Configuration
// ===========================================================================

/// Lane geometry in position units.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct LaneData {
    pub length: f64,
    pub speed: f64,
    pub min_spacing: f64,
}

impl Default for LaneData {
    fn default() -> Self {
        Self {
            length: 100.0,
            speed: 1.0,
            min_spacing: 5.0,
        }
    }
}

impl LaneData {
    fn into_config(self) -> LaneConfig {
        LaneConfig {
            length: f64_to_fixed64(self.length),
            speed: f64_to_fixed64(self.speed),
            min_spacing: f64_to_fixed64(self.min_spacing),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct JunctionData {
    pub lane: LaneData,
    pub queue_capacity: usize,
}

impl Default for JunctionData {
    fn default() -> Self {
        Self {
            lane: LaneData::default(),
            queue_capacity: 4,
        }
    }
}

/// The `config` data file. Every section and field is optional.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConfigData {
    pub belt: LaneData,
    pub junction: JunctionData,
    pub loader_cadence: u32,
    pub source_interval: u32,
    pub chunk_radius: Option<i32>,
    pub max_chunks: Option<usize>,
    /// Wall-clock duration of one tick.
    pub tick_micros: u64,
    pub event_history: usize,
}

impl Default for ConfigData {
    fn default() -> Self {
        Self {
            belt: LaneData::default(),
            junction: JunctionData::default(),
            loader_cadence: 3,
            source_interval: 5,
            chunk_radius: None,
            max_chunks: None,
            tick_micros: 16_667,
            event_history: 256,
        }
    }
}

impl ConfigData {
    /// Convert to engine configuration. Validation happens when the game
    /// state is built.
    pub fn into_config(self) -> EngineConfig {
        EngineConfig {
            belt: self.belt.into_config(),
            junction: JunctionConfig {
                lane: self.junction.lane.into_config(),
                queue_capacity: self.junction.queue_capacity,
            },
            loader: LoaderConfig {
                cadence: self.loader_cadence,
            },
            source: SourceConfig {
                interval: self.source_interval,
            },
            grid: GridConfig {
                chunk_radius: self.chunk_radius,
                max_chunks: self.max_chunks,
            },
            sim: SimConfig {
                tick_duration: Duration::from_micros(self.tick_micros),
                event_history: self.event_history,
            },
        }
    }
}

// ===========================================================================
// Layout
// ===========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MachineKindData {
    Belt,
    Junction,
    Loader,
    Source,
    Sink,
}

/// A junction turn: items entering through `entered_from` leave via `exit`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RouteData {
    pub entered_from: Direction,
    pub exit: Direction,
}

/// One machine in a layout. Fields that do not apply to `kind` are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct MachineData {
    pub kind: MachineKindData,
    pub x: i32,
    pub y: i32,
    /// Required for belts, loaders and sources.
    #[serde(default)]
    pub direction: Option<Direction>,
    /// Item name a source produces.
    #[serde(default)]
    pub item: Option<String>,
    /// Source production interval override.
    #[serde(default)]
    pub interval: Option<u32>,
    /// Total a source may produce.
    #[serde(default)]
    pub limit: Option<u32>,
    /// Loader cadence override.
    #[serde(default)]
    pub cadence: Option<u32>,
    /// Sink capacity.
    #[serde(default)]
    pub capacity: Option<u32>,
    #[serde(default)]
    pub routes: Vec<RouteData>,
}

/// An item placed on a belt lane before the first tick.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedData {
    pub x: i32,
    pub y: i32,
    pub side: Side,
    pub position: f64,
    pub item: String,
}

/// The `layout` data file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LayoutData {
    pub machines: Vec<MachineData>,
    pub items: Vec<SeedData>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_matches_engine_defaults() {
        let data: ConfigData = serde_json::from_str("{}").unwrap();
        assert_eq!(data.into_config(), EngineConfig::default());
    }

    #[test]
    fn partial_lane_keeps_other_defaults() {
        let data: ConfigData = toml::from_str("[belt]\nspeed = 2.5\n").unwrap();
        let config = data.into_config();
        assert_eq!(config.belt.speed, f64_to_fixed64(2.5));
        assert_eq!(config.belt.length, f64_to_fixed64(100.0));
    }

    #[test]
    fn machine_entry_parses_from_ron() {
        let m: MachineData =
            ron::from_str("(kind: belt, x: 3, y: -1, direction: Some(Left))").unwrap();
        assert_eq!(m.kind, MachineKindData::Belt);
        assert_eq!(m.direction, Some(Direction::Left));
        assert!(m.routes.is_empty());
    }
}
