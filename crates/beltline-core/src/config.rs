//! Engine configuration.
//!
//! Every machine copies the geometry it needs out of [`EngineConfig`] when it
//! is constructed, so changing the config after placement never alters the
//! behaviour of machines already on the grid.

use crate::fixed::Fixed64;
use crate::transport::LaneGeometry;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Errors from [`EngineConfig::validate`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{field} must be positive")]
    NotPositive { field: &'static str },
    #[error("{field}: minimum spacing exceeds the lane length")]
    SpacingExceedsLength { field: &'static str },
    #[error("{field} must be at least 1")]
    Zero { field: &'static str },
}

/// Geometry of a belt tile's lanes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaneConfig {
    /// Lane length in position units (one tile).
    pub length: Fixed64,
    /// Position units advanced per tick.
    pub speed: Fixed64,
    /// Minimum distance between two adjacent items on a lane.
    pub min_spacing: Fixed64,
}

impl LaneConfig {
    pub fn geometry(&self) -> LaneGeometry {
        LaneGeometry {
            length: self.length,
            speed: self.speed,
            min_spacing: self.min_spacing,
        }
    }

    fn validate(&self, field: &'static str) -> Result<(), ConfigError> {
        if self.length <= Fixed64::ZERO || self.speed <= Fixed64::ZERO {
            return Err(ConfigError::NotPositive { field });
        }
        if self.min_spacing <= Fixed64::ZERO {
            return Err(ConfigError::NotPositive { field });
        }
        if self.min_spacing > self.length {
            return Err(ConfigError::SpacingExceedsLength { field });
        }
        Ok(())
    }
}

impl Default for LaneConfig {
    fn default() -> Self {
        Self {
            length: Fixed64::from_num(100),
            speed: Fixed64::from_num(1),
            min_spacing: Fixed64::from_num(5),
        }
    }
}

/// Junction crossing geometry and queue bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JunctionConfig {
    pub lane: LaneConfig,
    /// Maximum items waiting per entry lane.
    pub queue_capacity: usize,
}

impl Default for JunctionConfig {
    fn default() -> Self {
        Self {
            lane: LaneConfig::default(),
            queue_capacity: 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Ticks per transferred item.
    pub cadence: u32,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self { cadence: 3 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Ticks per produced item.
    pub interval: u32,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self { interval: 5 }
    }
}

/// Limits on the chunked grid. `None` means unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridConfig {
    /// Largest absolute chunk coordinate that may be allocated.
    pub chunk_radius: Option<i32>,
    /// Maximum number of chunks that may be allocated.
    pub max_chunks: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Wall-clock time credited per [`crate::engine::GameState::step`].
    pub tick_duration: Duration,
    /// Capacity of each per-kind event history buffer.
    pub event_history: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_duration: Duration::from_micros(16_667),
            event_history: 256,
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub belt: LaneConfig,
    pub junction: JunctionConfig,
    pub loader: LoaderConfig,
    pub source: SourceConfig,
    pub grid: GridConfig,
    pub sim: SimConfig,
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.belt.validate("belt")?;
        self.junction.lane.validate("junction.lane")?;
        if self.junction.queue_capacity == 0 {
            return Err(ConfigError::Zero {
                field: "junction.queue_capacity",
            });
        }
        if self.loader.cadence == 0 {
            return Err(ConfigError::Zero {
                field: "loader.cadence",
            });
        }
        if self.source.interval == 0 {
            return Err(ConfigError::Zero {
                field: "source.interval",
            });
        }
        Ok(())
    }
}
