//! Data-file loading for Beltline: item catalogs, engine configuration and
//! map layouts in RON, TOML or JSON.

pub mod loader;
pub mod schema;
pub mod world;

pub use loader::DataLoadError;
pub use world::{load_catalog, load_config, load_game_state};
