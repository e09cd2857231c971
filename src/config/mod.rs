//! Configuration for cairndb
//!
//! `EngineConfig` is loaded from a JSON file with serde defaults and
//! validated before the engine opens its data directory.

mod config;
mod errors;

pub use config::{EngineConfig, DEFAULT_CHECKPOINT_INTERVAL, DEFAULT_SNAPSHOT_FILE};
pub use errors::{ConfigError, ConfigErrorCode, ConfigResult};
