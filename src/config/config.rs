//! Engine configuration
//!
//! ```json
//! {
//!   "data_dir": "/var/lib/cairndb",
//!   "snapshot_file": "data.ddb",
//!   "wal_enabled": true,
//!   "checkpoint_interval": 1000,
//!   "indexes": ["email", "address.city"],
//!   "checkpoint_on_close": true
//! }
//! ```
//!
//! Every field except `data_dir` has a default. A configuration without a
//! data directory describes an in-memory engine.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::errors::{ConfigError, ConfigResult};

/// Default snapshot file name inside the data directory
pub const DEFAULT_SNAPSHOT_FILE: &str = "data.ddb";

/// Default number of WAL records between automatic checkpoints
pub const DEFAULT_CHECKPOINT_INTERVAL: u64 = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Data directory; `None` for an in-memory engine
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Snapshot file name inside `data_dir` (default: "data.ddb")
    #[serde(default = "default_snapshot_file")]
    pub snapshot_file: String,

    /// Whether mutations are logged (default: true)
    #[serde(default = "default_true")]
    pub wal_enabled: bool,

    /// WAL records between automatic checkpoints; 0 disables
    #[serde(default = "default_checkpoint_interval")]
    pub checkpoint_interval: u64,

    /// Fields indexed on open
    #[serde(default)]
    pub indexes: Vec<String>,

    /// Checkpoint when the engine is closed (default: true)
    #[serde(default = "default_true")]
    pub checkpoint_on_close: bool,
}

fn default_snapshot_file() -> String {
    DEFAULT_SNAPSHOT_FILE.to_string()
}

fn default_true() -> bool {
    true
}

fn default_checkpoint_interval() -> u64 {
    DEFAULT_CHECKPOINT_INTERVAL
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            snapshot_file: default_snapshot_file(),
            wal_enabled: true,
            checkpoint_interval: DEFAULT_CHECKPOINT_INTERVAL,
            indexes: Vec::new(),
            checkpoint_on_close: true,
        }
    }
}

impl EngineConfig {
    /// Configuration for a durable engine rooted at `data_dir`
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: Some(data_dir.into()),
            ..Default::default()
        }
    }

    /// Configuration with no data directory and no WAL
    pub fn in_memory() -> Self {
        Self {
            wal_enabled: false,
            checkpoint_on_close: false,
            ..Default::default()
        }
    }

    /// Adds a field to index on open
    pub fn with_index(mut self, field: impl Into<String>) -> Self {
        self.indexes.push(field.into());
        self
    }

    pub fn with_checkpoint_interval(mut self, interval: u64) -> Self {
        self.checkpoint_interval = interval;
        self
    }

    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::io(format!("Failed to read config {}", path.display()), e)
        })?;

        let config: EngineConfig = serde_json::from_str(&content)
            .map_err(|e| ConfigError::invalid(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Creates the data directory (and parents) if one is configured.
    pub fn ensure_data_dir(&self) -> ConfigResult<()> {
        if let Some(dir) = &self.data_dir {
            fs::create_dir_all(dir).map_err(|e| {
                ConfigError::io(format!("Failed to create data directory {}", dir.display()), e)
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(dir) = &self.data_dir {
            if dir.as_os_str().is_empty() {
                return Err(ConfigError::invalid("data_dir must not be empty"));
            }
        }

        if self.snapshot_file.trim().is_empty() {
            return Err(ConfigError::invalid("snapshot_file must not be empty"));
        }
        if self.snapshot_file.contains('/') || self.snapshot_file.contains('\\') {
            return Err(ConfigError::invalid(format!(
                "snapshot_file '{}' must be a file name, not a path",
                self.snapshot_file
            )));
        }

        let mut seen = HashSet::new();
        for field in &self.indexes {
            if field.trim().is_empty() {
                return Err(ConfigError::invalid("index field names must not be empty"));
            }
            if !seen.insert(field.as_str()) {
                return Err(ConfigError::invalid(format!("duplicate index field '{}'", field)));
            }
        }

        Ok(())
    }

    /// True if mutations are logged and checkpoints written
    pub fn is_durable(&self) -> bool {
        self.data_dir.is_some() && self.wal_enabled
    }

    /// Path of the snapshot file, if a data directory is set
    pub fn snapshot_path(&self) -> Option<PathBuf> {
        self.data_dir.as_ref().map(|dir| dir.join(&self.snapshot_file))
    }
}
