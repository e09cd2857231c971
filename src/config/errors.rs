//! Configuration error types
//!
//! Error codes:
//! - CAIRN_CONFIG_IO (ERROR)
//! - CAIRN_CONFIG_INVALID (ERROR)
//!
//! Configuration errors are raised before the engine touches the data
//! directory.

use std::fmt;
use std::io;

/// Configuration error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigErrorCode {
    /// The configuration file could not be read
    CairnConfigIo,
    /// The configuration is malformed or fails validation
    CairnConfigInvalid,
}

impl ConfigErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            ConfigErrorCode::CairnConfigIo => "CAIRN_CONFIG_IO",
            ConfigErrorCode::CairnConfigInvalid => "CAIRN_CONFIG_INVALID",
        }
    }
}

impl fmt::Display for ConfigErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[derive(Debug)]
pub struct ConfigError {
    code: ConfigErrorCode,
    message: String,
    source: Option<io::Error>,
}

impl ConfigError {
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Self {
            code: ConfigErrorCode::CairnConfigIo,
            message: message.into(),
            source: Some(source),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            code: ConfigErrorCode::CairnConfigInvalid,
            message: message.into(),
            source: None,
        }
    }

    pub fn code(&self) -> ConfigErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[ERROR] {}: {}", self.code.code(), self.message)?;
        if let Some(ref source) = self.source {
            write!(f, " (caused by: {})", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e as &(dyn std::error::Error + 'static))
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;
