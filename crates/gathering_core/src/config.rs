//! Explicit core configuration.
//!
//! # Responsibility
//! - Describe which storage backend and log settings a process runs with.
//!
//! # Invariants
//! - Configuration is passed into construction; nothing here reads the
//!   process environment.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;

const SQLITE_PREFIX: &str = "sqlite:";

/// Storage backend selected for one process.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StorageBackend {
    /// Non-persistent maps, shared by every service of the process.
    #[default]
    InMemory,
    /// SQLite database file.
    Sqlite { path: PathBuf },
}

impl StorageBackend {
    /// Parses `memory` or `sqlite:<path>`.
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::EmptyBackend);
        }
        if trimmed.eq_ignore_ascii_case("memory") {
            return Ok(Self::InMemory);
        }
        if let Some(path) = trimmed.strip_prefix(SQLITE_PREFIX) {
            let path = path.trim();
            if path.is_empty() {
                return Err(ConfigError::MissingSqlitePath);
            }
            return Ok(Self::Sqlite {
                path: PathBuf::from(path),
            });
        }
        Err(ConfigError::UnsupportedBackend(trimmed.to_string()))
    }
}

impl FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

/// Process-level settings for the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub storage: StorageBackend,
    pub log_level: String,
    /// Absolute log directory; `None` leaves logging uninitialized.
    pub log_dir: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            storage: StorageBackend::InMemory,
            log_level: crate::logging::default_log_level().to_string(),
            log_dir: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    EmptyBackend,
    MissingSqlitePath,
    UnsupportedBackend(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyBackend => write!(f, "storage backend must not be empty"),
            Self::MissingSqlitePath => write!(f, "sqlite backend requires a path: sqlite:<path>"),
            Self::UnsupportedBackend(value) => write!(
                f,
                "unsupported storage backend `{value}`; expected memory|sqlite:<path>"
            ),
        }
    }
}

impl Error for ConfigError {}
