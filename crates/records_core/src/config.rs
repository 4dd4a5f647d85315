//! Store configuration loaded from TOML.
//!
//! # Responsibility
//! - Describe where the catalog database lives and which authority it serves.
//! - Build a ready-to-use store from that description.
//!
//! # Invariants
//! - A missing config file yields defaults; a malformed one is an error.

use crate::address::{AddressMatcher, AddressPatternError};
use crate::contract::{DATABASE_NAME, DEFAULT_AUTHORITY};
use crate::notify::ChangeNotifier;
use crate::store::{SqliteRecordStore, StoreError};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const DEFAULT_CONFIG_FILE: &str = "records.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub authority: String,
    pub database: PathBuf,
    pub log_level: Option<String>,
    pub log_dir: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            authority: DEFAULT_AUTHORITY.to_string(),
            database: PathBuf::from(DATABASE_NAME),
            log_level: None,
            log_dir: None,
        }
    }
}

impl StoreConfig {
    pub fn matcher(&self) -> Result<AddressMatcher, ConfigError> {
        Ok(AddressMatcher::for_records(self.authority.as_str())?)
    }

    /// Opens the configured database, creating its parent directory if needed.
    pub fn open_store(&self, notifier: Arc<ChangeNotifier>) -> Result<SqliteRecordStore, ConfigError> {
        if let Some(parent) = self.database.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|err| ConfigError::Io {
                    path: parent.to_path_buf(),
                    source: err,
                })?;
            }
        }
        Ok(SqliteRecordStore::open(&self.database, self.matcher()?, notifier)?)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    Matcher(AddressPatternError),
    Store(StoreError),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "failed to access `{}`: {source}", path.display()),
            Self::Parse { path, source } => {
                write!(f, "invalid config `{}`: {source}", path.display())
            }
            Self::Matcher(err) => write!(f, "invalid authority: {err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::Matcher(err) => Some(err),
            Self::Store(err) => Some(err),
        }
    }
}

impl From<AddressPatternError> for ConfigError {
    fn from(value: AddressPatternError) -> Self {
        Self::Matcher(value)
    }
}

impl From<StoreError> for ConfigError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Loads `path`, or `records.toml` in the working directory when `None`.
pub fn load_config(path: Option<&Path>) -> Result<StoreConfig, ConfigError> {
    let path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    if !path.exists() {
        return Ok(StoreConfig::default());
    }

    let contents = std::fs::read_to_string(&path).map_err(|err| ConfigError::Io {
        path: path.clone(),
        source: err,
    })?;
    toml::from_str(&contents).map_err(|err| ConfigError::Parse { path, source: err })
}
