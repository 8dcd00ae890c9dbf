use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use derive_more::From;

use proto::consts::DEFAULT_MAX_ROUTES;

#[derive(Debug, From)]
pub enum ConfigError {
    IoError(io::Error),
    TomlDeError(toml::de::Error),
    /// `max_routes` must be positive
    InvalidMaxRoutes,
}

/// Configuration file of stpath
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PathConfig {
    /// Newline delimited JSON chain events
    pub event_log: PathBuf,
    /// Last processed block number
    pub checkpoint: PathBuf,
    /// SQLite fee rates database. Fee rates are kept in memory if not specified.
    #[serde(default)]
    pub fee_db: Option<PathBuf>,
    #[serde(default = "default_max_routes")]
    pub max_routes: usize,
}

fn default_max_routes() -> usize {
    DEFAULT_MAX_ROUTES
}

pub fn load_config(path: &Path) -> Result<PathConfig, ConfigError> {
    let data = fs::read_to_string(path)?;
    let path_config: PathConfig = toml::from_str(&data)?;
    if path_config.max_routes == 0 {
        return Err(ConfigError::InvalidMaxRoutes);
    }
    Ok(path_config)
}
