//! Lobby configuration, loaded from TOML.

use std::path::Path;

use serde::Deserialize;

use crate::state::grid::DEFAULT_GRID_DIMENSION;

/// Default capacity of a lobby worker's inbox.
pub const DEFAULT_INBOX_CAPACITY: usize = 64;

/// Per-lobby settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LobbyConfig {
    /// Side length of every player's grid
    pub grid_dimension: usize,
    /// Queued events per lobby before senders wait
    pub inbox_capacity: usize,
}

impl Default for LobbyConfig {
    fn default() -> Self {
        Self {
            grid_dimension: DEFAULT_GRID_DIMENSION,
            inbox_capacity: DEFAULT_INBOX_CAPACITY,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl LobbyConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;
        tracing::info!(
            path = %path.display(),
            grid_dimension = config.grid_dimension,
            "Loaded lobby config"
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_dimension == 0 {
            return Err(ConfigError::Invalid(
                "grid_dimension must be at least 1".to_string(),
            ));
        }
        if self.inbox_capacity == 0 {
            return Err(ConfigError::Invalid(
                "inbox_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
