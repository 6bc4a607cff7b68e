use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::constants::{
    DEFAULT_ENDPOINT, DEFAULT_SOURCE_FILE, INTER_TICK_DELAY_MS, SUBSCRIBER_WARMUP_MS,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("CSV file not found: {}", .0.display())]
    SourceNotFound(PathBuf),
    #[error("{name} must be a finite, non-negative number of seconds, got {value}")]
    InvalidSeconds { name: &'static str, value: f64 },
}

#[derive(Clone, Debug)]
pub struct FeederConfig {
    /// CSV file with `timestamp_ms`, `symbol`, `price` and `volume` columns.
    pub source: PathBuf,
    /// PUB endpoint subscribers connect to.
    pub endpoint: String,
    /// Pause after each published tick.
    pub delay: Duration,
    /// Pause between bind and the first send so subscribers can finish their handshake.
    pub warmup: Duration,
}

impl Default for FeederConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::from(DEFAULT_SOURCE_FILE),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            delay: Duration::from_millis(INTER_TICK_DELAY_MS),
            warmup: Duration::from_millis(SUBSCRIBER_WARMUP_MS),
        }
    }
}

impl FeederConfig {
    /// Rejects a source path that is not an existing regular file. Runs before
    /// any network resource is acquired.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source.is_file() {
            Ok(())
        } else {
            Err(ConfigError::SourceNotFound(self.source.clone()))
        }
    }
}

pub fn seconds(name: &'static str, value: f64) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(value).map_err(|_| ConfigError::InvalidSeconds { name, value })
}
