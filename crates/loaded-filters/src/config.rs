//! Filter manager configuration and validation
//!
//! # Example
//!
//! ```ignore
//! use loaded_filters::FilterManagerConfigBuilder;
//!
//! let config = FilterManagerConfigBuilder::new()
//!     .refresh_interval_ms(500)
//!     .initial_delay_ms(0)
//!     .build()
//!     .expect("Valid config");
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::FilterError;

/// Environment variable overriding `refresh_interval_ms`
pub const ENV_REFRESH_INTERVAL_MS: &str = "BFD_FILTER_REFRESH_INTERVAL_MS";
/// Environment variable overriding `initial_delay_ms`
pub const ENV_INITIAL_DELAY_MS: &str = "BFD_FILTER_INITIAL_DELAY_MS";
/// Environment variable overriding `batch_fetch_size`
pub const ENV_BATCH_FETCH_SIZE: &str = "BFD_FILTER_BATCH_FETCH_SIZE";

/// Filter manager configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterManagerConfig {
    /// Delay between the end of one refresh and the start of the next
    pub refresh_interval_ms: u64,
    /// Delay before the first refresh
    pub initial_delay_ms: u64,
    /// Batches fetched per store call while building one filter
    pub batch_fetch_size: usize,
}

impl Default for FilterManagerConfig {
    fn default() -> Self {
        Self {
            refresh_interval_ms: 1_000,
            initial_delay_ms: 2_000,
            batch_fetch_size: 100_000,
        }
    }
}

impl FilterManagerConfig {
    /// Defaults overridden by any `BFD_FILTER_*` environment variables
    ///
    /// Unparsable values are logged and ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(ENV_REFRESH_INTERVAL_MS) {
            match value.parse() {
                Ok(ms) => config.refresh_interval_ms = ms,
                Err(_) => warn!(key = ENV_REFRESH_INTERVAL_MS, %value, "Ignoring invalid value"),
            }
        }
        if let Some(value) = lookup(ENV_INITIAL_DELAY_MS) {
            match value.parse() {
                Ok(ms) => config.initial_delay_ms = ms,
                Err(_) => warn!(key = ENV_INITIAL_DELAY_MS, %value, "Ignoring invalid value"),
            }
        }
        if let Some(value) = lookup(ENV_BATCH_FETCH_SIZE) {
            match value.parse() {
                Ok(size) => config.batch_fetch_size = size,
                Err(_) => warn!(key = ENV_BATCH_FETCH_SIZE, %value, "Ignoring invalid value"),
            }
        }

        config
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), FilterError> {
        if self.refresh_interval_ms == 0 {
            return Err(FilterError::InvalidParameters(
                "refresh_interval_ms cannot be 0".to_string(),
            ));
        }
        if self.batch_fetch_size == 0 {
            return Err(FilterError::InvalidParameters(
                "batch_fetch_size cannot be 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }
}

/// Builder for FilterManagerConfig with validation
#[derive(Default)]
pub struct FilterManagerConfigBuilder {
    refresh_interval_ms: Option<u64>,
    initial_delay_ms: Option<u64>,
    batch_fetch_size: Option<usize>,
}

impl FilterManagerConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refresh_interval_ms(mut self, ms: u64) -> Self {
        self.refresh_interval_ms = Some(ms);
        self
    }

    pub fn initial_delay_ms(mut self, ms: u64) -> Self {
        self.initial_delay_ms = Some(ms);
        self
    }

    pub fn batch_fetch_size(mut self, size: usize) -> Self {
        self.batch_fetch_size = Some(size);
        self
    }

    /// Build the configuration, validating all parameters
    pub fn build(self) -> Result<FilterManagerConfig, FilterError> {
        let defaults = FilterManagerConfig::default();

        let config = FilterManagerConfig {
            refresh_interval_ms: self.refresh_interval_ms.unwrap_or(defaults.refresh_interval_ms),
            initial_delay_ms: self.initial_delay_ms.unwrap_or(defaults.initial_delay_ms),
            batch_fetch_size: self.batch_fetch_size.unwrap_or(defaults.batch_fetch_size),
        };

        config.validate()?;
        Ok(config)
    }
}
