//! # Processor Configuration
//!
//! Local settings for the settings check, loaded once at startup.
//!
//! ```toml
//! window_ms = 1000
//! sink_buffer = 1024
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use warden_shared::DEFAULT_WINDOW_MS;

use crate::error::{read_file, SecurityError, SecurityResult};

/// Default capacity of the channel to the verification backend.
const DEFAULT_SINK_BUFFER: usize = 1024;

/// Configuration for [`SettingsCheckProcessor`](crate::SettingsCheckProcessor).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    /// Aggregation window from the first fragment, in milliseconds.
    pub window_ms: u64,
    /// Capacity of the bounded channel used by [`ChannelSink`](crate::ChannelSink).
    pub sink_buffer: usize,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            window_ms: DEFAULT_WINDOW_MS,
            sink_buffer: DEFAULT_SINK_BUFFER,
        }
    }
}

impl ProcessorConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(source: &str) -> SecurityResult<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a TOML file.
    pub fn load(path: impl AsRef<Path>) -> SecurityResult<Self> {
        Self::from_toml_str(&read_file(path.as_ref())?)
    }

    /// Checks value ranges.
    pub fn validate(&self) -> SecurityResult<()> {
        if self.window_ms == 0 {
            return Err(SecurityError::InvalidConfig(
                "window_ms must be greater than zero".into(),
            ));
        }
        if self.sink_buffer == 0 {
            return Err(SecurityError::InvalidConfig(
                "sink_buffer must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// The aggregation window.
    #[inline]
    #[must_use]
    pub const fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}
