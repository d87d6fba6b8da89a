use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::driver::Bitrate;
use crate::error::EngineError;
use crate::logsink::DEFAULT_LOG_CAPACITY;

/// Default transmit period.
pub const DEFAULT_TX_PERIOD_MS: u64 = 10;

// First adapter channel, matching the usual single-adapter setup.
const DEFAULT_CHANNEL: u8 = 1;

/// Engine configuration, fixed at session start.
///
/// Deserializable so the CLI can load it from a JSON file; none of these
/// values are mutable while the session is Running.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Adapter channel index the driver is bound to.
    pub channel: u8,
    pub bitrate: Bitrate,
    pub tx_period_ms: u64,
    pub log_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            channel: DEFAULT_CHANNEL,
            bitrate: Bitrate::default(),
            tx_period_ms: DEFAULT_TX_PERIOD_MS,
            log_capacity: DEFAULT_LOG_CAPACITY,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.tx_period_ms == 0 {
            return Err(EngineError::InvalidConfig("tx_period_ms must be >= 1"));
        }
        if self.log_capacity == 0 {
            return Err(EngineError::InvalidConfig("log_capacity must be >= 1"));
        }
        Ok(())
    }

    pub fn tx_period(&self) -> Duration {
        Duration::from_millis(self.tx_period_ms)
    }
}
