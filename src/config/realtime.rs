//! Realtime delivery configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Realtime delivery configuration
///
/// Covers both the server side (per-conversation broadcast rooms) and the
/// client fallback (polling interval when the socket is not connected).
#[derive(Debug, Clone, Deserialize)]
pub struct RealtimeConfig {
    /// Buffer size for each conversation room's broadcast channel
    #[serde(default = "default_room_channel_capacity")]
    pub room_channel_capacity: usize,

    /// Polling-fallback interval in seconds when the socket is disconnected
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Seconds between connection-state re-checks while the socket is live
    #[serde(default = "default_heartbeat")]
    pub heartbeat_secs: u64,
}

impl RealtimeConfig {
    /// Get poll interval as Duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Get heartbeat interval as Duration
    pub fn heartbeat(&self) -> Duration {
        Duration::from_secs(self.heartbeat_secs)
    }

    /// Validate realtime configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.poll_interval_secs == 0 || self.poll_interval_secs > 60 {
            return Err(ValidationError::InvalidPollInterval);
        }
        if self.room_channel_capacity < 16 || self.room_channel_capacity > 4096 {
            return Err(ValidationError::InvalidChannelCapacity);
        }
        Ok(())
    }
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            room_channel_capacity: default_room_channel_capacity(),
            poll_interval_secs: default_poll_interval(),
            heartbeat_secs: default_heartbeat(),
        }
    }
}

fn default_room_channel_capacity() -> usize {
    128
}

fn default_poll_interval() -> u64 {
    3
}

fn default_heartbeat() -> u64 {
    15
}
