use std::time::Duration;

use sbctl_frame::{FrameConfig, DEFAULT_MAX_PAYLOAD};
use sbctl_transport::DEFAULT_CONNECT_TIMEOUT;

/// Default idle period after which an open connection is closed.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_millis(5000);

/// Default delay before reconnecting when work is still queued.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(1000);

/// Default bound on writing one frame to a device that has stopped reading.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_millis(5000);

/// Configuration for a [`crate::Session`].
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Close the socket after this long without traffic.
    pub idle_timeout: Duration,
    /// Wait this long before reconnecting after a close or failed connect.
    pub reconnect_delay: Duration,
    /// Upper bound on a single TCP connect attempt.
    pub connect_timeout: Duration,
    /// A write still pending after this long counts as a socket error.
    pub write_timeout: Duration,
    /// Largest ciphertext accepted from the device.
    pub max_payload_size: usize,
}

impl SessionConfig {
    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    pub fn with_reconnect_delay(mut self, reconnect_delay: Duration) -> Self {
        self.reconnect_delay = reconnect_delay;
        self
    }

    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    pub fn with_write_timeout(mut self, write_timeout: Duration) -> Self {
        self.write_timeout = write_timeout;
        self
    }

    pub(crate) fn frame_config(&self) -> FrameConfig {
        FrameConfig {
            max_payload_size: self.max_payload_size,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            max_payload_size: DEFAULT_MAX_PAYLOAD,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_device_protocol() {
        let config = SessionConfig::default();
        assert_eq!(config.idle_timeout, Duration::from_millis(5000));
        assert_eq!(config.reconnect_delay, Duration::from_millis(1000));
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.write_timeout, Duration::from_secs(5));
        assert_eq!(config.frame_config().max_payload_size, 64 * 1024);
    }

    #[test]
    fn builders_override_single_fields() {
        let config = SessionConfig::default()
            .with_idle_timeout(Duration::from_secs(30))
            .with_reconnect_delay(Duration::from_millis(250))
            .with_write_timeout(Duration::from_millis(750));
        assert_eq!(config.idle_timeout, Duration::from_secs(30));
        assert_eq!(config.write_timeout, Duration::from_millis(750));
        assert_eq!(config.reconnect_delay, Duration::from_millis(250));
        assert_eq!(config.connect_timeout, DEFAULT_CONNECT_TIMEOUT);
    }
}
