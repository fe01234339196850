//! Client configuration.

use std::time::Duration;

use transport::TransportLimits;
use wire::Limits;

/// Pause after a failed background update before trying again.
pub const DEFAULT_UPDATE_BACKOFF: Duration = Duration::from_secs(2 * 60);

/// Client tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Sleep between failed `/update` polls.
    pub update_backoff: Duration,

    /// Limit on establishing each connection; `None` uses the OS default.
    pub connect_timeout: Option<Duration>,

    /// Response head and body bounds.
    pub limits: TransportLimits,

    /// Bounds for decoding response bodies.
    pub decode_limits: Limits,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            update_backoff: DEFAULT_UPDATE_BACKOFF,
            connect_timeout: None,
            limits: TransportLimits::default(),
            decode_limits: Limits::default(),
        }
    }
}

impl ClientConfig {
    #[must_use]
    pub const fn with_update_backoff(mut self, backoff: Duration) -> Self {
        self.update_backoff = backoff;
        self
    }

    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }
}
