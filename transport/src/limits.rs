//! Bounds on what a peer may send.

/// Transport-level limits, applied on both the server and the client side.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TransportLimits {
    /// Maximum length of a request, status or header line in bytes.
    pub max_line_bytes: usize,

    /// Maximum number of header lines in one message.
    pub max_headers: usize,

    /// Maximum response body a client buffers in memory.
    pub max_body_bytes: u64,
}

impl Default for TransportLimits {
    fn default() -> Self {
        Self {
            max_line_bytes: 8 * 1024,
            max_headers: 64,
            // large libraries produce multi-megabyte listings
            max_body_bytes: 64 * 1024 * 1024,
        }
    }
}

impl TransportLimits {
    /// Creates limits suitable for testing with smaller values.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            max_line_bytes: 256,
            max_headers: 8,
            max_body_bytes: 64 * 1024,
        }
    }

    /// Creates limits with no restrictions (use with caution).
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            max_line_bytes: usize::MAX,
            max_headers: usize::MAX,
            max_body_bytes: u64::MAX,
        }
    }
}
