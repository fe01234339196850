//! Configurable limits for bounded decoding.

/// Decode limits for DMAP messages.
///
/// Enforced while decoding so a hostile peer cannot force unbounded memory
/// use or recursion. Encoding is not limited.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Limits {
    /// Maximum size of one top-level message in bytes.
    pub max_message_bytes: usize,

    /// Maximum container nesting depth.
    pub max_depth: usize,

    /// Maximum number of nodes in one message.
    pub max_nodes: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            // large libraries produce multi-megabyte listings
            max_message_bytes: 64 * 1024 * 1024,

            // real responses nest five or six levels
            max_depth: 32,
            max_nodes: 4 * 1024 * 1024,
        }
    }
}

impl Limits {
    /// Creates limits suitable for testing with smaller values.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            max_message_bytes: 64 * 1024,
            max_depth: 8,
            max_nodes: 4096,
        }
    }

    /// Creates limits with no restrictions (use with caution).
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            max_message_bytes: usize::MAX,
            max_depth: usize::MAX,
            max_nodes: usize::MAX,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_limits_allow_large_listings() {
        let limits = Limits::default();
        assert!(limits.max_message_bytes >= 16 * 1024 * 1024);
        assert!(limits.max_nodes >= 1_000_000);
    }

    #[test]
    fn testing_limits_smaller() {
        let test_limits = Limits::for_testing();
        let default_limits = Limits::default();

        assert!(test_limits.max_message_bytes < default_limits.max_message_bytes);
        assert!(test_limits.max_depth < default_limits.max_depth);
        assert!(test_limits.max_nodes < default_limits.max_nodes);
    }

    #[test]
    fn unlimited_limits() {
        let limits = Limits::unlimited();
        assert_eq!(limits.max_message_bytes, usize::MAX);
        assert_eq!(limits.max_depth, usize::MAX);
        assert_eq!(limits.max_nodes, usize::MAX);
    }

    #[test]
    fn limits_const_constructible() {
        const LIMITS: Limits = Limits::for_testing();
        assert_eq!(LIMITS.max_depth, 8);
    }
}
