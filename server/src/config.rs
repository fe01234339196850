//! Server configuration.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroUsize;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use transport::{AuthMethod, Credential, TransportLimits};

use crate::error::ServerError;

/// Port DAAP servers listen on by default.
pub const DEFAULT_PORT: u16 = 3689;

/// Seconds of inactivity after which a session expires.
pub const DEFAULT_SESSION_TIMEOUT_SECS: u64 = 30 * 60;

/// Everything needed to start a [`Server`](crate::Server).
///
/// Every field has a default, so a TOML file only lists what it changes:
///
/// ```toml
/// name = "Living Room"
/// port = 3689
/// auth_method = "password"
/// credentials = [{ password = "secret" }]
/// max_users = 4
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Share name, also used as the authentication realm.
    pub name: String,
    pub bind_address: IpAddr,
    /// Zero picks an ephemeral port.
    pub port: u16,
    pub auth_method: AuthMethod,
    pub credentials: Vec<Credential>,
    /// Concurrent sessions allowed; zero means unlimited.
    pub max_users: usize,
    pub session_timeout_secs: u64,
    /// Committed revisions retained for delta requests.
    pub revision_history: usize,
    pub machine_id: Option<String>,
    pub limits: TransportLimits,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "dmap".into(),
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            auth_method: AuthMethod::None,
            credentials: Vec::new(),
            max_users: 0,
            session_timeout_secs: DEFAULT_SESSION_TIMEOUT_SECS,
            revision_history: library::DEFAULT_HISTORY_LIMIT.get(),
            machine_id: None,
            limits: TransportLimits::default(),
        }
    }
}

impl ServerConfig {
    /// Creates a configuration for `name` with everything else defaulted.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ServerError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ServerError> {
        Self::from_toml_str(&std::fs::read_to_string(path)?)
    }

    pub fn validate(&self) -> Result<(), ServerError> {
        self.history_limit()?;
        if self.session_timeout_secs == 0 {
            return Err(ServerError::InvalidConfig {
                field: "session_timeout_secs",
                reason: "must be at least 1",
            });
        }
        Ok(())
    }

    pub fn history_limit(&self) -> Result<NonZeroUsize, ServerError> {
        NonZeroUsize::new(self.revision_history).ok_or(ServerError::InvalidConfig {
            field: "revision_history",
            reason: "must be at least 1",
        })
    }

    #[must_use]
    pub const fn session_timeout(&self) -> Duration {
        Duration::from_secs(self.session_timeout_secs)
    }

    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }
}
