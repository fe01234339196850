//! Error types for the server.

use library::{HistoryError, Stopped};
use thiserror::Error;
use transport::{Status, TransportError};
use wire::EncodeError;

/// Why a single request failed.
///
/// Every variant except [`Transport`](Self::Transport) is answered with
/// [`status`](Self::status) and the display text as body; a transport
/// failure aborts the connection instead.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("invalid session id")]
    InvalidSession,

    #[error("invalid database id")]
    InvalidDatabase,

    #[error("invalid track id")]
    InvalidTrack,

    #[error("invalid playlist id")]
    InvalidPlaylist,

    #[error("unknown request")]
    UnknownPath,

    #[error("too many users")]
    TooManyUsers,

    #[error(transparent)]
    Stopped(#[from] Stopped),

    #[error("no file")]
    NoFile,

    #[error("failed to open track file: {0}")]
    File(#[source] std::io::Error),

    #[error("failed to encode response: {0}")]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl RequestError {
    #[must_use]
    pub const fn status(&self) -> Status {
        match self {
            Self::InvalidSession | Self::UnknownPath => Status::Forbidden,
            Self::InvalidDatabase | Self::InvalidTrack | Self::InvalidPlaylist => {
                Status::BadRequest
            }
            Self::TooManyUsers => Status::ServiceUnavailable,
            Self::Stopped(_) => Status::NotFound,
            Self::NoFile | Self::File(_) | Self::Encode(_) | Self::Transport(_) => {
                Status::InternalServerError
            }
        }
    }
}

/// Errors starting, configuring or committing a server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("invalid configuration: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid configuration: '{field}' {reason}")]
    InvalidConfig {
        field: &'static str,
        reason: &'static str,
    },

    #[error("revision history error: {0}")]
    History(#[from] HistoryError),

    #[error("server is already running")]
    AlreadyRunning,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses() {
        assert_eq!(RequestError::InvalidSession.status().code(), 403);
        assert_eq!(RequestError::UnknownPath.status().code(), 403);
        assert_eq!(RequestError::InvalidDatabase.status().code(), 400);
        assert_eq!(RequestError::InvalidPlaylist.status().code(), 400);
        assert_eq!(RequestError::TooManyUsers.status().code(), 503);
        assert_eq!(RequestError::Stopped(Stopped).status().code(), 404);
        assert_eq!(RequestError::NoFile.status().code(), 500);
    }

    #[test]
    fn bodies() {
        assert_eq!(RequestError::InvalidSession.to_string(), "invalid session id");
        assert_eq!(RequestError::TooManyUsers.to_string(), "too many users");
        assert_eq!(
            RequestError::Stopped(Stopped).to_string(),
            "server has been stopped"
        );
    }

    #[test]
    fn invalid_config_display() {
        let err = ServerError::InvalidConfig {
            field: "revision_history",
            reason: "must be at least 1",
        };
        assert_eq!(
            err.to_string(),
            "invalid configuration: 'revision_history' must be at least 1"
        );
    }
}
