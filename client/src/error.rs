//! Client error types.

use std::io;

use library::{DatabaseId, ListingError, TrackId};
use thiserror::Error;
use transport::TransportError;
use wire::DecodeError;

/// A request made by the client failed.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("failed to decode response: {0}")]
    Decode(#[from] DecodeError),

    #[error("unexpected response: {0}")]
    Listing(#[from] ListingError),

    /// The server answered with a non-success status.
    #[error("{path} returned status {code}")]
    Status { path: String, code: u16 },

    #[error("not logged in")]
    NotLoggedIn,

    #[error("unknown database {0}")]
    UnknownDatabase(DatabaseId),

    #[error("unknown track {track} in database {database}")]
    UnknownTrack { database: DatabaseId, track: TrackId },
}

impl ClientError {
    /// The HTTP status, for [`ClientError::Status`].
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Logging in failed.
#[derive(Debug, Error)]
pub enum LoginError {
    /// The server rejected the credentials with 401.
    #[error("username or password incorrect")]
    Authentication,

    #[error("failed to login: {0}")]
    Failed(#[source] ClientError),
}

impl From<ClientError> for LoginError {
    fn from(err: ClientError) -> Self {
        if err.status() == Some(401) {
            Self::Authentication
        } else {
            Self::Failed(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_becomes_authentication() {
        let err = ClientError::Status {
            path: "/login".into(),
            code: 401,
        };
        assert!(matches!(LoginError::from(err), LoginError::Authentication));
    }

    #[test]
    fn other_failures_keep_their_source() {
        let err = LoginError::from(ClientError::Status {
            path: "/login".into(),
            code: 503,
        });
        let LoginError::Failed(source) = &err else {
            panic!("expected Failed, got {err:?}");
        };
        assert_eq!(source.status(), Some(503));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn display() {
        let err = ClientError::Status {
            path: "/databases".into(),
            code: 403,
        };
        assert_eq!(err.to_string(), "/databases returned status 403");
        assert_eq!(err.status(), Some(403));
        assert_eq!(ClientError::NotLoggedIn.status(), None);
    }
}
