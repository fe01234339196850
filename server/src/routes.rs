//! Request paths.

use library::{DatabaseId, PlaylistId, TrackId};

/// Every path the server answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    ServerInfo,
    ContentCodes,
    Login,
    Logout,
    Update,
    Databases,
    Items { db: DatabaseId },
    /// `/databases/{db}/items/{track}[.ext]`
    Track { db: DatabaseId, track: TrackId },
    Containers { db: DatabaseId },
    ContainerItems { db: DatabaseId, playlist: PlaylistId },
}

fn id(segment: &str) -> Option<i32> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

/// Leading digits of `123.mp3`; the extension is ignored.
fn track_id(segment: &str) -> Option<i32> {
    let end = segment
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(segment.len());
    id(&segment[..end])
}

impl Route {
    /// Matches a request path; `None` for anything unknown.
    #[must_use]
    pub fn parse(path: &str) -> Option<Self> {
        let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();
        let route = match segments.as_slice() {
            ["server-info"] => Self::ServerInfo,
            ["content-codes"] => Self::ContentCodes,
            ["login"] => Self::Login,
            ["logout"] => Self::Logout,
            ["update"] => Self::Update,
            ["databases"] => Self::Databases,
            ["databases", db, "items"] => Self::Items {
                db: DatabaseId::new(id(db)?),
            },
            ["databases", db, "items", track] => Self::Track {
                db: DatabaseId::new(id(db)?),
                track: TrackId::new(track_id(track)?),
            },
            ["databases", db, "containers"] => Self::Containers {
                db: DatabaseId::new(id(db)?),
            },
            ["databases", db, "containers", playlist, "items"] => Self::ContainerItems {
                db: DatabaseId::new(id(db)?),
                playlist: PlaylistId::new(id(playlist)?),
            },
            _ => return None,
        };
        Some(route)
    }

    /// Everything except server info, content codes and login needs a
    /// valid session.
    #[must_use]
    pub const fn requires_session(self) -> bool {
        !matches!(self, Self::ServerInfo | Self::ContentCodes | Self::Login)
    }
}
