//! Change log entries produced by library mutations.

use crate::types::{PlaylistId, TrackId};

/// One mutation applied to a [`Database`](crate::Database).
///
/// Databases append these in mutation order; drain them with
/// [`Database::take_events`](crate::Database::take_events).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LibraryEvent {
    NameChanged,
    TrackAdded(TrackId),
    TrackUpdated(TrackId),
    TrackRemoved(TrackId),
    PlaylistAdded(PlaylistId),
    PlaylistRenamed(PlaylistId),
    PlaylistRemoved(PlaylistId),
    PlaylistTrackAdded {
        playlist: PlaylistId,
        index: usize,
        track: TrackId,
    },
    PlaylistTrackRemoved {
        playlist: PlaylistId,
        index: usize,
        track: TrackId,
    },
}
