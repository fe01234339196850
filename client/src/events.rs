//! Notifications delivered to [`Client::subscribe`](crate::Client::subscribe) receivers.

use library::{DatabaseId, LibraryEvent, Revision};

/// A change applied to the client's mirror.
///
/// Events of one update arrive in the order the mirror applied them,
/// followed by a single [`ClientEvent::Revision`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    DatabaseAdded(DatabaseId),
    DatabaseRemoved(DatabaseId),
    /// A track, playlist or name change inside a mirrored database.
    Library {
        database: DatabaseId,
        event: LibraryEvent,
    },
    /// The mirror now reflects this server revision.
    Revision(Revision),
}
