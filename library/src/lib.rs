//! Media library model and revision engine for the dmap workspace.
//!
//! A [`Library`] is the live, mutable set of [`Database`]s a server shares.
//! [`RevisionManager::commit`] copies it into an immutable [`Snapshot`] and
//! wakes everyone waiting for a newer revision. Listings for a client are
//! built from a snapshot, and deletions are computed against an older
//! retained snapshot (the baseline).
//!
//! # Features
//!
//! - Databases, tracks and playlists with stable ids and a change log
//! - A bounded window of published snapshots with a blocking wait for change
//! - Deletion sets between two snapshots
//! - DAAP listing bodies, both directions
//! - Discovery records for the external announcement layer
//!
//! # Design Principles
//!
//! - **Snapshots are values** - Once committed a snapshot never changes and is
//!   shared through `Arc` without locking.
//! - **One lock for revisions** - Commit, eviction and the wait condition share a
//!   single mutex, so a waiter can never miss a commit.
//! - **Explicit change log** - Mutations record [`LibraryEvent`]s instead of firing
//!   callbacks.

mod database;
mod diff;
mod discovery;
mod events;
mod history;
mod library;
mod listing;
mod playlist;
mod revision;
mod track;
mod types;

pub use database::{Database, BASE_PLAYLIST_ID};
pub use diff::{removed_entries, removed_tracks};
pub use discovery::{Advertisement, ServiceRecord, SERVICE_TYPE};
pub use events::LibraryEvent;
pub use history::{HistoryError, RevisionHistory};
pub use library::Library;
pub use listing::{
    databases_node, login_node, parse_databases, parse_login, parse_playlists, parse_update,
    playlist_tracks_node, playlists_node, tracks_node, update_node, DatabaseSummary,
    ListingError, PlaylistSummary, PlaylistTracksListing, TrackListing, UpdateType,
};
pub use playlist::{Playlist, PlaylistEntry};
pub use revision::{RevisionManager, Snapshot, Stopped, DEFAULT_HISTORY_LIMIT};
pub use track::{parse_meta, Track, DEFAULT_META, ITEM_KIND_AUDIO};
pub use types::{ContainerItemId, DatabaseId, PlaylistId, Revision, TrackId};
