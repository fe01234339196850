//! Reconciling the local mirror with server listings.
//!
//! Every function here is idempotent: applying the same listing twice
//! leaves the mirror unchanged the second time and logs no events.

use std::collections::HashSet;

use library::{
    Database, DatabaseId, DatabaseSummary, Playlist, PlaylistId, PlaylistSummary,
    PlaylistTracksListing, Revision, Track, TrackId, TrackListing, UpdateType,
};

use crate::events::ClientEvent;

/// The client's copy of a server's databases.
#[derive(Debug, Default)]
pub(crate) struct Mirror {
    databases: Vec<Database>,
    revision: Revision,
}

impl Mirror {
    pub(crate) const fn revision(&self) -> Revision {
        self.revision
    }

    pub(crate) fn set_revision(&mut self, revision: Revision) {
        self.revision = revision;
    }

    pub(crate) fn databases(&self) -> &[Database] {
        &self.databases
    }

    pub(crate) fn database(&self, id: DatabaseId) -> Option<&Database> {
        self.databases.iter().find(|db| db.id() == id)
    }

    pub(crate) fn database_mut(&mut self, id: DatabaseId) -> Option<&mut Database> {
        self.databases.iter_mut().find(|db| db.id() == id)
    }

    /// Adds, renames and drops databases to match a `/databases` listing.
    pub(crate) fn apply_databases(
        &mut self,
        summaries: &[DatabaseSummary],
        events: &mut Vec<ClientEvent>,
    ) {
        for summary in summaries {
            match self.database_mut(summary.id) {
                Some(db) => {
                    db.set_name(summary.name.as_str());
                    drain_events(db, events);
                }
                None => {
                    self.databases
                        .push(Database::new(summary.id, summary.name.as_str()));
                    events.push(ClientEvent::DatabaseAdded(summary.id));
                }
            }
        }
        let listed: HashSet<DatabaseId> = summaries.iter().map(|s| s.id).collect();
        self.databases.retain(|db| {
            let keep = listed.contains(&db.id());
            if !keep {
                events.push(ClientEvent::DatabaseRemoved(db.id()));
            }
            keep
        });
    }

    /// Forgets everything, as after a logout.
    pub(crate) fn clear(&mut self) {
        self.databases.clear();
        self.revision = Revision::default();
    }
}

/// Moves a database's pending change log into `events`.
pub(crate) fn drain_events(db: &mut Database, events: &mut Vec<ClientEvent>) {
    let database = db.id();
    events.extend(
        db.take_events()
            .into_iter()
            .map(|event| ClientEvent::Library { database, event }),
    );
}

/// Applies an `/items` listing.
///
/// Listed tracks are inserted or replaced, deleted ids removed. A full
/// listing is authoritative, so local tracks missing from it are removed
/// as well.
pub(crate) fn apply_tracks(db: &mut Database, listing: TrackListing) {
    let full = listing.update_type == UpdateType::Full;
    let listed: HashSet<TrackId> = listing.tracks.iter().map(Track::id).collect();
    for track in listing.tracks {
        if !track.id().is_unassigned() {
            db.upsert_track(track);
        }
    }
    for id in listing.deleted {
        db.remove_track(id);
    }
    if full {
        let stale: Vec<TrackId> = db
            .tracks()
            .iter()
            .map(Track::id)
            .filter(|id| !listed.contains(id))
            .collect();
        for id in stale {
            db.remove_track(id);
        }
    }
}

/// Applies a `/containers` listing and returns the user playlists to
/// refresh. The base playlist follows the tracks and is skipped.
pub(crate) fn apply_playlists(db: &mut Database, summaries: &[PlaylistSummary]) -> Vec<PlaylistId> {
    let mut listed = Vec::new();
    for summary in summaries.iter().filter(|s| !s.is_base) {
        if db.playlist(summary.id).is_some() {
            db.rename_playlist(summary.id, summary.name.as_str());
            listed.push(summary.id);
        } else {
            listed.push(db.insert_playlist(summary.id, summary.name.as_str()));
        }
    }
    let stale: Vec<PlaylistId> = db
        .playlists()
        .iter()
        .map(Playlist::id)
        .filter(|id| !listed.contains(id))
        .collect();
    for id in stale {
        db.remove_playlist(id);
    }
    listed
}

/// Applies a playlist `/items` listing.
///
/// Deleted container items go first; then each position is matched against
/// the listing by container item id, replacing mismatches, and anything
/// past the end of the listing is dropped.
pub(crate) fn apply_playlist_tracks(
    db: &mut Database,
    playlist: PlaylistId,
    listing: &PlaylistTracksListing,
) {
    if listing.update_type == UpdateType::Incremental {
        for deleted in &listing.deleted {
            let position = db
                .playlist(playlist)
                .and_then(|p| p.position_of(*deleted));
            if let Some(index) = position {
                db.playlist_remove_at(playlist, index);
            }
        }
    }

    for (index, entry) in listing.entries.iter().enumerate() {
        let existing = db
            .playlist(playlist)
            .and_then(|p| p.entries().get(index).copied());
        match existing {
            Some(existing) if existing == *entry => {}
            Some(_) => {
                db.playlist_remove_at(playlist, index);
                db.playlist_insert(playlist, index, *entry);
            }
            None => {
                db.playlist_insert(playlist, index, *entry);
            }
        }
    }

    loop {
        let len = db.playlist(playlist).map_or(0, Playlist::len);
        if len <= listing.entries.len() || db.playlist_remove_at(playlist, len - 1).is_none() {
            break;
        }
    }
}
