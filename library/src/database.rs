//! Databases: the unit a server publishes and a client mirrors.

use crate::events::LibraryEvent;
use crate::playlist::{Playlist, PlaylistEntry};
use crate::track::Track;
use crate::types::{ContainerItemId, DatabaseId, PlaylistId, TrackId};

/// Id of the implicit base playlist in every database.
pub const BASE_PLAYLIST_ID: PlaylistId = PlaylistId::new(1);

/// A named collection of tracks and playlists.
///
/// Every mutation appends a [`LibraryEvent`] to an internal log in the order
/// it happened. The base playlist always lists every track, in insertion
/// order, and is never removable.
#[derive(Debug, Clone)]
pub struct Database {
    id: DatabaseId,
    name: String,
    tracks: Vec<Track>,
    base_playlist: Playlist,
    playlists: Vec<Playlist>,
    next_track_id: i32,
    next_playlist_id: i32,
    events: Vec<LibraryEvent>,
}

impl Database {
    pub fn new(id: DatabaseId, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id,
            base_playlist: Playlist::base(BASE_PLAYLIST_ID, name.clone()),
            name,
            tracks: Vec::new(),
            playlists: Vec::new(),
            next_track_id: 1,
            next_playlist_id: BASE_PLAYLIST_ID.raw() + 1,
            events: Vec::new(),
        }
    }

    #[must_use]
    pub const fn id(&self) -> DatabaseId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        let name = name.into();
        if name != self.name {
            self.base_playlist.set_name(name.clone());
            self.name = name;
            self.events.push(LibraryEvent::NameChanged);
        }
    }

    #[must_use]
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    #[must_use]
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    #[must_use]
    pub fn track(&self, id: TrackId) -> Option<&Track> {
        self.tracks.iter().find(|track| track.id() == id)
    }

    /// Adds a track and returns its id.
    ///
    /// A track whose id is zero, or collides with one already present, gets
    /// the next free id.
    pub fn add_track(&mut self, mut track: Track) -> TrackId {
        let id = track.id();
        let id = if id.is_unassigned() || self.track(id).is_some() {
            let id = TrackId::new(self.next_track_id);
            track.set_id(id);
            id
        } else {
            id
        };
        self.next_track_id = self.next_track_id.max(id.raw().saturating_add(1));
        self.tracks.push(track);
        self.base_playlist.push(id);
        self.events.push(LibraryEvent::TrackAdded(id));
        id
    }

    /// Removes a track from the database and from every playlist.
    pub fn remove_track(&mut self, id: TrackId) -> Option<Track> {
        let index = self.tracks.iter().position(|track| track.id() == id)?;
        for playlist in &mut self.playlists {
            for position in playlist.remove_track(id) {
                self.events.push(LibraryEvent::PlaylistTrackRemoved {
                    playlist: playlist.id(),
                    index: position,
                    track: id,
                });
            }
        }
        self.base_playlist.remove_track(id);
        let track = self.tracks.remove(index);
        self.events.push(LibraryEvent::TrackRemoved(id));
        Some(track)
    }

    /// Applies `edit` to a track. Returns `true` if any field changed.
    ///
    /// The track id cannot be changed this way.
    pub fn update_track(&mut self, id: TrackId, edit: impl FnOnce(&mut Track)) -> bool {
        let Some(track) = self.tracks.iter_mut().find(|track| track.id() == id) else {
            return false;
        };
        let before = track.clone();
        edit(track);
        track.set_id(id);
        let changed = *track != before;
        if changed {
            self.events.push(LibraryEvent::TrackUpdated(id));
        }
        changed
    }

    /// Inserts a track that carries its id, or replaces the stored one when
    /// it differs. Returns `true` if the database changed.
    pub fn upsert_track(&mut self, track: Track) -> bool {
        let id = track.id();
        if id.is_unassigned() {
            self.add_track(track);
            return true;
        }
        match self.tracks.iter_mut().find(|existing| existing.id() == id) {
            Some(existing) if *existing == track => false,
            Some(existing) => {
                *existing = track;
                self.events.push(LibraryEvent::TrackUpdated(id));
                true
            }
            None => {
                self.add_track(track);
                true
            }
        }
    }

    /// The implicit playlist holding every track.
    #[must_use]
    pub const fn base_playlist(&self) -> &Playlist {
        &self.base_playlist
    }

    /// User playlists, excluding the base playlist.
    #[must_use]
    pub fn playlists(&self) -> &[Playlist] {
        &self.playlists
    }

    #[must_use]
    pub fn playlist_count(&self) -> usize {
        self.playlists.len()
    }

    /// Looks up a playlist by id, including the base playlist.
    #[must_use]
    pub fn playlist(&self, id: PlaylistId) -> Option<&Playlist> {
        if id == self.base_playlist.id() {
            return Some(&self.base_playlist);
        }
        self.playlists.iter().find(|playlist| playlist.id() == id)
    }

    /// Creates an empty playlist and returns its id.
    pub fn add_playlist(&mut self, name: impl Into<String>) -> PlaylistId {
        let id = PlaylistId::new(self.next_playlist_id);
        self.insert_playlist(id, name)
    }

    /// Creates an empty playlist with a caller-chosen id.
    ///
    /// Used when mirroring a peer's playlists. Returns the id actually used,
    /// which differs from `id` only if `id` was already taken.
    pub fn insert_playlist(&mut self, id: PlaylistId, name: impl Into<String>) -> PlaylistId {
        let id = if id.is_unassigned() || self.playlist(id).is_some() {
            PlaylistId::new(self.next_playlist_id)
        } else {
            id
        };
        self.next_playlist_id = self.next_playlist_id.max(id.raw().saturating_add(1));
        self.playlists.push(Playlist::new(id, name));
        self.events.push(LibraryEvent::PlaylistAdded(id));
        id
    }

    /// Removes a user playlist. The base playlist cannot be removed.
    pub fn remove_playlist(&mut self, id: PlaylistId) -> Option<Playlist> {
        let index = self.playlists.iter().position(|p| p.id() == id)?;
        let playlist = self.playlists.remove(index);
        self.events.push(LibraryEvent::PlaylistRemoved(id));
        Some(playlist)
    }

    pub fn rename_playlist(&mut self, id: PlaylistId, name: impl Into<String>) -> bool {
        let name = name.into();
        let Some(playlist) = self.user_playlist_mut(id) else {
            return false;
        };
        if playlist.name() == name {
            return false;
        }
        playlist.set_name(name);
        self.events.push(LibraryEvent::PlaylistRenamed(id));
        true
    }

    /// Appends a track of this database to a user playlist.
    pub fn playlist_add_track(
        &mut self,
        playlist: PlaylistId,
        track: TrackId,
    ) -> Option<ContainerItemId> {
        self.track(track)?;
        let target = self.user_playlist_mut(playlist)?;
        let container_item_id = target.push(track);
        let index = target.len() - 1;
        self.events.push(LibraryEvent::PlaylistTrackAdded {
            playlist,
            index,
            track,
        });
        Some(container_item_id)
    }

    /// Inserts an entry with a known container item id at `index`.
    ///
    /// Returns the index actually used (clamped to the playlist length).
    pub fn playlist_insert(
        &mut self,
        playlist: PlaylistId,
        index: usize,
        entry: PlaylistEntry,
    ) -> Option<usize> {
        self.track(entry.track)?;
        let target = self.user_playlist_mut(playlist)?;
        let index = target.insert(index, entry);
        self.events.push(LibraryEvent::PlaylistTrackAdded {
            playlist,
            index,
            track: entry.track,
        });
        Some(index)
    }

    /// Removes the entry at `index` of a user playlist.
    pub fn playlist_remove_at(
        &mut self,
        playlist: PlaylistId,
        index: usize,
    ) -> Option<PlaylistEntry> {
        let entry = self.user_playlist_mut(playlist)?.remove_at(index)?;
        self.events.push(LibraryEvent::PlaylistTrackRemoved {
            playlist,
            index,
            track: entry.track,
        });
        Some(entry)
    }

    /// Removes every track and playlist.
    pub fn clear(&mut self) {
        let playlist_ids: Vec<_> = self.playlists.iter().map(Playlist::id).collect();
        for id in playlist_ids {
            self.remove_playlist(id);
        }
        let track_ids: Vec<_> = self.tracks.iter().map(Track::id).collect();
        for id in track_ids {
            self.remove_track(id);
        }
    }

    /// Drains the change log.
    pub fn take_events(&mut self) -> Vec<LibraryEvent> {
        std::mem::take(&mut self.events)
    }

    /// Deep copy without the pending change log.
    #[must_use]
    pub fn snapshot(&self) -> Self {
        Self {
            id: self.id,
            name: self.name.clone(),
            tracks: self.tracks.clone(),
            base_playlist: self.base_playlist.clone(),
            playlists: self.playlists.clone(),
            next_track_id: self.next_track_id,
            next_playlist_id: self.next_playlist_id,
            events: Vec::new(),
        }
    }

    fn user_playlist_mut(&mut self, id: PlaylistId) -> Option<&mut Playlist> {
        self.playlists.iter_mut().find(|playlist| playlist.id() == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db() -> Database {
        Database::new(DatabaseId::new(1), "Music")
    }

    #[test]
    fn track_ids_are_monotonic() {
        let mut db = db();
        let a = db.add_track(Track::new("a"));
        let b = db.add_track(Track::new("b"));
        db.remove_track(b);
        let c = db.add_track(Track::new("c"));
        assert_eq!(a, TrackId::new(1));
        assert_eq!(c, TrackId::new(3));
    }

    #[test]
    fn base_playlist_mirrors_tracks() {
        let mut db = db();
        let a = db.add_track(Track::new("a"));
        let b = db.add_track(Track::new("b"));
        assert_eq!(db.base_playlist().track_ids().collect::<Vec<_>>(), vec![a, b]);
        db.remove_track(a);
        assert_eq!(db.base_playlist().track_ids().collect::<Vec<_>>(), vec![b]);
        assert!(db.playlist(BASE_PLAYLIST_ID).unwrap().is_base());
        assert!(db.remove_playlist(BASE_PLAYLIST_ID).is_none());
    }

    #[test]
    fn removing_track_removes_it_from_playlists() {
        let mut db = db();
        let a = db.add_track(Track::new("a"));
        let pl = db.add_playlist("favs");
        db.playlist_add_track(pl, a).unwrap();
        db.playlist_add_track(pl, a).unwrap();
        db.take_events();

        db.remove_track(a);
        assert!(db.playlist(pl).unwrap().is_empty());
        assert_eq!(
            db.take_events(),
            vec![
                LibraryEvent::PlaylistTrackRemoved {
                    playlist: pl,
                    index: 0,
                    track: a
                },
                LibraryEvent::PlaylistTrackRemoved {
                    playlist: pl,
                    index: 0,
                    track: a
                },
                LibraryEvent::TrackRemoved(a),
            ]
        );
    }

    #[test]
    fn update_reports_only_real_changes() {
        let mut db = db();
        let id = db.add_track(Track::new("a"));
        db.take_events();
        assert!(!db.update_track(id, |t| t.title = "a".into()));
        assert!(db.update_track(id, |t| t.title = "b".into()));
        assert!(!db.update_track(TrackId::new(99), |t| t.title = "c".into()));
        assert_eq!(db.take_events(), vec![LibraryEvent::TrackUpdated(id)]);
    }

    #[test]
    fn update_cannot_change_id() {
        let mut db = db();
        let id = db.add_track(Track::new("a"));
        db.update_track(id, |t| *t = Track::with_id(TrackId::new(50)));
        assert!(db.track(id).is_some());
    }

    #[test]
    fn upsert_suppresses_identical_tracks() {
        let mut db = db();
        let mut track = Track::with_id(TrackId::new(7));
        track.title = "seven".into();
        assert!(db.upsert_track(track.clone()));
        assert!(!db.upsert_track(track.clone()));
        track.album = "new".into();
        assert!(db.upsert_track(track));
        assert_eq!(
            db.take_events(),
            vec![
                LibraryEvent::TrackAdded(TrackId::new(7)),
                LibraryEvent::TrackUpdated(TrackId::new(7)),
            ]
        );
        // explicit ids push the allocator forward
        assert_eq!(db.add_track(Track::new("next")), TrackId::new(8));
    }

    #[test]
    fn playlist_ids_skip_base() {
        let mut db = db();
        let first = db.add_playlist("one");
        assert_eq!(first, PlaylistId::new(2));
        let mirrored = db.insert_playlist(PlaylistId::new(10), "ten");
        assert_eq!(mirrored, PlaylistId::new(10));
        assert_eq!(db.add_playlist("eleven"), PlaylistId::new(11));
        assert_eq!(db.insert_playlist(PlaylistId::new(10), "dup"), PlaylistId::new(12));
    }

    #[test]
    fn playlist_rejects_foreign_tracks() {
        let mut db = db();
        let pl = db.add_playlist("p");
        assert!(db.playlist_add_track(pl, TrackId::new(3)).is_none());
    }

    #[test]
    fn snapshot_is_independent_and_has_no_log() {
        let mut db = db();
        let id = db.add_track(Track::new("a"));
        let snapshot = db.snapshot();
        db.update_track(id, |t| t.title = "changed".into());
        assert_eq!(snapshot.track(id).unwrap().title, "a");
        assert!(snapshot.clone().take_events().is_empty());
    }

    #[test]
    fn clear_logs_everything() {
        let mut db = db();
        db.add_track(Track::new("a"));
        db.add_playlist("p");
        db.take_events();
        db.clear();
        assert_eq!(db.track_count(), 0);
        assert_eq!(db.playlist_count(), 0);
        assert_eq!(db.take_events().len(), 2);
    }
}
