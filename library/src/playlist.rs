//! Playlists: ordered track references with per-entry identity.

use crate::types::{ContainerItemId, PlaylistId, TrackId};

/// One position in a playlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaylistEntry {
    pub track: TrackId,
    pub container_item_id: ContainerItemId,
}

/// An ordered list of tracks from one database.
///
/// Entries refer to tracks by id; the owning [`Database`](crate::Database)
/// resolves them. Container item ids are drawn from a per-playlist counter
/// and never reused, so positional diffs stay unambiguous. A playlist has a
/// single writer: it is only mutated through its database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Playlist {
    id: PlaylistId,
    name: String,
    entries: Vec<PlaylistEntry>,
    next_container_item_id: i32,
    is_base: bool,
}

impl Playlist {
    pub(crate) fn new(id: PlaylistId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            entries: Vec::new(),
            next_container_item_id: 1,
            is_base: false,
        }
    }

    pub(crate) fn base(id: PlaylistId, name: impl Into<String>) -> Self {
        Self {
            is_base: true,
            ..Self::new(id, name)
        }
    }

    #[must_use]
    pub const fn id(&self) -> PlaylistId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `true` for the implicit playlist that mirrors every track.
    #[must_use]
    pub const fn is_base(&self) -> bool {
        self.is_base
    }

    #[must_use]
    pub fn entries(&self) -> &[PlaylistEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn track_ids(&self) -> impl Iterator<Item = TrackId> + '_ {
        self.entries.iter().map(|entry| entry.track)
    }

    #[must_use]
    pub fn contains_track(&self, track: TrackId) -> bool {
        self.entries.iter().any(|entry| entry.track == track)
    }

    /// Position of the entry with the given container item id.
    #[must_use]
    pub fn position_of(&self, container_item_id: ContainerItemId) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| entry.container_item_id == container_item_id)
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    /// Appends a track, allocating a fresh container item id.
    pub(crate) fn push(&mut self, track: TrackId) -> ContainerItemId {
        let container_item_id = self.allocate_container_item_id();
        self.entries.push(PlaylistEntry {
            track,
            container_item_id,
        });
        container_item_id
    }

    /// Inserts an entry with a known container item id, clamping `index`.
    pub(crate) fn insert(&mut self, index: usize, entry: PlaylistEntry) -> usize {
        let index = index.min(self.entries.len());
        self.next_container_item_id = self
            .next_container_item_id
            .max(entry.container_item_id.raw().saturating_add(1));
        self.entries.insert(index, entry);
        index
    }

    pub(crate) fn remove_at(&mut self, index: usize) -> Option<PlaylistEntry> {
        (index < self.entries.len()).then(|| self.entries.remove(index))
    }

    /// Removes every entry referring to `track`, returning the removed
    /// positions as they were at removal time.
    pub(crate) fn remove_track(&mut self, track: TrackId) -> Vec<usize> {
        let mut removed = Vec::new();
        let mut index = 0;
        while index < self.entries.len() {
            if self.entries[index].track == track {
                self.entries.remove(index);
                removed.push(index);
            } else {
                index += 1;
            }
        }
        removed
    }

    fn allocate_container_item_id(&mut self) -> ContainerItemId {
        let id = ContainerItemId::new(self.next_container_item_id);
        self.next_container_item_id = self.next_container_item_id.saturating_add(1);
        id
    }
}
