//! Deletion sets between two revisions.
//!
//! Additions and modifications are never diffed: listings always carry the
//! full current set, so only removals need computing.

use std::collections::HashSet;

use crate::database::Database;
use crate::playlist::Playlist;
use crate::types::{ContainerItemId, TrackId};

/// Track ids present in `baseline` but absent from `current`, in baseline order.
#[must_use]
pub fn removed_tracks(baseline: &Database, current: &Database) -> Vec<TrackId> {
    let live: HashSet<TrackId> = current.tracks().iter().map(|track| track.id()).collect();
    baseline
        .tracks()
        .iter()
        .map(|track| track.id())
        .filter(|id| !live.contains(id))
        .collect()
}

/// Container item ids present in `baseline` but absent from `current`.
#[must_use]
pub fn removed_entries(baseline: &Playlist, current: &Playlist) -> Vec<ContainerItemId> {
    let live: HashSet<ContainerItemId> = current
        .entries()
        .iter()
        .map(|entry| entry.container_item_id)
        .collect();
    baseline
        .entries()
        .iter()
        .map(|entry| entry.container_item_id)
        .filter(|id| !live.contains(id))
        .collect()
}
