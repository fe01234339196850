use std::num::NonZeroUsize;

use library::{
    removed_tracks, tracks_node, DatabaseId, Library, Revision, RevisionManager, Track,
    TrackId, TrackListing, UpdateType, DEFAULT_META,
};
use proptest::prelude::*;
use wire::{decode, encode, ContentCodeBag, Limits};

fn manager(limit: usize) -> RevisionManager {
    RevisionManager::new(NonZeroUsize::new(limit).unwrap())
}

/// What a server answers for `/databases/{db}/items?revision-number=..&delta=..`.
fn items(revisions: &RevisionManager, db: DatabaseId, revision: i32, delta: i32) -> TrackListing {
    let revision = Revision::new(revision);
    let snapshot = revisions.snapshot_or_current(revision).unwrap();
    let current = snapshot.database(db).unwrap();
    let deleted = revisions
        .baseline(revision, delta)
        .and_then(|baseline| baseline.database(db).map(|base| removed_tracks(base, current)));
    let node = tracks_node(current, DEFAULT_META, deleted.as_deref());

    let bag = ContentCodeBag::builtin();
    let bytes = encode(&bag, &node).unwrap();
    let decoded = decode(&bag, &bytes, &Limits::default()).unwrap();
    TrackListing::from_node(&decoded).unwrap()
}

#[test]
fn older_snapshots_do_not_see_later_commits() {
    let revisions = manager(5);
    let mut library = Library::new();
    let db = library.add_database("Music");
    let first = library.database_mut(db).unwrap().add_track(Track::new("one"));
    let r1 = revisions.commit(&library).unwrap();

    {
        let music = library.database_mut(db).unwrap();
        music.update_track(first, |track| track.title = "renamed".into());
        music.add_track(Track::new("two"));
    }
    let r2 = revisions.commit(&library).unwrap();
    assert!(r1 < r2);

    let old = revisions.snapshot(r1).unwrap();
    let old_db = old.database(db).unwrap();
    assert_eq!(old_db.track_count(), 1);
    assert_eq!(old_db.track(first).unwrap().title, "one");

    let new = revisions.snapshot(r2).unwrap();
    assert_eq!(new.database(db).unwrap().track_count(), 2);
    assert_eq!(new.database(db).unwrap().track(first).unwrap().title, "renamed");
}

#[test]
fn add_then_remove_scenario() {
    let revisions = manager(3);
    let mut library = Library::new();
    let db = library.add_database("Music");
    assert_eq!(revisions.commit(&library).unwrap(), Revision::new(1));

    let t1 = library.database_mut(db).unwrap().add_track(Track::new("T1"));
    assert_eq!(revisions.commit(&library).unwrap(), Revision::new(2));

    let listing = items(&revisions, db, 2, 1);
    assert_eq!(listing.update_type, UpdateType::Incremental);
    assert_eq!(listing.tracks.len(), 1);
    assert_eq!(listing.tracks[0].id(), t1);
    assert!(listing.deleted.is_empty());

    library.database_mut(db).unwrap().remove_track(t1).unwrap();
    assert_eq!(revisions.commit(&library).unwrap(), Revision::new(3));

    let listing = items(&revisions, db, 3, 1);
    assert_eq!(listing.update_type, UpdateType::Incremental);
    assert!(listing.tracks.is_empty());
    assert_eq!(listing.deleted, vec![t1]);
}

#[test]
fn evicted_baseline_degrades_to_full_listing() {
    let revisions = manager(2);
    let mut library = Library::new();
    let db = library.add_database("Music");
    let doomed = library.database_mut(db).unwrap().add_track(Track::new("gone"));
    revisions.commit(&library).unwrap();

    library.database_mut(db).unwrap().remove_track(doomed);
    let kept = library.database_mut(db).unwrap().add_track(Track::new("kept"));
    revisions.commit(&library).unwrap();
    revisions.commit(&library).unwrap();

    assert!(revisions.snapshot(Revision::new(1)).is_none());
    let listing = items(&revisions, db, 3, 2);
    assert_eq!(listing.update_type, UpdateType::Full);
    assert!(listing.deleted.is_empty());
    let ids: Vec<TrackId> = listing.tracks.iter().map(Track::id).collect();
    assert_eq!(ids, vec![kept]);
}

#[test]
fn zero_delta_is_a_full_listing() {
    let revisions = manager(3);
    let mut library = Library::new();
    let db = library.add_database("Music");
    library.database_mut(db).unwrap().add_track(Track::new("a"));
    revisions.commit(&library).unwrap();

    let listing = items(&revisions, db, 0, 0);
    assert_eq!(listing.update_type, UpdateType::Full);
    assert_eq!(listing.tracks.len(), 1);
}

#[test]
fn evicted_request_revision_serves_current() {
    let revisions = manager(1);
    let mut library = Library::new();
    let db = library.add_database("Music");
    revisions.commit(&library).unwrap();
    library.database_mut(db).unwrap().add_track(Track::new("a"));
    revisions.commit(&library).unwrap();

    let listing = items(&revisions, db, 1, 0);
    assert_eq!(listing.tracks.len(), 1);
}

proptest! {
    #[test]
    fn window_keeps_only_the_newest_snapshots(limit in 1usize..6, commits in 1i32..20) {
        let revisions = manager(limit);
        let library = Library::new();
        for _ in 0..commits {
            revisions.commit(&library).unwrap();
        }
        prop_assert_eq!(revisions.current(), Revision::new(commits));

        let oldest = (commits - i32::try_from(limit).unwrap() + 1).max(1);
        for revision in 1..=commits {
            prop_assert_eq!(
                revisions.snapshot(Revision::new(revision)).is_some(),
                revision >= oldest
            );
        }
    }

    #[test]
    fn deletions_are_the_tracks_gone_since_the_baseline(
        keep in proptest::collection::vec(any::<bool>(), 0..12)
    ) {
        let revisions = manager(2);
        let mut library = Library::new();
        let db = library.add_database("Music");
        let ids: Vec<TrackId> = keep
            .iter()
            .map(|_| library.database_mut(db).unwrap().add_track(Track::new("t")))
            .collect();
        revisions.commit(&library).unwrap();

        let music = library.database_mut(db).unwrap();
        for (id, kept) in ids.iter().zip(&keep) {
            if !kept {
                music.remove_track(*id);
            }
        }
        revisions.commit(&library).unwrap();

        let listing = items(&revisions, db, 2, 1);
        let expected: Vec<TrackId> = ids
            .iter()
            .zip(&keep)
            .filter(|(_, kept)| !**kept)
            .map(|(id, _)| *id)
            .collect();
        let mut deleted = listing.deleted.clone();
        deleted.sort();
        prop_assert_eq!(listing.update_type, UpdateType::Incremental);
        prop_assert_eq!(deleted, expected);
        prop_assert_eq!(listing.tracks.len(), keep.iter().filter(|kept| **kept).count());
    }
}
