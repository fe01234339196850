//! Committed snapshots and the revision wait condition.

use std::num::NonZeroUsize;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tracing::debug;

use crate::database::Database;
use crate::history::{HistoryError, RevisionHistory};
use crate::library::Library;
use crate::types::{DatabaseId, Revision};

/// Revisions kept when no other window is configured.
pub const DEFAULT_HISTORY_LIMIT: NonZeroUsize = match NonZeroUsize::new(3) {
    Some(limit) => limit,
    None => unreachable!(),
};

/// An immutable copy of every database at one revision.
#[derive(Debug)]
pub struct Snapshot {
    revision: Revision,
    databases: Vec<Database>,
}

impl Snapshot {
    #[must_use]
    pub const fn revision(&self) -> Revision {
        self.revision
    }

    #[must_use]
    pub fn databases(&self) -> &[Database] {
        &self.databases
    }

    #[must_use]
    pub fn database(&self, id: DatabaseId) -> Option<&Database> {
        self.databases.iter().find(|db| db.id() == id)
    }
}

/// A wait for a new revision was cut short by shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("server has been stopped")]
pub struct Stopped;

/// Publishes snapshots of a [`Library`] and wakes long-pollers.
///
/// One lock guards the current revision, the snapshot window, and the stop
/// flag; the condition variable is paired with it. Published snapshots are
/// shared through `Arc` and read without holding the lock.
#[derive(Debug)]
pub struct RevisionManager {
    state: Mutex<State>,
    changed: Condvar,
}

#[derive(Debug)]
struct State {
    current: Revision,
    history: RevisionHistory<Arc<Snapshot>>,
    stopped: bool,
}

impl Default for RevisionManager {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl RevisionManager {
    /// Creates a manager retaining at most `limit` snapshots.
    ///
    /// Nothing is published until the first [`commit`](Self::commit), which
    /// produces revision 1.
    #[must_use]
    pub fn new(limit: NonZeroUsize) -> Self {
        Self {
            state: Mutex::new(State {
                current: Revision::default(),
                history: RevisionHistory::new(limit),
                stopped: false,
            }),
            changed: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The latest committed revision, zero before the first commit.
    #[must_use]
    pub fn current(&self) -> Revision {
        self.lock().current
    }

    /// Maximum number of retained snapshots.
    #[must_use]
    pub fn limit(&self) -> usize {
        self.lock().history.capacity()
    }

    /// Copies `library` into a new snapshot and publishes it.
    ///
    /// The copy, the revision bump, eviction, and the wake-up of every
    /// waiter happen under the one lock.
    pub fn commit(&self, library: &Library) -> Result<Revision, HistoryError> {
        let mut state = self.lock();
        let revision = state.current.next();
        let snapshot = Arc::new(Snapshot {
            revision,
            databases: library.snapshot(),
        });
        let evicted = state.history.insert(revision, snapshot)?;
        state.current = revision;
        drop(state);
        self.changed.notify_all();
        debug!(%revision, evicted = ?evicted.map(Revision::raw), "committed revision");
        Ok(revision)
    }

    /// The snapshot for an exact revision; zero means the current one.
    #[must_use]
    pub fn snapshot(&self, revision: Revision) -> Option<Arc<Snapshot>> {
        let state = self.lock();
        let revision = if revision.is_zero() {
            state.current
        } else {
            revision
        };
        state.history.get(revision).cloned()
    }

    /// The snapshot for `revision` if retained, else the current one.
    #[must_use]
    pub fn snapshot_or_current(&self, revision: Revision) -> Option<Arc<Snapshot>> {
        let state = self.lock();
        state
            .history
            .get(revision)
            .or_else(|| state.history.latest().map(|(_, snapshot)| snapshot))
            .cloned()
    }

    /// The snapshot `delta` revisions before `revision`, if still retained.
    ///
    /// A non-positive `delta` has no baseline.
    #[must_use]
    pub fn baseline(&self, revision: Revision, delta: i32) -> Option<Arc<Snapshot>> {
        if delta <= 0 {
            return None;
        }
        let state = self.lock();
        let revision = if revision.is_zero() {
            state.current
        } else {
            revision
        };
        state.history.get(revision.back(delta)).cloned()
    }

    /// Blocks while `known` is the current revision.
    ///
    /// Returns the new current revision once a commit happens, immediately
    /// if `known` is already stale, and [`Stopped`] if the manager is or
    /// becomes stopped.
    pub fn wait_for_change(&self, known: Revision) -> Result<Revision, Stopped> {
        let mut state = self.lock();
        while state.current == known && !state.stopped {
            debug!(%known, "waiting for next revision");
            state = self
                .changed
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        if state.stopped {
            return Err(Stopped);
        }
        Ok(state.current)
    }

    /// Marks the manager stopped and wakes every waiter.
    pub fn stop(&self) {
        self.lock().stopped = true;
        self.changed.notify_all();
    }

    /// Clears the stop flag so waits block again.
    pub fn resume(&self) {
        self.lock().stopped = false;
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.lock().stopped
    }
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::Duration;

    use super::*;
    use crate::track::Track;

    fn manager(limit: usize) -> RevisionManager {
        RevisionManager::new(NonZeroUsize::new(limit).unwrap())
    }

    #[test]
    fn first_commit_is_revision_one() {
        let revisions = manager(3);
        assert!(revisions.current().is_zero());
        assert!(revisions.snapshot(Revision::default()).is_none());
        let rev = revisions.commit(&Library::new()).unwrap();
        assert_eq!(rev, Revision::new(1));
        assert_eq!(revisions.snapshot(Revision::default()).unwrap().revision(), rev);
    }

    #[test]
    fn window_evicts_oldest() {
        let revisions = manager(2);
        let library = Library::new();
        for _ in 0..3 {
            revisions.commit(&library).unwrap();
        }
        assert!(revisions.snapshot(Revision::new(1)).is_none());
        assert!(revisions.snapshot(Revision::new(2)).is_some());
        assert_eq!(
            revisions
                .snapshot_or_current(Revision::new(1))
                .unwrap()
                .revision(),
            Revision::new(3)
        );
    }

    #[test]
    fn stale_revision_returns_immediately() {
        let revisions = manager(3);
        revisions.commit(&Library::new()).unwrap();
        revisions.commit(&Library::new()).unwrap();
        assert_eq!(
            revisions.wait_for_change(Revision::new(1)),
            Ok(Revision::new(2))
        );
    }

    #[test]
    fn waiter_wakes_on_commit() {
        let revisions = Arc::new(manager(3));
        let mut library = Library::new();
        let db = library.add_database("Music");
        revisions.commit(&library).unwrap();

        let waiter = {
            let revisions = Arc::clone(&revisions);
            thread::spawn(move || revisions.wait_for_change(Revision::new(1)))
        };
        thread::sleep(Duration::from_millis(50));
        assert!(!waiter.is_finished());

        library.database_mut(db).unwrap().add_track(Track::new("t"));
        revisions.commit(&library).unwrap();
        assert_eq!(waiter.join().unwrap(), Ok(Revision::new(2)));
    }

    #[test]
    fn stop_wakes_waiters() {
        let revisions = Arc::new(manager(3));
        revisions.commit(&Library::new()).unwrap();
        let waiters: Vec<_> = (0..4)
            .map(|_| {
                let revisions = Arc::clone(&revisions);
                thread::spawn(move || revisions.wait_for_change(Revision::new(1)))
            })
            .collect();
        thread::sleep(Duration::from_millis(50));
        revisions.stop();
        for waiter in waiters {
            assert_eq!(waiter.join().unwrap(), Err(Stopped));
        }
        revisions.resume();
        assert!(!revisions.is_stopped());
    }
}
