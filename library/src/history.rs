//! The sliding window of published revisions.

use std::collections::VecDeque;
use std::num::NonZeroUsize;

use thiserror::Error;

use crate::types::Revision;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HistoryError {
    #[error("revision {new} does not follow {last}")]
    OutOfOrder { last: Revision, new: Revision },
}

/// Values for the most recent revisions, oldest first.
///
/// Holds at most `limit` entries; publishing one more drops the oldest,
/// after which requests for it fall outside the window.
#[derive(Debug)]
pub struct RevisionHistory<T> {
    window: VecDeque<(Revision, T)>,
    limit: usize,
}

impl<T> RevisionHistory<T> {
    #[must_use]
    pub fn new(limit: NonZeroUsize) -> Self {
        Self {
            window: VecDeque::with_capacity(limit.get()),
            limit: limit.get(),
        }
    }

    /// Most entries the window keeps.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.limit
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.window.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    /// Appends `revision`, which must be newer than every retained one.
    ///
    /// Returns the revision that fell out of the window, if any.
    pub fn insert(
        &mut self,
        revision: Revision,
        value: T,
    ) -> Result<Option<Revision>, HistoryError> {
        if let Some((last, _)) = self.window.back() {
            if revision <= *last {
                return Err(HistoryError::OutOfOrder {
                    last: *last,
                    new: revision,
                });
            }
        }
        let evicted = if self.window.len() == self.limit {
            self.window.pop_front().map(|(revision, _)| revision)
        } else {
            None
        };
        self.window.push_back((revision, value));
        Ok(evicted)
    }

    /// The value published at exactly `revision`, while it is retained.
    #[must_use]
    pub fn get(&self, revision: Revision) -> Option<&T> {
        self.window
            .binary_search_by_key(&revision, |(r, _)| *r)
            .ok()
            .map(|index| &self.window[index].1)
    }

    #[must_use]
    pub fn latest(&self) -> Option<(Revision, &T)> {
        self.window.back().map(|(revision, value)| (*revision, value))
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (Revision, &T)> {
        self.window.iter().map(|(revision, value)| (*revision, value))
    }
}
