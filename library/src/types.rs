//! Identifier and revision newtypes.
//!
//! All of these travel as 32-bit signed integers on the wire.

use std::fmt;

/// A library revision number.
///
/// Revisions increase by exactly one per commit. Zero means "unknown" when a
/// client sends it and "not yet committed" on the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Revision(i32);

impl Revision {
    /// Creates a new revision.
    #[must_use]
    pub const fn new(revision: i32) -> Self {
        Self(revision)
    }

    /// Returns the raw revision value.
    #[must_use]
    pub const fn raw(self) -> i32 {
        self.0
    }

    /// Returns `true` for revision zero.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// The revision after this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// The revision `delta` steps back, used as a diff baseline.
    #[must_use]
    pub const fn back(self, delta: i32) -> Self {
        Self(self.0.saturating_sub(delta))
    }
}

impl From<i32> for Revision {
    fn from(revision: i32) -> Self {
        Self(revision)
    }
}

impl From<Revision> for i32 {
    fn from(revision: Revision) -> Self {
        revision.0
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        pub struct $name(i32);

        impl $name {
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            #[must_use]
            pub const fn raw(self) -> i32 {
                self.0
            }

            /// Zero is never assigned; it marks an id still to be allocated.
            #[must_use]
            pub const fn is_unassigned(self) -> bool {
                self.0 == 0
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

id_type!(
    /// A database id, unique among the databases one server publishes.
    DatabaseId
);
id_type!(
    /// A track id, unique within its database.
    TrackId
);
id_type!(
    /// A playlist id, unique within its database.
    PlaylistId
);
id_type!(
    /// Position identity of one entry inside a playlist.
    ///
    /// The same track may appear in a playlist several times; each
    /// appearance has its own container item id.
    ContainerItemId
);
