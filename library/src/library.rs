//! The live, mutable set of databases a server publishes.

use crate::database::Database;
use crate::types::DatabaseId;

/// Databases owned by one server.
///
/// Database ids are allocated here, so they are unique for the lifetime of
/// the library.
#[derive(Debug)]
pub struct Library {
    databases: Vec<Database>,
    next_database_id: i32,
}

impl Default for Library {
    fn default() -> Self {
        Self::new()
    }
}

impl Library {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            databases: Vec::new(),
            next_database_id: 1,
        }
    }

    /// Creates an empty database and returns its id.
    pub fn add_database(&mut self, name: impl Into<String>) -> DatabaseId {
        let id = DatabaseId::new(self.next_database_id);
        self.next_database_id = self.next_database_id.saturating_add(1);
        self.databases.push(Database::new(id, name));
        id
    }

    pub fn remove_database(&mut self, id: DatabaseId) -> Option<Database> {
        let index = self.databases.iter().position(|db| db.id() == id)?;
        Some(self.databases.remove(index))
    }

    #[must_use]
    pub fn databases(&self) -> &[Database] {
        &self.databases
    }

    #[must_use]
    pub fn database(&self, id: DatabaseId) -> Option<&Database> {
        self.databases.iter().find(|db| db.id() == id)
    }

    pub fn database_mut(&mut self, id: DatabaseId) -> Option<&mut Database> {
        self.databases.iter_mut().find(|db| db.id() == id)
    }

    /// Deep copies every database, leaving change logs behind.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Database> {
        self.databases.iter().map(Database::snapshot).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::Track;

    #[test]
    fn database_ids_are_unique() {
        let mut library = Library::new();
        let a = library.add_database("a");
        library.remove_database(a).unwrap();
        let b = library.add_database("b");
        assert_ne!(a, b);
        assert_eq!(library.databases().len(), 1);
    }

    #[test]
    fn snapshot_is_detached() {
        let mut library = Library::new();
        let id = library.add_database("Music");
        let snapshot = library.snapshot();
        library
            .database_mut(id)
            .unwrap()
            .add_track(Track::new("later"));
        assert_eq!(snapshot[0].track_count(), 0);
        assert_eq!(library.database(id).unwrap().track_count(), 1);
    }
}
