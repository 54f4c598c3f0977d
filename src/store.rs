//! The Persistence Store collaborator: an opaque key/value blob slot. The
//! engine never touches it directly; the embedding layer loads a blob at
//! startup and saves one whenever the tree reports itself dirty.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;

use crate::persist::{self, PersistError};
use crate::tree::TodoTree;

/// A key/value slot for serialized trees.
pub trait Store {
    /// Fetch the blob stored under `key`, or `None` if the slot is empty
    /// (or unreadable — a fresh start either way).
    fn load(&self, key: &str) -> Option<String>;
    /// Overwrite the slot under `key`.
    fn save(&mut self, key: &str, blob: &str) -> io::Result<()>;
}

/// Load the tree stored under `key`; an empty slot yields an empty tree.
pub fn load_tree(store: &impl Store, key: &str) -> Result<TodoTree, PersistError> {
    persist::from_blob(store.load(key).as_deref())
}

/// Serialize `tree` into the slot under `key`.
pub fn save_tree(store: &mut impl Store, key: &str, tree: &TodoTree) -> Result<(), PersistError> {
    let blob = persist::to_blob(tree)?;
    store.save(key, &blob)?;
    Ok(())
}

/// In-memory store for tests and embedding without a filesystem.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slots: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn load(&self, key: &str) -> Option<String> {
        self.slots.get(key).cloned()
    }

    fn save(&mut self, key: &str, blob: &str) -> io::Result<()> {
        self.slots.insert(key.to_string(), blob.to_string());
        Ok(())
    }
}

/// File-backed store: one `<key>.json` file per slot inside a directory.
#[derive(Debug)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        JsonFileStore { dir: dir.into() }
    }

    fn slot_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl Store for JsonFileStore {
    fn load(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.slot_path(key)).ok()
    }

    fn save(&mut self, key: &str, blob: &str) -> io::Result<()> {
        fs::write(self.slot_path(key), blob)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{Filter, ROOT_PATH};
    use tempfile::TempDir;

    #[test]
    fn memory_store_round_trips() {
        let mut store = MemoryStore::new();
        assert!(store.load("todos").is_none());

        let mut tree = TodoTree::new();
        tree.create_child(ROOT_PATH, "A", None).unwrap();
        save_tree(&mut store, "todos", &tree).unwrap();

        let loaded = load_tree(&store, "todos").unwrap();
        assert_eq!(loaded.flatten(Filter::All), tree.flatten(Filter::All));
    }

    #[test]
    fn file_store_round_trips() {
        let dir = TempDir::new().unwrap();
        let mut store = JsonFileStore::new(dir.path());

        let mut tree = TodoTree::new();
        let a = tree.create_child(ROOT_PATH, "A", None).unwrap();
        tree.create_child(&a, "A1", None).unwrap();
        tree.set_completed(&a, true).unwrap();
        save_tree(&mut store, "todos", &tree).unwrap();

        let loaded = load_tree(&store, "todos").unwrap();
        assert_eq!(loaded.flatten(Filter::All), tree.flatten(Filter::All));
    }

    #[test]
    fn missing_slot_loads_an_empty_tree() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path());
        assert!(store.load("todos").is_none());
        assert!(load_tree(&store, "todos").unwrap().is_empty());
    }

    #[test]
    fn corrupt_slot_is_an_error_not_a_partial_tree() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("todos.json"), "not json {{{").unwrap();
        let store = JsonFileStore::new(dir.path());
        assert!(load_tree(&store, "todos").is_err());
    }

    #[test]
    fn slots_are_independent() {
        let mut store = MemoryStore::new();
        let mut one = TodoTree::new();
        one.create_child(ROOT_PATH, "one", None).unwrap();
        let two = TodoTree::new();
        save_tree(&mut store, "one", &one).unwrap();
        save_tree(&mut store, "two", &two).unwrap();

        assert_eq!(load_tree(&store, "one").unwrap().counts().total, 1);
        assert!(load_tree(&store, "two").unwrap().is_empty());
    }
}
