//! A hierarchical todo-tree engine.
//!
//! [`TodoTree`] holds arbitrarily nested todo items in an arena-backed
//! ordered forest and keeps three things consistent across every structural
//! edit: positional paths (`root-0-2` style handles), derived completion
//! state (a parent is complete exactly when all its children are), and the
//! pre-order flat projection used for display and persistence.
//!
//! Rendering, input handling, and storage I/O live outside this crate: a
//! presentation layer drives the mutation API and paints [`TodoTree::flatten`],
//! and a [`Store`] holds the serialized blob between sessions.

pub mod persist;
pub mod store;
pub mod tree;

pub use persist::{PersistError, from_blob, to_blob};
pub use store::{JsonFileStore, MemoryStore, Store, load_tree, save_tree};
pub use tree::{Counts, Filter, FlatEntry, ROOT_PATH, TodoTree, TreeError};
