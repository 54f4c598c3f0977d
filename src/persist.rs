//! Flat blob codec: the tree persists as the JSON array of its pre-order
//! `FlatEntry` records (titles, depths, completed flags — paths are
//! positional and re-derived on load).

use crate::tree::{Filter, FlatEntry, TodoTree};

/// Error type for blob encoding/decoding
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("blob is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    /// The depth sequence is not valid pre-order output: the record at
    /// `index` is unreachable (depth 0, or more than one level below its
    /// predecessor).
    #[error("record {index} has depth {depth}, unreachable in pre-order")]
    BadDepth { index: usize, depth: usize },
}

/// Encode the whole tree as a blob.
pub fn to_blob(tree: &TodoTree) -> Result<String, PersistError> {
    Ok(serde_json::to_string(&tree.flatten(Filter::All))?)
}

/// Decode a blob into a tree.
///
/// A missing or blank blob is a fresh start, never an error: it yields an
/// empty tree. A present blob must parse and carry a well-formed pre-order
/// depth sequence; anything else is rejected rather than loaded partially.
/// The returned tree is clean (not dirty).
pub fn from_blob(blob: Option<&str>) -> Result<TodoTree, PersistError> {
    let Some(text) = blob else {
        return Ok(TodoTree::new());
    };
    if text.trim().is_empty() {
        return Ok(TodoTree::new());
    }
    let entries: Vec<FlatEntry> = serde_json::from_str(text)?;
    let mut tree = TodoTree::from_entries(&entries).map_err(|index| PersistError::BadDepth {
        index,
        depth: entries[index].depth,
    })?;
    tree.set_clean();
    Ok(tree)
}
