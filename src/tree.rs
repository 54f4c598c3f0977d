use generational_arena::{Arena, Index};
use serde::{Deserialize, Serialize};

/// Path of the root node. Every other path is built from it by appending
/// `-<local index>` per level (e.g. `root-0-2` is the third child of the
/// first top-level item).
pub const ROOT_PATH: &str = "root";

/// Error type for tree operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    #[error("no node at path: {0}")]
    NotFound(String),
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
}

/// Display filter applied to the flat projection. Filtering is a pure
/// projection: children of a filtered-out entry still appear if they match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
    #[default]
    All,
    Active,
    Completed,
}

impl Filter {
    /// Parse a filter name as the presentation layer spells it
    /// (`"active"`, `"completed"`); anything else means show everything.
    pub fn from_name(name: &str) -> Filter {
        match name {
            "active" => Filter::Active,
            "completed" => Filter::Completed,
            _ => Filter::All,
        }
    }

    pub fn matches(self, completed: bool) -> bool {
        match self {
            Filter::All => true,
            Filter::Active => !completed,
            Filter::Completed => completed,
        }
    }
}

/// One row of the flattened tree, in pre-order.
///
/// This doubles as the persisted record: `path` is derivable from position,
/// so it is skipped during serialization and re-derived on load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatEntry {
    pub title: String,
    #[serde(skip)]
    pub path: String,
    pub depth: usize,
    pub completed: bool,
}

/// Item counts over the whole tree (what a footer would display)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Counts {
    pub total: usize,
    pub active: usize,
    pub completed: usize,
}

/// A single todo item in the arena. `parent` and `children` are arena
/// indices, never owning references, so the parent back-link cannot form an
/// ownership cycle. `local_index`, `depth`, and `path` are caches of the
/// node's current position, renumbered after every structural change.
#[derive(Debug)]
struct Node {
    title: String,
    completed: bool,
    parent: Option<Index>,
    children: Vec<Index>,
    local_index: usize,
    depth: usize,
    path: String,
}

/// An ordered forest of todo items rooted at a single sentinel node.
///
/// All public operations address nodes by path string. Paths are positional,
/// so any structural mutation can renumber them; callers must re-resolve
/// after every mutating call rather than caching handles.
///
/// Mutating operations either complete fully (all index/path/depth and
/// completeness re-derivation included) or reject without touching the tree.
#[derive(Debug)]
pub struct TodoTree {
    arena: Arena<Node>,
    root: Index,
    dirty: bool,
}

impl Default for TodoTree {
    fn default() -> Self {
        Self::new()
    }
}

impl TodoTree {
    /// Create an empty tree: just the root sentinel, which is never
    /// displayed and never removable.
    pub fn new() -> Self {
        let mut arena = Arena::new();
        let root = arena.insert(Node {
            title: ROOT_PATH.to_string(),
            completed: false,
            parent: None,
            children: Vec::new(),
            local_index: 0,
            depth: 0,
            path: ROOT_PATH.to_string(),
        });
        TodoTree {
            arena,
            root,
            dirty: false,
        }
    }

    // -----------------------------------------------------------------------
    // Mutation
    // -----------------------------------------------------------------------

    /// Create a new item under `parent_path` and return its path.
    ///
    /// `at` is clamped into `[0, child_count]`; `None` appends. Later
    /// siblings (and their subtrees) are renumbered, and the parent chain's
    /// completeness is re-derived: adding an item to a completed parent
    /// makes the parent incomplete again.
    pub fn create_child(
        &mut self,
        parent_path: &str,
        title: &str,
        at: Option<usize>,
    ) -> Result<String, TreeError> {
        let parent = self.resolve(parent_path)?;
        let len = self.node(parent).children.len();
        let pos = at.unwrap_or(len).min(len);
        let child = self.arena.insert(Node {
            title: title.to_string(),
            completed: false,
            parent: Some(parent),
            children: Vec::new(),
            // Position caches are filled in by the renumber pass below
            local_index: pos,
            depth: 0,
            path: String::new(),
        });
        self.node_mut(parent).children.insert(pos, child);
        self.renumber_children(parent);
        self.update_completeness(parent);
        self.dirty = true;
        Ok(self.node(child).path.clone())
    }

    /// Remove the item at `path` together with its whole subtree.
    pub fn remove(&mut self, path: &str) -> Result<(), TreeError> {
        let idx = self.resolve(path)?;
        let Some(parent) = self.node(idx).parent else {
            return Err(TreeError::InvalidOperation(
                "cannot remove the root".to_string(),
            ));
        };
        let slot = self.node(idx).local_index;
        self.node_mut(parent).children.remove(slot);
        self.free_subtree(idx);
        self.renumber_children(parent);
        self.update_completeness(parent);
        self.dirty = true;
        Ok(())
    }

    /// Force `completed` on the item and every descendant, then re-derive
    /// the ancestor chain.
    pub fn set_completed(&mut self, path: &str, value: bool) -> Result<(), TreeError> {
        let idx = self.resolve(path)?;
        self.force_completed(idx, value);
        if let Some(parent) = self.node(idx).parent {
            self.update_completeness(parent);
        }
        self.dirty = true;
        Ok(())
    }

    /// Replace the item's title. No structural or completeness effect.
    pub fn set_title(&mut self, path: &str, text: &str) -> Result<(), TreeError> {
        let idx = self.resolve(path)?;
        self.node_mut(idx).title = text.to_string();
        self.dirty = true;
        Ok(())
    }

    /// Detach the item at `path` and re-attach it under `new_parent_path` at
    /// position `at` (clamped, `None` appends). Returns the item's new path.
    ///
    /// Moving the root, or moving a node into itself or its own subtree, is
    /// rejected without mutating the tree.
    pub fn move_node(
        &mut self,
        path: &str,
        new_parent_path: &str,
        at: Option<usize>,
    ) -> Result<String, TreeError> {
        let idx = self.resolve(path)?;
        let new_parent = self.resolve(new_parent_path)?;
        let Some(old_parent) = self.node(idx).parent else {
            return Err(TreeError::InvalidOperation(
                "cannot move the root".to_string(),
            ));
        };
        if new_parent == idx || self.is_ancestor(idx, new_parent) {
            return Err(TreeError::InvalidOperation(format!(
                "cannot move {path} into its own subtree"
            )));
        }

        let slot = self.node(idx).local_index;
        self.node_mut(old_parent).children.remove(slot);
        // Clamp against the post-detach sibling count
        let len = self.node(new_parent).children.len();
        let pos = at.unwrap_or(len).min(len);
        self.node_mut(new_parent).children.insert(pos, idx);
        self.node_mut(idx).parent = Some(new_parent);

        self.renumber_children(old_parent);
        if new_parent != old_parent {
            self.renumber_children(new_parent);
        }
        self.update_completeness(old_parent);
        self.update_completeness(new_parent);
        self.dirty = true;
        Ok(self.node(idx).path.clone())
    }

    /// Indent: the immediately-older sibling adopts the item as its last
    /// child. Rejected for a first (or only) child.
    pub fn indent(&mut self, path: &str) -> Result<String, TreeError> {
        let idx = self.resolve(path)?;
        let Some(parent) = self.node(idx).parent else {
            return Err(TreeError::InvalidOperation(
                "cannot indent the root".to_string(),
            ));
        };
        let slot = self.node(idx).local_index;
        if slot == 0 {
            return Err(TreeError::InvalidOperation(format!(
                "cannot indent {path}: no older sibling"
            )));
        }
        let sibling = self.node(parent).children[slot - 1];
        let sibling_path = self.node(sibling).path.clone();
        self.move_node(path, &sibling_path, None)
    }

    /// Unindent: the grandparent adopts the item, placed immediately after
    /// its former parent. Rejected for top-level items.
    pub fn unindent(&mut self, path: &str) -> Result<String, TreeError> {
        let idx = self.resolve(path)?;
        let parent = self
            .node(idx)
            .parent
            .and_then(|p| self.node(p).parent.map(|gp| (p, gp)));
        let Some((parent, grandparent)) = parent else {
            return Err(TreeError::InvalidOperation(format!(
                "cannot unindent a top-level item: {path}"
            )));
        };
        let slot = self.node(parent).local_index + 1;
        let grandparent_path = self.node(grandparent).path.clone();
        self.move_node(path, &grandparent_path, Some(slot))
    }

    /// Remove every completed descendant of `from_path`, keeping the rest.
    /// A completed node always goes with its entire subtree (under the
    /// derivation invariant that subtree is also completed), so the sweep
    /// only recurses into kept children. One renumber pass afterwards, then
    /// completeness re-derivation upward from `from_path`.
    pub fn purge_completed(&mut self, from_path: &str) -> Result<(), TreeError> {
        let idx = self.resolve(from_path)?;
        self.sweep_completed(idx);
        self.renumber_children(idx);
        self.update_completeness(idx);
        self.dirty = true;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Pre-order projection of the whole tree (the root itself is not an
    /// item and never appears).
    pub fn flatten(&self, filter: Filter) -> Vec<FlatEntry> {
        self.flatten_index(self.root, filter)
    }

    /// Pre-order projection of the subtree below `path` (exclusive).
    pub fn flatten_from(&self, path: &str, filter: Filter) -> Result<Vec<FlatEntry>, TreeError> {
        let idx = self.resolve(path)?;
        Ok(self.flatten_index(idx, filter))
    }

    /// Whether `path` resolves to an existing node.
    pub fn contains(&self, path: &str) -> bool {
        self.resolve(path).is_ok()
    }

    pub fn title(&self, path: &str) -> Result<&str, TreeError> {
        Ok(self.node(self.resolve(path)?).title.as_str())
    }

    pub fn completed(&self, path: &str) -> Result<bool, TreeError> {
        Ok(self.node(self.resolve(path)?).completed)
    }

    pub fn child_count(&self, path: &str) -> Result<usize, TreeError> {
        Ok(self.node(self.resolve(path)?).children.len())
    }

    /// True when the tree holds no items at all.
    pub fn is_empty(&self) -> bool {
        self.node(self.root).children.is_empty()
    }

    /// Whether the node at `path` lies strictly below `ancestor_path`.
    pub fn is_descendant_of(&self, path: &str, ancestor_path: &str) -> Result<bool, TreeError> {
        let node = self.resolve(path)?;
        let ancestor = self.resolve(ancestor_path)?;
        Ok(self.is_ancestor(ancestor, node))
    }

    /// Item counts over the unfiltered tree.
    pub fn counts(&self) -> Counts {
        let mut counts = Counts::default();
        for entry in self.flatten(Filter::All) {
            counts.total += 1;
            if entry.completed {
                counts.completed += 1;
            } else {
                counts.active += 1;
            }
        }
        counts
    }

    // -----------------------------------------------------------------------
    // Navigation
    // -----------------------------------------------------------------------

    /// Path of the item directly above `path` in flat order: the deepest
    /// last-descendant of the immediately-older sibling, or the parent when
    /// there is no older sibling. The root path is a valid result and means
    /// "top reached"; `above` of the root itself is `None`.
    pub fn above(&self, path: &str) -> Result<Option<String>, TreeError> {
        let idx = self.resolve(path)?;
        let Some(parent) = self.node(idx).parent else {
            return Ok(None);
        };
        let slot = self.node(idx).local_index;
        if slot == 0 {
            return Ok(Some(self.node(parent).path.clone()));
        }
        let mut cur = self.node(parent).children[slot - 1];
        while let Some(&last) = self.node(cur).children.last() {
            cur = last;
        }
        Ok(Some(self.node(cur).path.clone()))
    }

    /// Path of the item directly below `path` in flat order: the first
    /// child, else the nearest next-younger sibling up the ancestor chain,
    /// else `None` at the overall last item.
    pub fn below(&self, path: &str) -> Result<Option<String>, TreeError> {
        let idx = self.resolve(path)?;
        if let Some(&first) = self.node(idx).children.first() {
            return Ok(Some(self.node(first).path.clone()));
        }
        let mut cur = idx;
        while let Some(parent) = self.node(cur).parent {
            let slot = self.node(cur).local_index;
            let siblings = &self.node(parent).children;
            if slot + 1 < siblings.len() {
                return Ok(Some(self.node(siblings[slot + 1]).path.clone()));
            }
            cur = parent;
        }
        Ok(None)
    }

    // -----------------------------------------------------------------------
    // Dirty signaling
    // -----------------------------------------------------------------------

    /// Whether the tree has mutated since the last `take_dirty`. The engine
    /// does no I/O itself; the embedding layer polls this to decide when to
    /// save.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Read and clear the dirty flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn set_clean(&mut self) {
        self.dirty = false;
    }

    // -----------------------------------------------------------------------
    // Reconstruction (used by the persist module)
    // -----------------------------------------------------------------------

    /// Rebuild a tree from a pre-order entry sequence, trusting the stored
    /// `completed` flags (they were derivation-consistent when flattened).
    /// `Err(i)` names the first entry whose depth is unreachable in
    /// pre-order: depth 0, or deeper than the previous entry's depth + 1.
    pub(crate) fn from_entries(entries: &[FlatEntry]) -> Result<TodoTree, usize> {
        let mut tree = TodoTree::new();
        // chain[d] = the node currently being built at depth d
        let mut chain: Vec<Index> = vec![tree.root];
        for (i, entry) in entries.iter().enumerate() {
            if entry.depth == 0 || entry.depth > chain.len() {
                return Err(i);
            }
            chain.truncate(entry.depth);
            let parent = chain[entry.depth - 1];
            let child = tree.append_raw(parent, &entry.title, entry.completed);
            chain.push(child);
        }
        Ok(tree)
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn node(&self, idx: Index) -> &Node {
        &self.arena[idx]
    }

    fn node_mut(&mut self, idx: Index) -> &mut Node {
        &mut self.arena[idx]
    }

    /// Walk a path from the root, splitting on `-` and indexing into
    /// `children` at each level.
    fn resolve(&self, path: &str) -> Result<Index, TreeError> {
        let not_found = || TreeError::NotFound(path.to_string());
        let mut parts = path.split('-');
        if parts.next() != Some(ROOT_PATH) {
            return Err(not_found());
        }
        let mut idx = self.root;
        for part in parts {
            let slot: usize = part.parse().map_err(|_| not_found())?;
            idx = *self.node(idx).children.get(slot).ok_or_else(not_found)?;
        }
        Ok(idx)
    }

    /// Recompute `local_index`, `path`, and `depth` for every node below
    /// `parent`.
    fn renumber_children(&mut self, parent: Index) {
        let children = self.node(parent).children.clone();
        let (parent_depth, parent_path) = {
            let p = self.node(parent);
            (p.depth, p.path.clone())
        };
        for (i, &child) in children.iter().enumerate() {
            let node = self.node_mut(child);
            node.local_index = i;
            node.depth = parent_depth + 1;
            node.path = format!("{parent_path}-{i}");
            self.renumber_children(child);
        }
    }

    /// Derive `completed` from the children and, when the value changed,
    /// ripple the same derivation up the parent chain. Childless nodes keep
    /// their stored value.
    fn update_completeness(&mut self, idx: Index) {
        if self.node(idx).children.is_empty() {
            return;
        }
        let all = self
            .node(idx)
            .children
            .iter()
            .all(|&c| self.node(c).completed);
        if all == self.node(idx).completed {
            return;
        }
        self.node_mut(idx).completed = all;
        if let Some(parent) = self.node(idx).parent {
            self.update_completeness(parent);
        }
    }

    fn force_completed(&mut self, idx: Index, value: bool) {
        self.node_mut(idx).completed = value;
        let children = self.node(idx).children.clone();
        for child in children {
            self.force_completed(child, value);
        }
    }

    /// True when `ancestor` lies on `node`'s parent chain.
    fn is_ancestor(&self, ancestor: Index, mut node: Index) -> bool {
        while let Some(parent) = self.node(node).parent {
            if parent == ancestor {
                return true;
            }
            node = parent;
        }
        false
    }

    /// Free an already-detached subtree from the arena.
    fn free_subtree(&mut self, idx: Index) {
        let children = self.node(idx).children.clone();
        for child in children {
            self.free_subtree(child);
        }
        self.arena.remove(idx);
    }

    fn sweep_completed(&mut self, idx: Index) {
        let children = self.node(idx).children.clone();
        let mut kept = Vec::with_capacity(children.len());
        for child in children {
            if self.node(child).completed {
                self.free_subtree(child);
            } else {
                kept.push(child);
            }
        }
        self.node_mut(idx).children = kept.clone();
        for child in kept {
            self.sweep_completed(child);
        }
    }

    /// Append a child with position caches computed directly; only valid
    /// for end-insertion into a tree built left to right (reconstruction).
    fn append_raw(&mut self, parent: Index, title: &str, completed: bool) -> Index {
        let (depth, parent_path, slot) = {
            let p = self.node(parent);
            (p.depth + 1, p.path.clone(), p.children.len())
        };
        let child = self.arena.insert(Node {
            title: title.to_string(),
            completed,
            parent: Some(parent),
            children: Vec::new(),
            local_index: slot,
            depth,
            path: format!("{parent_path}-{slot}"),
        });
        self.node_mut(parent).children.push(child);
        child
    }

    /// Pre-order walk below `start` via an explicit stack, children pushed
    /// in reverse for left-to-right order.
    fn flatten_index(&self, start: Index, filter: Filter) -> Vec<FlatEntry> {
        let mut out = Vec::new();
        let mut stack: Vec<Index> = self.node(start).children.iter().rev().copied().collect();
        while let Some(idx) = stack.pop() {
            let node = self.node(idx);
            if filter.matches(node.completed) {
                out.push(FlatEntry {
                    title: node.title.clone(),
                    path: node.path.clone(),
                    depth: node.depth,
                    completed: node.completed,
                });
            }
            stack.extend(node.children.iter().rev().copied());
        }
        out
    }
}
