//! Lazily populated workspace tree.
//!
//! Nodes live in a slotmap arena. A directory's children are only known after
//! a successful listing; every listing is re-sorted (directories first, then
//! byte-wise by name). The tree never performs IO itself: callers drive it
//! with [`WorkspaceTree::begin_expand`] / [`WorkspaceTree::finish_load`].

use crate::kernel::services::ports::file::{DirEntry, FileError};
use rustc_hash::{FxHashMap, FxHashSet};
use slotmap::{new_key_type, SlotMap};
use std::cmp::Ordering;
use std::path::{Path, PathBuf};

new_key_type! { pub struct NodeId; }

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    File,
    Dir,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LoadState {
    Unloaded,
    Loading,
    Loaded,
    LoadFailed,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    #[error("invalid node id")]
    InvalidNodeId,
    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
    #[error("invalid name `{0}`")]
    InvalidName(String),
    #[error(transparent)]
    Io(#[from] FileError),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    name: String,
    path: PathBuf,
    parent: Option<NodeId>,
    /// `None` until the first successful listing.
    children: Option<Vec<NodeId>>,
    load_state: LoadState,
}

/// Read-only view of one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceNode {
    pub id: NodeId,
    pub name: String,
    pub path: PathBuf,
    pub is_dir: bool,
    pub children: Option<Vec<NodeId>>,
    pub expanded: bool,
    pub load_state: LoadState,
}

/// What the caller must do after asking to expand a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpandStep {
    /// Already loaded; visibility toggled, no IO needed.
    Toggled { expanded: bool },
    /// A listing for this node is already in flight.
    InFlight,
    /// Node is now `Loading`; list this path and report back.
    List(PathBuf),
}

pub struct WorkspaceTree {
    arena: SlotMap<NodeId, Node>,
    root: NodeId,
    expanded: FxHashSet<NodeId>,
    selected: Option<NodeId>,
    id_by_path: FxHashMap<PathBuf, NodeId>,
}

/// Directories before files, then case-sensitive by name.
pub fn compare_entries(a_dir: bool, a_name: &str, b_dir: bool, b_name: &str) -> Ordering {
    b_dir.cmp(&a_dir).then_with(|| a_name.cmp(b_name))
}

pub fn sort_entries(entries: &mut [DirEntry]) {
    entries.sort_by(|a, b| compare_entries(a.is_dir, &a.name, b.is_dir, &b.name));
}

/// OS bookkeeping entries hidden from the sidebar.
pub fn should_ignore(name: &str) -> bool {
    matches!(
        name,
        ".DS_Store"
            | ".Spotlight-V100"
            | ".Trashes"
            | ".fseventsd"
            | ".TemporaryItems"
            | "Thumbs.db"
            | "desktop.ini"
            | ".git"
    )
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .or_else(|| path.iter().next_back())
        .unwrap_or(path.as_os_str())
        .to_string_lossy()
        .to_string()
}

impl WorkspaceTree {
    /// New tree whose root is an unloaded directory at `root_path`. Nothing is
    /// listed until the root is expanded.
    pub fn new(root_path: PathBuf) -> Self {
        let mut arena = SlotMap::with_key();
        let root = arena.insert(Node {
            kind: NodeKind::Dir,
            name: display_name(&root_path),
            path: root_path.clone(),
            parent: None,
            children: None,
            load_state: LoadState::Unloaded,
        });

        let mut id_by_path = FxHashMap::default();
        id_by_path.insert(root_path, root);

        Self {
            arena,
            root,
            expanded: FxHashSet::default(),
            selected: Some(root),
            id_by_path,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn root_path(&self) -> &Path {
        &self.arena[self.root].path
    }

    pub fn selected(&self) -> Option<NodeId> {
        self.selected
    }

    pub fn set_selected(&mut self, id: Option<NodeId>) {
        self.selected = id.filter(|id| self.arena.contains_key(*id));
    }

    fn snapshot(&self, id: NodeId, node: &Node) -> WorkspaceNode {
        WorkspaceNode {
            id,
            name: node.name.clone(),
            path: node.path.clone(),
            is_dir: node.kind == NodeKind::Dir,
            children: node.children.clone(),
            expanded: self.expanded.contains(&id),
            load_state: node.load_state,
        }
    }

    pub fn node(&self, id: NodeId) -> Option<WorkspaceNode> {
        self.arena.get(id).map(|node| self.snapshot(id, node))
    }

    pub fn root_node(&self) -> WorkspaceNode {
        self.snapshot(self.root, &self.arena[self.root])
    }

    pub fn load_state(&self, id: NodeId) -> Option<LoadState> {
        self.arena.get(id).map(|n| n.load_state)
    }

    pub fn path(&self, id: NodeId) -> Option<&Path> {
        self.arena.get(id).map(|n| n.path.as_path())
    }

    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.arena.get(id).map(|n| n.name.as_str())
    }

    pub fn is_dir(&self, id: NodeId) -> bool {
        self.arena
            .get(id)
            .map(|n| n.kind == NodeKind::Dir)
            .unwrap_or(false)
    }

    pub fn is_expanded(&self, id: NodeId) -> bool {
        self.expanded.contains(&id)
    }

    /// Children from the last successful listing, in display order.
    pub fn children(&self, id: NodeId) -> Option<&[NodeId]> {
        self.arena.get(id)?.children.as_deref()
    }

    pub fn find_node_by_path(&self, path: &Path) -> Option<NodeId> {
        self.id_by_path.get(path).copied()
    }

    fn dir_node(&self, id: NodeId) -> Result<&Node, TreeError> {
        let node = self.arena.get(id).ok_or(TreeError::InvalidNodeId)?;
        if node.kind != NodeKind::Dir {
            return Err(TreeError::NotADirectory(node.path.clone()));
        }
        Ok(node)
    }

    /// First half of `expand`. Loaded nodes just toggle visibility; unloaded
    /// or failed nodes move to `Loading` and ask the caller for a listing.
    pub fn begin_expand(&mut self, id: NodeId) -> Result<ExpandStep, TreeError> {
        let (state, path) = {
            let node = self.dir_node(id)?;
            (node.load_state, node.path.clone())
        };
        match state {
            LoadState::Loaded => {
                let expanded = if self.expanded.remove(&id) {
                    false
                } else {
                    self.expanded.insert(id);
                    true
                };
                Ok(ExpandStep::Toggled { expanded })
            }
            LoadState::Loading => Ok(ExpandStep::InFlight),
            LoadState::Unloaded | LoadState::LoadFailed => {
                self.arena[id].load_state = LoadState::Loading;
                Ok(ExpandStep::List(path))
            }
        }
    }

    /// Second half of `expand`. On success the listing replaces the children
    /// (same-name, same-kind nodes keep their id and subtree) and the node
    /// becomes loaded and expanded. On failure the node becomes `LoadFailed`
    /// with its previous children untouched, and the error is returned.
    ///
    /// Returns `Ok(false)` when the result is stale (node gone, refreshed or
    /// not loading any more) and was dropped.
    pub fn finish_load(
        &mut self,
        id: NodeId,
        listing: Result<Vec<DirEntry>, FileError>,
    ) -> Result<bool, TreeError> {
        match self.arena.get(id) {
            Some(node) if node.load_state == LoadState::Loading => {}
            _ => return Ok(false),
        }

        let mut entries = match listing {
            Ok(entries) => entries,
            Err(err) => {
                self.arena[id].load_state = LoadState::LoadFailed;
                return Err(TreeError::Io(err));
            }
        };
        entries.retain(|e| !should_ignore(&e.name));
        sort_entries(&mut entries);

        let mut previous: FxHashMap<(String, NodeKind), NodeId> = self.arena[id]
            .children
            .take()
            .unwrap_or_default()
            .into_iter()
            .filter_map(|child| {
                let node = self.arena.get(child)?;
                Some(((node.name.clone(), node.kind), child))
            })
            .collect();

        let mut children = Vec::with_capacity(entries.len());
        for entry in entries {
            let kind = if entry.is_dir {
                NodeKind::Dir
            } else {
                NodeKind::File
            };
            let child = match previous.remove(&(entry.name.clone(), kind)) {
                Some(existing) => existing,
                None => {
                    let child = self.arena.insert(Node {
                        kind,
                        name: entry.name,
                        path: entry.path.clone(),
                        parent: Some(id),
                        children: None,
                        load_state: match kind {
                            NodeKind::Dir => LoadState::Unloaded,
                            NodeKind::File => LoadState::Loaded,
                        },
                    });
                    self.id_by_path.insert(entry.path, child);
                    child
                }
            };
            children.push(child);
        }

        for (_, stale) in previous {
            self.remove_subtree(stale);
        }

        let node = &mut self.arena[id];
        node.children = Some(children);
        node.load_state = LoadState::Loaded;
        self.expanded.insert(id);
        Ok(true)
    }

    pub fn collapse(&mut self, id: NodeId) {
        self.expanded.remove(&id);
    }

    /// Forces a re-listing on the next expand. Children stay in memory until
    /// that listing lands; the node is collapsed because only loaded nodes
    /// can be expanded.
    pub fn refresh(&mut self, id: NodeId) -> Result<(), TreeError> {
        self.dir_node(id)?;
        self.arena[id].load_state = LoadState::Unloaded;
        self.expanded.remove(&id);
        Ok(())
    }

    fn remove_subtree(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(node_id) = stack.pop() {
            let Some(node) = self.arena.remove(node_id) else {
                continue;
            };
            if let Some(children) = node.children {
                stack.extend(children);
            }
            self.expanded.remove(&node_id);
            if self.id_by_path.get(&node.path) == Some(&node_id) {
                self.id_by_path.remove(&node.path);
            }
            if self.selected == Some(node_id) {
                self.selected = node.parent.filter(|p| self.arena.contains_key(*p));
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeRow {
    pub id: NodeId,
    pub depth: u16,
    pub name: String,
    pub is_dir: bool,
    pub is_expanded: bool,
    pub load_state: LoadState,
}

impl WorkspaceTree {
    /// Visible rows below the root, depth-first in display order.
    pub fn flatten_for_view(&self) -> Vec<TreeRow> {
        let mut result = Vec::new();
        let mut stack: Vec<(NodeId, u16)> = vec![(self.root, 0)];

        while let Some((id, depth)) = stack.pop() {
            let Some(node) = self.arena.get(id) else {
                continue;
            };
            if id != self.root {
                result.push(TreeRow {
                    id,
                    depth,
                    name: node.name.clone(),
                    is_dir: node.kind == NodeKind::Dir,
                    is_expanded: self.expanded.contains(&id),
                    load_state: node.load_state,
                });
            }

            if self.expanded.contains(&id) {
                if let Some(children) = &node.children {
                    let child_depth = if id == self.root { 0 } else { depth + 1 };
                    for &child in children.iter().rev() {
                        stack.push((child, child_depth));
                    }
                }
            }
        }

        result
    }
}

#[cfg(test)]
#[path = "../../tests/unit/models/workspace_tree.rs"]
mod tests;
