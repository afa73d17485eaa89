//! Async driver for the workspace tree.
//!
//! The tree itself is plain state; this wrapper performs the listings and
//! mutations through the [`FileProvider`] on tokio's blocking pool. The
//! lock is never held across an await, so sibling expands run concurrently.

use crate::kernel::services::ports::file::{ErrorKind, FileError, FileProvider};
use crate::models::workspace_tree::{
    ExpandStep, NodeId, TreeError, TreeRow, WorkspaceNode, WorkspaceTree,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkspaceError {
    #[error("no workspace is open")]
    NoWorkspace,
    #[error(transparent)]
    Tree(#[from] TreeError),
    #[error(transparent)]
    File(#[from] FileError),
}

impl WorkspaceError {
    /// The underlying filesystem failure, if any.
    pub fn file_error(&self) -> Option<&FileError> {
        match self {
            WorkspaceError::File(err) | WorkspaceError::Tree(TreeError::Io(err)) => Some(err),
            _ => None,
        }
    }

    pub fn kind(&self) -> Option<ErrorKind> {
        self.file_error().map(FileError::kind)
    }

    /// Text for a blocking notification about a failed tree action.
    pub fn notification(&self, action: &str) -> String {
        format!("Failed to {action}: {self}")
    }
}

struct Opened {
    generation: u64,
    tree: WorkspaceTree,
}

pub struct Workspace {
    provider: Arc<dyn FileProvider>,
    state: Mutex<Option<Opened>>,
    generations: AtomicU64,
}

fn validate_name(name: &str) -> Result<(), TreeError> {
    let trimmed = name.trim();
    if trimmed.is_empty()
        || trimmed == "."
        || trimmed == ".."
        || name.contains('/')
        || name.contains('\\')
    {
        return Err(TreeError::InvalidName(name.to_string()));
    }
    Ok(())
}

impl Workspace {
    pub fn new(provider: Arc<dyn FileProvider>) -> Self {
        Self {
            provider,
            state: Mutex::new(None),
            generations: AtomicU64::new(0),
        }
    }

    pub fn provider(&self) -> &Arc<dyn FileProvider> {
        &self.provider
    }

    fn lock(&self) -> MutexGuard<'_, Option<Opened>> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn with_tree<R>(
        &self,
        f: impl FnOnce(&mut WorkspaceTree) -> Result<R, TreeError>,
    ) -> Result<R, WorkspaceError> {
        let mut state = self.lock();
        let opened = state.as_mut().ok_or(WorkspaceError::NoWorkspace)?;
        Ok(f(&mut opened.tree)?)
    }

    async fn blocking<T, F>(&self, path: &Path, op: F) -> Result<T, FileError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn FileProvider) -> Result<T, FileError> + Send + 'static,
    {
        let provider = Arc::clone(&self.provider);
        tokio::task::spawn_blocking(move || op(provider.as_ref()))
            .await
            .map_err(|e| FileError::Io {
                path: path.to_path_buf(),
                message: format!("filesystem task failed: {e}"),
            })?
    }

    /// Replaces any open tree with an unloaded root at `root`. Nothing is
    /// listed until the root is expanded.
    pub fn open(&self, root: PathBuf) -> WorkspaceNode {
        let generation = self.generations.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::info!(root = %root.display(), "workspace opened");
        let tree = WorkspaceTree::new(root);
        let node = tree.root_node();
        *self.lock() = Some(Opened { generation, tree });
        node
    }

    pub fn close(&self) {
        if let Some(opened) = self.lock().take() {
            tracing::info!(root = %opened.tree.root_path().display(), "workspace closed");
        }
    }

    pub fn is_open(&self) -> bool {
        self.lock().is_some()
    }

    pub fn root(&self) -> Option<NodeId> {
        self.lock().as_ref().map(|o| o.tree.root())
    }

    pub fn root_path(&self) -> Option<PathBuf> {
        self.lock().as_ref().map(|o| o.tree.root_path().to_path_buf())
    }

    pub fn node(&self, id: NodeId) -> Option<WorkspaceNode> {
        self.lock().as_ref()?.tree.node(id)
    }

    pub fn find_node_by_path(&self, path: &Path) -> Option<NodeId> {
        self.lock().as_ref()?.tree.find_node_by_path(path)
    }

    /// Visible rows for the sidebar; empty when no workspace is open.
    pub fn rows(&self) -> Vec<TreeRow> {
        self.lock()
            .as_ref()
            .map(|o| o.tree.flatten_for_view())
            .unwrap_or_default()
    }

    pub fn select(&self, id: Option<NodeId>) {
        if let Some(opened) = self.lock().as_mut() {
            opened.tree.set_selected(id);
        }
    }

    pub fn selected(&self) -> Option<NodeId> {
        self.lock().as_ref()?.tree.selected()
    }

    /// Expands `id`, listing it first if it is not loaded. A loaded node
    /// only toggles. Returns whether the node ends up expanded.
    pub async fn expand(&self, id: NodeId) -> Result<bool, WorkspaceError> {
        let (generation, step) = {
            let mut state = self.lock();
            let opened = state.as_mut().ok_or(WorkspaceError::NoWorkspace)?;
            (opened.generation, opened.tree.begin_expand(id)?)
        };

        let path = match step {
            ExpandStep::Toggled { expanded } => return Ok(expanded),
            ExpandStep::InFlight => return Ok(false),
            ExpandStep::List(path) => path,
        };

        tracing::debug!(path = %path.display(), "listing directory");
        let owned = path.clone();
        let listing = self
            .blocking(&path, move |fs| fs.list_directory(&owned))
            .await;
        if let Err(err) = &listing {
            tracing::warn!(path = %path.display(), error = %err, "directory listing failed");
        }

        let mut state = self.lock();
        match state.as_mut() {
            Some(opened) if opened.generation == generation => {
                Ok(opened.tree.finish_load(id, listing)?)
            }
            _ => {
                tracing::debug!(path = %path.display(), "dropping listing for a closed workspace");
                Ok(false)
            }
        }
    }

    pub fn collapse(&self, id: NodeId) -> Result<(), WorkspaceError> {
        self.with_tree(|tree| {
            tree.collapse(id);
            Ok(())
        })
    }

    pub fn refresh(&self, id: NodeId) -> Result<(), WorkspaceError> {
        self.with_tree(|tree| tree.refresh(id))
    }

    /// Marks the node for `parent` (if it is in the tree) for re-listing.
    fn refresh_parent(&self, parent: &Path) {
        let mut state = self.lock();
        let Some(opened) = state.as_mut() else {
            return;
        };
        if let Some(id) = opened.tree.find_node_by_path(parent) {
            if let Err(err) = opened.tree.refresh(id) {
                tracing::warn!(path = %parent.display(), error = %err, "refresh after mutation failed");
            }
        }
    }

    pub async fn create_file(&self, parent: &Path, name: &str) -> Result<PathBuf, WorkspaceError> {
        self.create(parent, name, false).await
    }

    pub async fn create_folder(
        &self,
        parent: &Path,
        name: &str,
    ) -> Result<PathBuf, WorkspaceError> {
        self.create(parent, name, true).await
    }

    async fn create(&self, parent: &Path, name: &str, dir: bool) -> Result<PathBuf, WorkspaceError> {
        if !self.is_open() {
            return Err(WorkspaceError::NoWorkspace);
        }
        validate_name(name)?;

        let owned_parent = parent.to_path_buf();
        let owned_name = name.to_string();
        let created = self
            .blocking(parent, move |fs| {
                if dir {
                    fs.create_directory(&owned_parent, &owned_name)
                } else {
                    fs.create_file(&owned_parent, &owned_name)
                }
            })
            .await
            .inspect_err(|err| {
                tracing::warn!(parent = %parent.display(), name, error = %err, "create failed");
            })?;

        self.refresh_parent(parent);
        tracing::info!(path = %created.display(), dir, "created");
        Ok(created)
    }

    /// Copies a user-picked file into `dest_dir` and refreshes that directory.
    pub async fn import_file(&self, dest_dir: &Path) -> Result<PathBuf, WorkspaceError> {
        if !self.is_open() {
            return Err(WorkspaceError::NoWorkspace);
        }
        let owned = dest_dir.to_path_buf();
        let imported = self
            .blocking(dest_dir, move |fs| fs.import_file(&owned))
            .await
            .inspect_err(|err| match err {
                FileError::Cancelled => tracing::debug!("import cancelled"),
                _ => tracing::warn!(dest = %dest_dir.display(), error = %err, "import failed"),
            })?;

        self.refresh_parent(dest_dir);
        tracing::info!(path = %imported.display(), "imported");
        Ok(imported)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/workspace.rs"]
mod tests;
