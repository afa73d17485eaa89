//! Top-level context: one workspace, its preview and the open document.
//!
//! Settings are read once from the injected [`ConfigStore`] at construction
//! and written through on every change, including each successful
//! workspace open.

use crate::kernel::document::DocumentSession;
use crate::kernel::preview::{AssetLoader, ContentPipeline, Preview};
use crate::kernel::services::adapters::diagram::FlowchartCompiler;
use crate::kernel::services::ports::file::{FileError, FileProvider};
use crate::kernel::services::ports::{AsyncExecutor, ConfigStore, DiagramCompiler, Settings, SettingsError};
use crate::kernel::workspace::{Workspace, WorkspaceError};
use crate::models::workspace_tree::WorkspaceNode;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub struct Session {
    config: Box<dyn ConfigStore>,
    settings: Settings,
    workspace: Workspace,
    assets: Arc<AssetLoader>,
    preview: Preview,
    document: DocumentSession,
}

impl Session {
    /// Builds a session with the flowchart compiler configured from the
    /// stored diagram settings.
    pub fn new(
        provider: Arc<dyn FileProvider>,
        config: Box<dyn ConfigStore>,
        executor: Arc<dyn AsyncExecutor>,
    ) -> Self {
        let settings = load_settings(config.as_ref());
        let compiler = Arc::new(FlowchartCompiler::from_settings(&settings.diagram));
        Self::assemble(provider, config, settings, executor, compiler)
    }

    pub fn with_compiler(
        provider: Arc<dyn FileProvider>,
        config: Box<dyn ConfigStore>,
        executor: Arc<dyn AsyncExecutor>,
        compiler: Arc<dyn DiagramCompiler>,
    ) -> Self {
        let settings = load_settings(config.as_ref());
        Self::assemble(provider, config, settings, executor, compiler)
    }

    fn assemble(
        provider: Arc<dyn FileProvider>,
        config: Box<dyn ConfigStore>,
        settings: Settings,
        executor: Arc<dyn AsyncExecutor>,
        compiler: Arc<dyn DiagramCompiler>,
    ) -> Self {
        let assets = Arc::new(AssetLoader::new(
            Arc::clone(&provider),
            settings.assets.cache_capacity,
        ));
        let (pipeline, messages) = ContentPipeline::new(Arc::clone(&assets), compiler, executor);
        let preview = Preview::new(
            pipeline,
            messages,
            Duration::from_millis(settings.preview.debounce_ms),
        );
        Self {
            config,
            workspace: Workspace::new(Arc::clone(&provider)),
            document: DocumentSession::new(provider),
            assets,
            preview,
            settings,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Applies `change` and writes the result through to the config store.
    pub fn update_settings(
        &mut self,
        change: impl FnOnce(&mut Settings),
    ) -> Result<(), SettingsError> {
        change(&mut self.settings);
        self.preview
            .set_debounce(Duration::from_millis(self.settings.preview.debounce_ms));
        self.config.save(&self.settings)
    }

    pub fn set_font_size(&mut self, size: &str) -> Result<bool, SettingsError> {
        if !self.settings.preview.set_font_size(size) {
            return Ok(false);
        }
        self.config.save(&self.settings)?;
        Ok(true)
    }

    pub fn set_font_family(&mut self, family: &str) -> Result<bool, SettingsError> {
        if !self.settings.preview.set_font_family(family) {
            return Ok(false);
        }
        self.config.save(&self.settings)?;
        Ok(true)
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn assets(&self) -> &Arc<AssetLoader> {
        &self.assets
    }

    pub fn preview(&self) -> &Preview {
        &self.preview
    }

    pub fn preview_mut(&mut self) -> &mut Preview {
        &mut self.preview
    }

    pub fn document(&self) -> &DocumentSession {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut DocumentSession {
        &mut self.document
    }

    /// Opens `root` as the workspace, dropping every cached asset, and
    /// records it as the last workspace. A failed settings write is logged,
    /// not returned: the workspace is open either way.
    pub fn open_workspace(&mut self, root: PathBuf) -> WorkspaceNode {
        self.assets.invalidate_all();
        self.preview.invalidate();
        let node = self.workspace.open(root.clone());

        self.settings.last_workspace = Some(root);
        if let Err(err) = self.config.save(&self.settings) {
            tracing::warn!(error = %err, "failed to persist last workspace");
        }
        node
    }

    /// Asks the host for a folder and opens it. Cancelling is an error the
    /// caller can ignore.
    pub async fn pick_workspace(&mut self) -> Result<WorkspaceNode, WorkspaceError> {
        let provider = Arc::clone(self.workspace.provider());
        let picked = tokio::task::spawn_blocking(move || provider.pick_directory())
            .await
            .map_err(|e| FileError::Io {
                path: PathBuf::new(),
                message: format!("folder picker failed: {e}"),
            })??;
        Ok(self.open_workspace(picked))
    }

    /// Reopens the workspace recorded by the last successful open, if any.
    pub fn restore_last_workspace(&mut self) -> Option<WorkspaceNode> {
        let root = self.settings.last_workspace.clone()?;
        tracing::info!(root = %root.display(), "restoring last workspace");
        Some(self.open_workspace(root))
    }

    pub fn close_workspace(&mut self) {
        self.workspace.close();
        self.assets.invalidate_all();
        self.preview.invalidate();
        self.document.close();
    }

    /// Replaces the document text and queues a debounced preview render.
    pub fn edit(&mut self, text: impl Into<String>, now: Instant) {
        self.document.edit(text);
        self.preview
            .schedule(self.document.text(), self.document.path(), now);
    }

    /// Renders the document as it is now, bypassing the debounce.
    pub fn render_document(&mut self) -> bool {
        self.preview
            .render_now(self.document.text(), self.document.path())
    }
}

fn load_settings(config: &dyn ConfigStore) -> Settings {
    match config.load() {
        Ok(settings) => settings,
        Err(err) => {
            tracing::warn!(error = %err, "failed to load settings, using defaults");
            Settings::default()
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/session.rs"]
mod tests;
