//! The file currently open in the editor.

use crate::kernel::services::ports::file::{FileError, FileProvider};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Buffer shown before any file is opened.
pub const WELCOME_TEXT: &str = "# Welcome\n\nSelect a file to edit or start typing.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Refuse to replace a buffer with unsaved edits.
    KeepChanges,
    DiscardChanges,
}

impl OpenMode {
    pub fn allows_dirty_overwrite(self) -> bool {
        matches!(self, Self::DiscardChanges)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocumentError {
    #[error("no file is open")]
    NoFile,
    #[error("unsaved changes would be lost")]
    UnsavedChanges(Option<PathBuf>),
    #[error(transparent)]
    File(#[from] FileError),
}

pub struct DocumentSession {
    provider: Arc<dyn FileProvider>,
    path: Option<PathBuf>,
    text: String,
    saved: String,
}

impl DocumentSession {
    pub fn new(provider: Arc<dyn FileProvider>) -> Self {
        Self {
            provider,
            path: None,
            text: WELCOME_TEXT.to_string(),
            saved: WELCOME_TEXT.to_string(),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_dirty(&self) -> bool {
        self.text != self.saved
    }

    fn guard_dirty(&self, mode: OpenMode) -> Result<(), DocumentError> {
        if self.is_dirty() && !mode.allows_dirty_overwrite() {
            return Err(DocumentError::UnsavedChanges(self.path.clone()));
        }
        Ok(())
    }

    /// Loads `path` into the buffer. On a read failure the current buffer is
    /// left untouched.
    pub async fn open(&mut self, path: &Path, mode: OpenMode) -> Result<(), DocumentError> {
        self.guard_dirty(mode)?;
        let provider = Arc::clone(&self.provider);
        let owned = path.to_path_buf();
        let text = tokio::task::spawn_blocking(move || provider.read_text(&owned))
            .await
            .map_err(|e| FileError::Io {
                path: path.to_path_buf(),
                message: format!("read task failed: {e}"),
            })?
            .inspect_err(|err| {
                tracing::warn!(path = %path.display(), error = %err, "open failed");
            })?;

        tracing::debug!(path = %path.display(), bytes = text.len(), "document opened");
        self.path = Some(path.to_path_buf());
        self.saved = text.clone();
        self.text = text;
        Ok(())
    }

    pub fn edit(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub async fn save(&mut self) -> Result<(), DocumentError> {
        let path = self.path.clone().ok_or(DocumentError::NoFile)?;
        let provider = Arc::clone(&self.provider);
        let content = self.text.clone();
        let target = path.clone();
        tokio::task::spawn_blocking(move || provider.write_text(&target, &content))
            .await
            .map_err(|e| FileError::Io {
                path: path.clone(),
                message: format!("write task failed: {e}"),
            })?
            .inspect_err(|err| {
                tracing::warn!(path = %path.display(), error = %err, "save failed");
            })?;

        tracing::info!(path = %path.display(), "document saved");
        self.saved = self.text.clone();
        Ok(())
    }

    /// Reverts the buffer to its last saved or loaded content.
    pub fn discard(&mut self) {
        self.text = self.saved.clone();
    }

    /// Back to the welcome buffer, dropping any edits.
    pub fn close(&mut self) {
        self.path = None;
        self.text = WELCOME_TEXT.to_string();
        self.saved = WELCOME_TEXT.to_string();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/document.rs"]
mod tests;
