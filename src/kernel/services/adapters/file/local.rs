//! Local filesystem provider.
//!
//! Implements [`FileProvider`] over `std::fs`. Host prompts (import source,
//! workspace folder) are delegated to the injected [`FilePicker`].

use crate::kernel::services::ports::file::{
    DirEntry, FileError, FilePicker, FileProvider, NoPicker, Result,
};
use std::fs;
use std::path::{Path, PathBuf};

pub struct LocalFileProvider {
    picker: Box<dyn FilePicker>,
}

impl LocalFileProvider {
    pub fn new() -> Self {
        Self::with_picker(Box::new(NoPicker))
    }

    pub fn with_picker(picker: Box<dyn FilePicker>) -> Self {
        Self { picker }
    }
}

impl Default for LocalFileProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl FileProvider for LocalFileProvider {
    fn list_directory(&self, path: &Path) -> Result<Vec<DirEntry>> {
        let metadata = fs::metadata(path).map_err(|e| FileError::from_io(e, path))?;
        if !metadata.is_dir() {
            return Err(FileError::NotADirectory(path.to_path_buf()));
        }

        let mut entries = Vec::new();
        for entry in fs::read_dir(path).map_err(|e| FileError::from_io(e, path))? {
            let entry = entry.map_err(|e| FileError::from_io(e, path))?;
            let entry_path = entry.path();
            // Symlinks count as directories when they point at one.
            let is_dir = match entry.file_type() {
                Ok(t) if t.is_symlink() => entry_path.is_dir(),
                Ok(t) => t.is_dir(),
                Err(_) => false,
            };
            entries.push(DirEntry {
                name: entry.file_name().to_string_lossy().to_string(),
                path: entry_path,
                is_dir,
            });
        }
        Ok(entries)
    }

    fn read_text(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).map_err(|e| FileError::from_io(e, path))
    }

    fn read_binary(&self, path: &Path) -> Result<Vec<u8>> {
        if path.is_dir() {
            return Err(FileError::NotFound(path.to_path_buf()));
        }
        fs::read(path).map_err(|e| FileError::from_io(e, path))
    }

    fn write_text(&self, path: &Path, content: &str) -> Result<()> {
        fs::write(path, content).map_err(|e| FileError::from_io(e, path))
    }

    fn create_file(&self, parent: &Path, name: &str) -> Result<PathBuf> {
        let path = parent.join(name);
        fs::OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(&path)
            .map_err(|e| FileError::from_io(e, &path))?;
        Ok(path)
    }

    fn create_directory(&self, parent: &Path, name: &str) -> Result<PathBuf> {
        let path = parent.join(name);
        fs::create_dir(&path).map_err(|e| FileError::from_io(e, &path))?;
        Ok(path)
    }

    fn import_file(&self, dest_dir: &Path) -> Result<PathBuf> {
        let source = self.picker.pick_file().ok_or(FileError::Cancelled)?;
        let file_name = source
            .file_name()
            .ok_or_else(|| FileError::NotFound(source.clone()))?;
        let dest = dest_dir.join(file_name);
        if dest == source {
            return Ok(dest);
        }
        fs::copy(&source, &dest).map_err(|e| {
            if source.exists() {
                FileError::from_io(e, &dest)
            } else {
                FileError::from_io(e, &source)
            }
        })?;
        Ok(dest)
    }

    fn pick_directory(&self) -> Result<PathBuf> {
        self.picker.pick_directory().ok_or(FileError::Cancelled)
    }
}

#[cfg(test)]
#[path = "../../../../../tests/unit/kernel/services/adapters/file/local.rs"]
mod tests;
