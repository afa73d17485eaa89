//! Filesystem collaborator contract.
//!
//! The workspace tree, asset loader and document session never touch
//! `std::fs` directly; everything goes through a [`FileProvider`].

use std::io;
use std::path::{Path, PathBuf};

pub type Result<T> = std::result::Result<T, FileError>;

/// Failure taxonomy shared by every component boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    PermissionDenied,
    AlreadyExists,
    NotADirectory,
    Cancelled,
    DecodeError,
    DiskFull,
    CompileError,
    Unresolved,
    Io,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not found",
            ErrorKind::PermissionDenied => "permission denied",
            ErrorKind::AlreadyExists => "already exists",
            ErrorKind::NotADirectory => "not a directory",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::DecodeError => "decode error",
            ErrorKind::DiskFull => "disk full",
            ErrorKind::CompileError => "compile error",
            ErrorKind::Unresolved => "unresolved",
            ErrorKind::Io => "io error",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FileError {
    #[error("not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),
    #[error("already exists: {}", .0.display())]
    AlreadyExists(PathBuf),
    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
    #[error("cancelled")]
    Cancelled,
    #[error("not valid UTF-8 text: {}", .0.display())]
    Decode(PathBuf),
    #[error("disk full while writing {}", .0.display())]
    DiskFull(PathBuf),
    #[error("io error on {}: {message}", .path.display())]
    Io { path: PathBuf, message: String },
}

impl FileError {
    /// Classifies an OS error raised while operating on `path`.
    pub fn from_io(err: io::Error, path: &Path) -> Self {
        let path = path.to_path_buf();
        #[cfg(unix)]
        match err.raw_os_error() {
            Some(libc::ENOSPC) => return FileError::DiskFull(path),
            Some(libc::ENOTDIR) => return FileError::NotADirectory(path),
            _ => {}
        }
        match err.kind() {
            io::ErrorKind::NotFound => FileError::NotFound(path),
            io::ErrorKind::PermissionDenied => FileError::PermissionDenied(path),
            io::ErrorKind::AlreadyExists => FileError::AlreadyExists(path),
            io::ErrorKind::InvalidData => FileError::Decode(path),
            _ => FileError::Io {
                path,
                message: err.to_string(),
            },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            FileError::NotFound(_) => ErrorKind::NotFound,
            FileError::PermissionDenied(_) => ErrorKind::PermissionDenied,
            FileError::AlreadyExists(_) => ErrorKind::AlreadyExists,
            FileError::NotADirectory(_) => ErrorKind::NotADirectory,
            FileError::Cancelled => ErrorKind::Cancelled,
            FileError::Decode(_) => ErrorKind::DecodeError,
            FileError::DiskFull(_) => ErrorKind::DiskFull,
            FileError::Io { .. } => ErrorKind::Io,
        }
    }
}

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub path: PathBuf,
    pub is_dir: bool,
}

impl DirEntry {
    pub fn new(path: PathBuf, is_dir: bool) -> Self {
        let name = path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        Self { name, path, is_dir }
    }
}

/// Host file/folder chooser. Returning `None` means the user cancelled.
pub trait FilePicker: Send + Sync {
    fn pick_file(&self) -> Option<PathBuf>;

    fn pick_directory(&self) -> Option<PathBuf>;
}

/// Picker for headless hosts: every prompt is cancelled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPicker;

impl FilePicker for NoPicker {
    fn pick_file(&self) -> Option<PathBuf> {
        None
    }

    fn pick_directory(&self) -> Option<PathBuf> {
        None
    }
}

pub trait FileProvider: Send + Sync {
    fn list_directory(&self, path: &Path) -> Result<Vec<DirEntry>>;

    fn read_text(&self, path: &Path) -> Result<String>;

    fn read_binary(&self, path: &Path) -> Result<Vec<u8>>;

    fn write_text(&self, path: &Path, content: &str) -> Result<()>;

    fn create_file(&self, parent: &Path, name: &str) -> Result<PathBuf>;

    fn create_directory(&self, parent: &Path, name: &str) -> Result<PathBuf>;

    /// Asks the host for a source file and copies it into `dest_dir`,
    /// returning the destination path.
    fn import_file(&self, dest_dir: &Path) -> Result<PathBuf>;

    fn pick_directory(&self) -> Result<PathBuf>;
}

#[cfg(test)]
#[path = "../../../../tests/unit/kernel/services/ports/file.rs"]
mod tests;
