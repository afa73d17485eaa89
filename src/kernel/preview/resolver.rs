//! Image reference resolution against the file being previewed.

use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    /// Has a scheme (`https:`, `data:`, ...); displayed as-is, never loaded.
    Url(String),
    /// Absolute filesystem path to load.
    Path(PathBuf),
    /// Relative reference with no file to anchor it.
    Unresolved(String),
}

impl Resolved {
    pub fn display(&self) -> String {
        match self {
            Resolved::Url(url) | Resolved::Unresolved(url) => url.clone(),
            Resolved::Path(path) => path.to_string_lossy().to_string(),
        }
    }
}

/// True when `reference` parses as a URL with a real scheme. Single-letter
/// schemes are Windows drive letters, not URLs.
pub fn is_url(reference: &str) -> bool {
    match url::Url::parse(reference) {
        Ok(url) => url.scheme().len() > 1,
        Err(_) => false,
    }
}

/// Absolute paths and URLs pass through. Relative references are joined onto
/// the directory containing `context_file`. No IO, no normalisation: a bad
/// join surfaces later as a read failure.
pub fn resolve(reference: &str, context_file: Option<&Path>) -> Resolved {
    if is_url(reference) {
        return Resolved::Url(reference.to_string());
    }
    let path = Path::new(reference);
    if path.is_absolute() || reference.starts_with('/') {
        return Resolved::Path(path.to_path_buf());
    }
    match context_file {
        Some(file) => {
            let dir = file.parent().unwrap_or_else(|| Path::new(""));
            Resolved::Path(dir.join(reference))
        }
        None => Resolved::Unresolved(reference.to_string()),
    }
}

#[cfg(test)]
#[path = "../../../tests/unit/kernel/preview/resolver.rs"]
mod tests;
