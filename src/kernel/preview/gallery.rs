//! Image grid for a directory.

use super::assets::AssetLoader;
use crate::kernel::services::ports::file::{ErrorKind, FileError, FileProvider};
use crate::models::render_block::{BlockStatus, EncodedImage, Failure};
use crate::models::workspace_tree::sort_entries;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "svg"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GalleryItem {
    pub name: String,
    pub path: PathBuf,
    pub status: BlockStatus<EncodedImage>,
}

pub fn is_image_name(name: &str) -> bool {
    Path::new(name)
        .extension()
        .map(|ext| {
            let ext = ext.to_string_lossy();
            IMAGE_EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

/// Lists `dir` and loads every image file in it concurrently. A listing
/// failure is returned; a single unreadable image only fails its own item.
pub async fn gallery(
    provider: Arc<dyn FileProvider>,
    assets: Arc<AssetLoader>,
    dir: &Path,
) -> Result<Vec<GalleryItem>, FileError> {
    let owned = dir.to_path_buf();
    let mut entries = tokio::task::spawn_blocking(move || provider.list_directory(&owned))
        .await
        .map_err(|e| FileError::Io {
            path: dir.to_path_buf(),
            message: format!("gallery listing task failed: {e}"),
        })??;
    entries.retain(|e| !e.is_dir && is_image_name(&e.name));
    sort_entries(&mut entries);

    let handles: Vec<_> = entries
        .into_iter()
        .map(|entry| {
            let assets = Arc::clone(&assets);
            let (name, path) = (entry.name.clone(), entry.path.clone());
            let handle = tokio::spawn(async move {
                assets.load_or_fallback(&entry.path, &entry.name).await
            });
            (name, path, handle)
        })
        .collect();

    let mut items = Vec::with_capacity(handles.len());
    for (name, path, handle) in handles {
        let status = match handle.await {
            Ok(Ok(encoded)) => BlockStatus::Ready(encoded),
            Ok(Err(failure)) => BlockStatus::Failed(failure),
            Err(err) => BlockStatus::Failed(Failure::new(
                ErrorKind::Io,
                format!("image load task failed: {err}"),
                name.clone(),
            )),
        };
        items.push(GalleryItem { name, path, status });
    }
    tracing::debug!(dir = %dir.display(), images = items.len(), "gallery loaded");
    Ok(items)
}

#[cfg(test)]
#[path = "../../../tests/unit/kernel/preview/gallery.rs"]
mod tests;
