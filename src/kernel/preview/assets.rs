//! Binary asset loading with a per-workspace cache.
//!
//! Successful loads are cached by absolute path until the workspace changes.
//! Edits to an image on disk are not noticed until then. Concurrent loads of
//! the same path are not coalesced; both read and both store the same value.
//! A load still in flight when the cache is cleared does not store its result.

use crate::kernel::services::ports::file::{FileError, FileProvider};
use crate::models::render_block::{EncodedImage, Failure};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rustc_hash::FxHashMap;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

const DEFAULT_SUBTYPE: &str = "png";

/// Image media subtype from the file extension, `png` when unknown.
pub fn media_subtype(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "png",
        "jpg" | "jpeg" => "jpeg",
        "gif" => "gif",
        "webp" => "webp",
        "svg" => "svg+xml",
        "bmp" => "bmp",
        "ico" => "x-icon",
        "avif" => "avif",
        "tif" | "tiff" => "tiff",
        _ => DEFAULT_SUBTYPE,
    }
}

pub fn encode_data_uri(path: &Path, bytes: &[u8]) -> EncodedImage {
    format!(
        "data:image/{};base64,{}",
        media_subtype(path),
        BASE64.encode(bytes)
    )
}

/// Least-recently-used map from absolute path to encoded content.
/// A capacity of zero means unbounded.
pub struct LoadCache {
    entries: FxHashMap<PathBuf, EncodedImage>,
    order: VecDeque<PathBuf>,
    capacity: usize,
    generation: u64,
}

impl LoadCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: FxHashMap::default(),
            order: VecDeque::new(),
            capacity,
            generation: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bumped by every [`LoadCache::clear`].
    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn touch(&mut self, path: &Path) {
        if let Some(pos) = self.order.iter().position(|p| p == path) {
            if let Some(key) = self.order.remove(pos) {
                self.order.push_back(key);
            }
        }
    }

    pub fn get(&mut self, path: &Path) -> Option<EncodedImage> {
        let hit = self.entries.get(path).cloned()?;
        self.touch(path);
        Some(hit)
    }

    pub fn insert(&mut self, path: PathBuf, value: EncodedImage) {
        if self.entries.insert(path.clone(), value).is_some() {
            self.touch(&path);
            return;
        }
        self.order.push_back(path);
        if self.capacity > 0 {
            while self.entries.len() > self.capacity {
                let Some(oldest) = self.order.pop_front() else {
                    break;
                };
                self.entries.remove(&oldest);
            }
        }
    }

    /// Stores `value` only if no clear happened since `generation` was read.
    pub fn insert_if_current(
        &mut self,
        generation: u64,
        path: PathBuf,
        value: EncodedImage,
    ) -> bool {
        if generation != self.generation {
            return false;
        }
        self.insert(path, value);
        true
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
        self.generation += 1;
    }
}

pub struct AssetLoader {
    provider: Arc<dyn FileProvider>,
    cache: Mutex<LoadCache>,
}

impl AssetLoader {
    pub fn new(provider: Arc<dyn FileProvider>, capacity: usize) -> Self {
        Self {
            provider,
            cache: Mutex::new(LoadCache::new(capacity)),
        }
    }

    /// Cache hit, or the generation a later insert must match.
    fn cached_or_generation(&self, path: &Path) -> Result<EncodedImage, u64> {
        let Ok(mut cache) = self.cache.lock() else {
            return Err(0);
        };
        cache.get(path).ok_or(cache.generation())
    }

    pub fn cached_len(&self) -> usize {
        self.cache.lock().map(|c| c.len()).unwrap_or(0)
    }

    /// Drops every cached entry. Called when the workspace root changes.
    pub fn invalidate_all(&self) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.clear();
        }
    }

    /// Reads `path` (or answers from cache) and returns it as a data URI.
    pub async fn load(&self, path: &Path) -> Result<EncodedImage, FileError> {
        let generation = match self.cached_or_generation(path) {
            Ok(hit) => {
                tracing::trace!(path = %path.display(), "asset cache hit");
                return Ok(hit);
            }
            Err(generation) => generation,
        };

        let provider = Arc::clone(&self.provider);
        let owned = path.to_path_buf();
        let bytes = tokio::task::spawn_blocking(move || provider.read_binary(&owned))
            .await
            .map_err(|e| FileError::Io {
                path: path.to_path_buf(),
                message: format!("asset read task failed: {e}"),
            })??;

        let encoded = encode_data_uri(path, &bytes);
        if let Ok(mut cache) = self.cache.lock() {
            if !cache.insert_if_current(generation, path.to_path_buf(), encoded.clone()) {
                tracing::trace!(path = %path.display(), "cache cleared during load, not stored");
            }
        }
        tracing::debug!(path = %path.display(), bytes = bytes.len(), "asset loaded");
        Ok(encoded)
    }

    /// [`AssetLoader::load`] with the failure converted for display, falling
    /// back to the reference exactly as written in the document.
    pub async fn load_or_fallback(
        &self,
        path: &Path,
        reference: &str,
    ) -> Result<EncodedImage, Failure> {
        self.load(path).await.map_err(|err| {
            tracing::warn!(path = %path.display(), error = %err, "asset load failed");
            Failure::new(err.kind(), err.to_string(), reference)
        })
    }
}

#[cfg(test)]
#[path = "../../../tests/unit/kernel/preview/assets.rs"]
mod tests;
