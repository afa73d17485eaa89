//! Markdown preview: reference resolution, asset loading, block pipeline.

pub mod assets;
pub mod gallery;
pub mod pipeline;
pub mod resolver;

pub use assets::{AssetLoader, LoadCache};
pub use gallery::{gallery, GalleryItem};
pub use pipeline::{ContentPipeline, Preview, PreviewMessage, RenderPass, DIAGRAM_TAG};
pub use resolver::{resolve, Resolved};
