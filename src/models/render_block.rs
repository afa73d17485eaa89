//! Render-ready document blocks produced by the preview pipeline.

use crate::kernel::services::ports::{ErrorKind, Graphic};
use std::ops::Range;
use std::path::PathBuf;

/// Why a block could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub kind: ErrorKind,
    pub reason: String,
    /// What to show instead: the raw image reference, or the diagram source.
    pub fallback: String,
}

impl Failure {
    pub fn new(kind: ErrorKind, reason: impl Into<String>, fallback: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
            fallback: fallback.into(),
        }
    }
}

/// Resolution state of an asynchronous block. Moves `Pending -> Ready` or
/// `Pending -> Failed` once and never back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockStatus<T> {
    Pending,
    Ready(T),
    Failed(Failure),
}

impl<T> BlockStatus<T> {
    pub fn is_pending(&self) -> bool {
        matches!(self, BlockStatus::Pending)
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, BlockStatus::Ready(_))
    }

    /// Applies a resolution. Returns false, leaving the status untouched, if
    /// the block had already settled.
    pub fn settle(&mut self, result: Result<T, Failure>) -> bool {
        if !self.is_pending() {
            return false;
        }
        *self = match result {
            Ok(value) => BlockStatus::Ready(value),
            Err(failure) => BlockStatus::Failed(failure),
        };
        true
    }
}

/// A self-describing `data:` URI, or a remote URL the host displays directly.
pub type EncodedImage = String;

/// An image that stays inside its text block: a table cell, a list item, a
/// link, or a paragraph with other content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    /// Byte range of the image syntax within the block's `markdown`.
    pub span: Range<usize>,
    pub reference: String,
    pub alt: String,
    pub status: BlockStatus<EncodedImage>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderBlock {
    /// A run of source markdown passed through untouched. Link reference
    /// definitions found elsewhere in the document are appended after it.
    Text {
        markdown: String,
        images: Vec<InlineImage>,
    },
    CodeBlock {
        language: Option<String>,
        raw: String,
    },
    DiagramBlock {
        source: String,
        status: BlockStatus<Graphic>,
    },
    ImageBlock {
        reference: String,
        alt: String,
        /// File whose location relative references resolve against.
        context_path: Option<PathBuf>,
        status: BlockStatus<EncodedImage>,
    },
}

impl RenderBlock {
    pub fn is_pending(&self) -> bool {
        match self {
            RenderBlock::DiagramBlock { status, .. } => status.is_pending(),
            RenderBlock::ImageBlock { status, .. } => status.is_pending(),
            RenderBlock::Text { images, .. } => images.iter().any(|i| i.status.is_pending()),
            RenderBlock::CodeBlock { .. } => false,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            RenderBlock::Text { .. } => "text",
            RenderBlock::CodeBlock { .. } => "code",
            RenderBlock::DiagramBlock { .. } => "diagram",
            RenderBlock::ImageBlock { .. } => "image",
        }
    }
}
