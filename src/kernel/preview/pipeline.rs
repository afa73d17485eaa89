//! Markdown to render blocks.
//!
//! [`ContentPipeline::render`] classifies the document synchronously and
//! returns a [`RenderPass`] whose diagram and local-image blocks start out
//! `Pending`. Their resolutions arrive later as [`PreviewMessage`]s tagged
//! with the pass id; messages for any other pass are dropped on apply.
//!
//! Only fenced code and a paragraph consisting of a single image become
//! blocks of their own. Everything between them is one `Text` block holding
//! the source verbatim, with any images inside it resolved alongside.

use super::assets::AssetLoader;
use super::resolver::{resolve, Resolved};
use crate::kernel::services::ports::{AsyncExecutor, DiagramCompiler, ErrorKind, Graphic};
use crate::models::render_block::{BlockStatus, EncodedImage, Failure, InlineImage, RenderBlock};
use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Fenced code language reserved for diagrams.
pub const DIAGRAM_TAG: &str = "mermaid";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewMessage {
    DiagramResolved {
        pass: u64,
        index: usize,
        result: Result<Graphic, Failure>,
    },
    ImageResolved {
        pass: u64,
        index: usize,
        /// Position in the `Text` block's images; `None` for an `ImageBlock`.
        inline: Option<usize>,
        result: Result<EncodedImage, Failure>,
    },
}

impl PreviewMessage {
    pub fn pass(&self) -> u64 {
        match self {
            PreviewMessage::DiagramResolved { pass, .. }
            | PreviewMessage::ImageResolved { pass, .. } => *pass,
        }
    }
}

/// Blocks of one `render` call, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderPass {
    pub id: u64,
    pub blocks: Vec<RenderBlock>,
}

impl RenderPass {
    /// Applies a resolution. Returns false for messages from another pass,
    /// for indices that do not hold the matching block kind, and for blocks
    /// that already settled.
    pub fn apply(&mut self, message: PreviewMessage) -> bool {
        if message.pass() != self.id {
            tracing::trace!(pass = message.pass(), current = self.id, "stale preview message");
            return false;
        }
        match message {
            PreviewMessage::DiagramResolved { index, result, .. } => {
                match self.blocks.get_mut(index) {
                    Some(RenderBlock::DiagramBlock { status, .. }) => status.settle(result),
                    _ => false,
                }
            }
            PreviewMessage::ImageResolved {
                index,
                inline,
                result,
                ..
            } => match (self.blocks.get_mut(index), inline) {
                (Some(RenderBlock::ImageBlock { status, .. }), None) => status.settle(result),
                (Some(RenderBlock::Text { images, .. }), Some(slot)) => match images.get_mut(slot) {
                    Some(image) => image.status.settle(result),
                    None => false,
                },
                _ => false,
            },
        }
    }

    pub fn pending(&self) -> usize {
        self.blocks.iter().filter(|b| b.is_pending()).count()
    }

    pub fn is_settled(&self) -> bool {
        self.pending() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text {
        markdown: String,
        images: Vec<ImageSpan>,
    },
    Code {
        language: Option<String>,
        raw: String,
    },
    Image {
        reference: String,
        alt: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ImageSpan {
    range: Range<usize>,
    reference: String,
    alt: String,
}

fn markdown_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_FOOTNOTES);
    options
}

fn fence_language(kind: &CodeBlockKind<'_>) -> Option<String> {
    match kind {
        CodeBlockKind::Fenced(info) => info.split_whitespace().next().map(str::to_string),
        CodeBlockKind::Indented => None,
    }
}

fn within(span: &Range<usize>, run: &Range<usize>) -> bool {
    span.start >= run.start && span.end <= run.end
}

/// Whether `run` holds anything besides whitespace and reference definitions.
fn has_content(markdown: &str, run: &Range<usize>, definitions: &[Range<usize>]) -> bool {
    let mut cursor = run.start;
    for def in definitions.iter().filter(|d| within(d, run)) {
        if def.start > cursor && !markdown[cursor..def.start].trim().is_empty() {
            return true;
        }
        cursor = cursor.max(def.end);
    }
    cursor < run.end && !markdown[cursor..run.end].trim().is_empty()
}

/// Emits the source between two standalone blocks as one `Text` segment.
/// Definitions outside the run are appended so its reference links resolve.
fn push_run(
    out: &mut Vec<Segment>,
    markdown: &str,
    run: Range<usize>,
    images: &mut Vec<ImageSpan>,
    definitions: &[Range<usize>],
) {
    let images = std::mem::take(images);
    if !has_content(markdown, &run, definitions) {
        return;
    }
    let mut text = markdown[run.clone()].to_string();
    for def in definitions.iter().filter(|d| !within(d, &run)) {
        if !text.ends_with('\n') {
            text.push('\n');
        }
        text.push('\n');
        text.push_str(markdown[def.clone()].trim_end());
        text.push('\n');
    }
    let images = images
        .into_iter()
        .map(|span| ImageSpan {
            range: span.range.start - run.start..span.range.end - run.start,
            ..span
        })
        .collect();
    out.push(Segment::Text {
        markdown: text,
        images,
    });
}

/// A top-level paragraph made of exactly one image, and nothing else.
fn standalone_image(
    markdown: &str,
    block: &Range<usize>,
    images: &mut Vec<ImageSpan>,
) -> Option<Segment> {
    let [only] = images.as_slice() else {
        return None;
    };
    if markdown[block.clone()].trim() != markdown[only.range.clone()].trim() {
        return None;
    }
    let image = images.pop()?;
    Some(Segment::Image {
        reference: image.reference,
        alt: image.alt,
    })
}

/// Segments in source order. Fenced code is only classified at the top
/// level; code nested in lists or quotes stays part of its text run.
fn classify(markdown: &str) -> Vec<Segment> {
    let parser = Parser::new_ext(markdown, markdown_options());
    let mut definitions: Vec<Range<usize>> = parser
        .reference_definitions()
        .iter()
        .map(|(_, def)| def.span.clone())
        .collect();
    definitions.sort_by_key(|span| span.start);

    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut block_start = 0usize;
    let mut run_start = 0usize;
    let mut code: Option<(Option<String>, String)> = None;
    let mut image: Option<ImageSpan> = None;
    // Images written inside another image's alt text.
    let mut nested = 0usize;
    let mut block_images = Vec::new();
    let mut run_images = Vec::new();

    for (event, range) in parser.into_offset_iter() {
        match event {
            Event::Start(tag) => {
                if depth == 0 {
                    block_start = range.start;
                    if let Tag::CodeBlock(kind) = &tag {
                        code = Some((fence_language(kind), String::new()));
                    }
                }
                if let Tag::Image { dest_url, .. } = &tag {
                    if image.is_some() {
                        nested += 1;
                    } else {
                        image = Some(ImageSpan {
                            range: range.clone(),
                            reference: dest_url.to_string(),
                            alt: String::new(),
                        });
                    }
                }
                depth += 1;
            }
            Event::End(end) => {
                depth = depth.saturating_sub(1);
                if end == TagEnd::Image {
                    if nested > 0 {
                        nested -= 1;
                    } else if let Some(span) = image.take() {
                        block_images.push(span);
                    }
                }
                if depth == 0 {
                    let block = block_start..range.end;
                    let standalone = match code.take() {
                        Some((language, raw)) => Some(Segment::Code { language, raw }),
                        None => standalone_image(markdown, &block, &mut block_images),
                    };
                    match standalone {
                        Some(segment) => {
                            push_run(
                                &mut out,
                                markdown,
                                run_start..block.start,
                                &mut run_images,
                                &definitions,
                            );
                            out.push(segment);
                            run_start = block.end;
                        }
                        None => run_images.append(&mut block_images),
                    }
                }
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some(span) = image.as_mut() {
                    span.alt.push_str(&text);
                } else if let Some((_, raw)) = code.as_mut() {
                    raw.push_str(&text);
                }
            }
            _ => {}
        }
    }
    push_run(
        &mut out,
        markdown,
        run_start..markdown.len(),
        &mut run_images,
        &definitions,
    );
    out
}

pub struct ContentPipeline {
    assets: Arc<AssetLoader>,
    compiler: Arc<dyn DiagramCompiler>,
    executor: Arc<dyn AsyncExecutor>,
    tx: Sender<PreviewMessage>,
    passes: AtomicU64,
}

impl ContentPipeline {
    pub fn new(
        assets: Arc<AssetLoader>,
        compiler: Arc<dyn DiagramCompiler>,
        executor: Arc<dyn AsyncExecutor>,
    ) -> (Self, Receiver<PreviewMessage>) {
        let (tx, rx) = mpsc::channel();
        let pipeline = Self {
            assets,
            compiler,
            executor,
            tx,
            passes: AtomicU64::new(0),
        };
        (pipeline, rx)
    }

    pub fn assets(&self) -> &Arc<AssetLoader> {
        &self.assets
    }

    /// Classifies `markdown` and starts every asynchronous resolution. The
    /// returned pass is usable immediately; it never blocks on IO.
    pub fn render(&self, markdown: &str, context: Option<&Path>) -> RenderPass {
        let pass = self.passes.fetch_add(1, Ordering::Relaxed) + 1;
        let blocks: Vec<RenderBlock> = classify(markdown)
            .into_iter()
            .enumerate()
            .map(|(index, segment)| match segment {
                Segment::Text { markdown, images } => {
                    let images = images
                        .into_iter()
                        .enumerate()
                        .map(|(slot, span)| InlineImage {
                            status: self.image_status(
                                pass,
                                index,
                                Some(slot),
                                &span.reference,
                                context,
                            ),
                            span: span.range,
                            reference: span.reference,
                            alt: span.alt,
                        })
                        .collect();
                    RenderBlock::Text { markdown, images }
                }
                Segment::Code { language, raw } if language.as_deref() == Some(DIAGRAM_TAG) => {
                    let source = raw.trim_end_matches('\n').to_string();
                    self.spawn_compile(pass, index, source.clone());
                    RenderBlock::DiagramBlock {
                        source,
                        status: BlockStatus::Pending,
                    }
                }
                Segment::Code { language, raw } => RenderBlock::CodeBlock { language, raw },
                Segment::Image { reference, alt } => RenderBlock::ImageBlock {
                    status: self.image_status(pass, index, None, &reference, context),
                    reference,
                    alt,
                    context_path: context.map(Path::to_path_buf),
                },
            })
            .collect();

        tracing::debug!(
            pass,
            blocks = blocks.len(),
            context = ?context,
            "render pass started"
        );
        RenderPass { id: pass, blocks }
    }

    fn image_status(
        &self,
        pass: u64,
        index: usize,
        inline: Option<usize>,
        reference: &str,
        context: Option<&Path>,
    ) -> BlockStatus<EncodedImage> {
        match resolve(reference, context) {
            Resolved::Url(url) => BlockStatus::Ready(url),
            Resolved::Unresolved(raw) => BlockStatus::Failed(Failure::new(
                ErrorKind::Unresolved,
                "relative image reference without a file to resolve it against",
                raw,
            )),
            Resolved::Path(path) => {
                self.spawn_load(pass, index, inline, path, reference.to_string());
                BlockStatus::Pending
            }
        }
    }

    fn spawn_load(
        &self,
        pass: u64,
        index: usize,
        inline: Option<usize>,
        path: PathBuf,
        reference: String,
    ) {
        let assets = Arc::clone(&self.assets);
        let tx = self.tx.clone();
        self.executor.spawn_task(async move {
            let result = assets.load_or_fallback(&path, &reference).await;
            let _ = tx.send(PreviewMessage::ImageResolved {
                pass,
                index,
                inline,
                result,
            });
        });
    }

    fn spawn_compile(&self, pass: u64, index: usize, source: String) {
        let compiler = Arc::clone(&self.compiler);
        let tx = self.tx.clone();
        self.executor.spawn_task(async move {
            let input = source.clone();
            let result = match tokio::task::spawn_blocking(move || compiler.compile(&input)).await {
                Ok(Ok(graphic)) => Ok(graphic),
                Ok(Err(err)) => {
                    tracing::debug!(pass, index, error = %err, "diagram rejected");
                    Err(Failure::new(ErrorKind::CompileError, err.to_string(), source))
                }
                Err(err) => {
                    tracing::warn!(pass, index, error = %err, "diagram compiler task failed");
                    Err(Failure::new(
                        ErrorKind::CompileError,
                        format!("diagram compiler crashed: {err}"),
                        source,
                    ))
                }
            };
            let _ = tx.send(PreviewMessage::DiagramResolved { pass, index, result });
        });
    }
}

/// Holds the current pass and feeds it resolutions. Optionally debounces
/// re-renders while the text is changing.
pub struct Preview {
    pipeline: ContentPipeline,
    messages: Receiver<PreviewMessage>,
    current: Option<RenderPass>,
    last_input: Option<(String, Option<PathBuf>)>,
    scheduled: Option<(String, Option<PathBuf>, Instant)>,
    debounce: Duration,
}

impl Preview {
    pub fn new(
        pipeline: ContentPipeline,
        messages: Receiver<PreviewMessage>,
        debounce: Duration,
    ) -> Self {
        Self {
            pipeline,
            messages,
            current: None,
            last_input: None,
            scheduled: None,
            debounce,
        }
    }

    pub fn pipeline(&self) -> &ContentPipeline {
        &self.pipeline
    }

    pub fn current(&self) -> Option<&RenderPass> {
        self.current.as_ref()
    }

    pub fn set_debounce(&mut self, debounce: Duration) {
        self.debounce = debounce;
    }

    pub fn has_scheduled(&self) -> bool {
        self.scheduled.is_some()
    }

    /// Starts a pass unless `(text, path)` is what the current pass shows.
    /// Returns whether a new pass started.
    pub fn render_now(&mut self, text: &str, path: Option<&Path>) -> bool {
        self.scheduled = None;
        let unchanged = self.current.is_some()
            && self
                .last_input
                .as_ref()
                .is_some_and(|(t, p)| t == text && p.as_deref() == path);
        if unchanged {
            return false;
        }
        self.current = Some(self.pipeline.render(text, path));
        self.last_input = Some((text.to_string(), path.map(Path::to_path_buf)));
        true
    }

    /// Queues a render `debounce` after `now`, replacing anything queued.
    /// A zero debounce renders immediately.
    pub fn schedule(&mut self, text: &str, path: Option<&Path>, now: Instant) -> bool {
        if self.debounce.is_zero() {
            return self.render_now(text, path);
        }
        self.scheduled = Some((
            text.to_string(),
            path.map(Path::to_path_buf),
            now + self.debounce,
        ));
        false
    }

    /// Runs the queued render once its deadline has passed.
    pub fn tick(&mut self, now: Instant) -> bool {
        match &self.scheduled {
            Some((_, _, deadline)) if *deadline <= now => {}
            _ => return false,
        }
        match self.scheduled.take() {
            Some((text, path, _)) => self.render_now(&text, path.as_deref()),
            None => false,
        }
    }

    /// Forgets the shown input so the next render starts a fresh pass even
    /// for identical text. Used after the workspace changes.
    pub fn invalidate(&mut self) {
        self.last_input = None;
        self.current = None;
        self.scheduled = None;
    }

    /// Applies every resolution already delivered. Returns how many changed
    /// a block of the current pass.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(message) = self.messages.try_recv() {
            if self.apply(message) {
                applied += 1;
            }
        }
        applied
    }

    fn apply(&mut self, message: PreviewMessage) -> bool {
        match self.current.as_mut() {
            Some(pass) => pass.apply(message),
            None => false,
        }
    }

    /// Blocks until the current pass has settled or `timeout` elapses.
    pub fn wait_settled(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            self.pump();
            match &self.current {
                None => return true,
                Some(pass) if pass.is_settled() => return true,
                Some(_) => {}
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            match self.messages.recv_timeout(remaining) {
                Ok(message) => {
                    self.apply(message);
                }
                Err(RecvTimeoutError::Timeout) => return false,
                Err(RecvTimeoutError::Disconnected) => {
                    return self.current.as_ref().map_or(true, RenderPass::is_settled)
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "../../../tests/unit/kernel/preview/pipeline.rs"]
mod tests;
