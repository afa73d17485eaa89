//! Data models: plain state with no IO.

pub mod render_block;
pub mod workspace_tree;

pub use render_block::{BlockStatus, EncodedImage, Failure, InlineImage, RenderBlock};
pub use workspace_tree::{
    compare_entries, should_ignore, sort_entries, ExpandStep, LoadState, NodeId, NodeKind,
    TreeError, TreeRow, WorkspaceNode, WorkspaceTree,
};
