//! Headless application core: workspace tree driver, preview pipeline and
//! the session that ties them together.

pub mod document;
pub mod preview;
pub mod services;
pub mod session;
pub mod workspace;

pub use document::{DocumentError, DocumentSession, OpenMode, WELCOME_TEXT};
pub use preview::{ContentPipeline, Preview, PreviewMessage, RenderPass};
pub use session::Session;
pub use workspace::{Workspace, WorkspaceError};
