//! Service adapters: OS/runtime specific implementations (IO/async).

pub mod diagram;
pub mod file;
pub mod paths;
pub mod runtime;
pub mod settings;

pub use diagram::FlowchartCompiler;
pub use file::LocalFileProvider;
pub use paths::{ensure_log_dir, get_log_dir, get_settings_path};
pub use runtime::{AsyncRuntime, TokioExecutor};
pub use settings::{JsonConfigStore, MemoryConfigStore};
