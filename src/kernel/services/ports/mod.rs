//! Service ports: traits + data contracts.

pub mod diagram;
pub mod file;
pub mod runtime;
pub mod settings;

pub use diagram::{DiagramCompiler, DiagramError, Graphic};
pub use file::{
    DirEntry, ErrorKind, FileError, FilePicker, FileProvider, NoPicker, Result as FileResult,
};
pub use runtime::{AsyncExecutor, BoxFuture};
pub use settings::{
    AssetSettings, ConfigStore, DiagramSettings, DiagramTheme, PreviewSettings, SecurityLevel,
    Settings, SettingsError,
};
