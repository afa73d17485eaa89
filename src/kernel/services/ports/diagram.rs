//! Diagram compilation contract.

/// Compiled, directly embeddable graphic (SVG markup).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Graphic {
    pub markup: String,
    pub width: u32,
    pub height: u32,
}

/// Grammar error with a 1-based source position.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} (line {line}, col {col})")]
pub struct DiagramError {
    pub message: String,
    pub line: usize,
    pub col: usize,
}

impl DiagramError {
    pub fn new(message: impl Into<String>, line: usize, col: usize) -> Self {
        Self {
            message: message.into(),
            line,
            col,
        }
    }
}

/// Turns diagram source text into a graphic. Implementations must be a pure
/// function of `source`; no filesystem access.
pub trait DiagramCompiler: Send + Sync {
    fn compile(&self, source: &str) -> Result<Graphic, DiagramError>;
}
