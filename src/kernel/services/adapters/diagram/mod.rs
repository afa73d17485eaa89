//! Flowchart diagram compiler.
//!
//! Compiles the flowchart subset of the mermaid grammar into standalone SVG.
//! Output is deterministic: identical source and configuration always yield
//! identical markup.

mod layout;
mod parse;
mod svg;

use crate::kernel::services::ports::settings::{DiagramSettings, DiagramTheme, SecurityLevel};
use crate::kernel::services::ports::{DiagramCompiler, DiagramError, Graphic};

#[derive(Debug, Clone, Copy, Default)]
pub struct FlowchartCompiler {
    theme: DiagramTheme,
    security: SecurityLevel,
}

impl FlowchartCompiler {
    pub fn new(theme: DiagramTheme, security: SecurityLevel) -> Self {
        Self { theme, security }
    }

    pub fn from_settings(settings: &DiagramSettings) -> Self {
        Self::new(settings.theme, settings.security)
    }
}

impl DiagramCompiler for FlowchartCompiler {
    fn compile(&self, source: &str) -> Result<Graphic, DiagramError> {
        let chart = parse::parse_flowchart(source)?;
        let labels: Vec<Vec<String>> = chart
            .nodes
            .iter()
            .map(|n| svg::label_lines(&n.label, self.security))
            .collect();
        let layout = layout::layout(&chart, &labels);
        let markup = svg::render(&chart, &labels, &layout, self.theme, self.security);
        tracing::trace!(
            nodes = chart.nodes.len(),
            edges = chart.edges.len(),
            "flowchart compiled"
        );
        Ok(Graphic {
            markup,
            width: layout.width.ceil() as u32,
            height: layout.height.ceil() as u32,
        })
    }
}

#[cfg(test)]
#[path = "../../../../../tests/unit/kernel/services/adapters/diagram.rs"]
mod tests;
