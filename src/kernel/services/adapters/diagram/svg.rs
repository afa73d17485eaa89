use super::layout::{Layout, Placed};
use super::parse::{EdgeStyle, Flowchart, Shape};
use crate::kernel::services::ports::settings::{DiagramTheme, SecurityLevel};
use std::fmt::Write;

struct Palette {
    node_fill: &'static str,
    node_stroke: &'static str,
    text: &'static str,
    line: &'static str,
}

fn palette(theme: DiagramTheme) -> Palette {
    match theme {
        DiagramTheme::Default => Palette {
            node_fill: "#ECECFF",
            node_stroke: "#9370DB",
            text: "#333333",
            line: "#333333",
        },
        DiagramTheme::Dark => Palette {
            node_fill: "#1f2020",
            node_stroke: "#81B1DB",
            text: "#cccccc",
            line: "#d3d3d3",
        },
        DiagramTheme::Forest => Palette {
            node_fill: "#cde498",
            node_stroke: "#13540c",
            text: "#000000",
            line: "#008000",
        },
        DiagramTheme::Neutral => Palette {
            node_fill: "#eeeeee",
            node_stroke: "#999999",
            text: "#333333",
            line: "#666666",
        },
    }
}

pub(crate) fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Display lines of a label. Loose security honours `<br>` line breaks;
/// strict keeps the label on one line, tags and all.
pub(crate) fn label_lines(label: &str, security: SecurityLevel) -> Vec<String> {
    match security {
        SecurityLevel::Strict => vec![label.to_string()],
        SecurityLevel::Loose => {
            let mut lines = Vec::new();
            let mut rest = label;
            loop {
                let lower = rest.to_ascii_lowercase();
                let found = ["<br/>", "<br />", "<br>"]
                    .iter()
                    .filter_map(|tag| lower.find(tag).map(|i| (i, tag.len())))
                    .min();
                match found {
                    Some((idx, len)) => {
                        lines.push(rest[..idx].trim().to_string());
                        rest = &rest[idx + len..];
                    }
                    None => {
                        lines.push(rest.trim().to_string());
                        return lines;
                    }
                }
            }
        }
    }
}

fn text_block(out: &mut String, x: f32, y: f32, lines: &[String], class: &str) {
    let line_height = 18.0;
    let first = y - (lines.len().saturating_sub(1) as f32 * line_height) / 2.0;
    let _ = write!(
        out,
        r#"<text class="{class}" x="{x:.1}" y="{first:.1}" text-anchor="middle" dominant-baseline="central">"#
    );
    for (i, line) in lines.iter().enumerate() {
        let dy = if i == 0 { 0.0 } else { line_height };
        let _ = write!(out, r#"<tspan x="{x:.1}" dy="{dy:.1}">{}</tspan>"#, escape(line));
    }
    out.push_str("</text>");
}

fn shape(out: &mut String, node: &Placed, kind: Shape) {
    let (x, y, w, h) = (node.x, node.y, node.w, node.h);
    let (left, top) = (x - w / 2.0, y - h / 2.0);
    let _ = match kind {
        Shape::Rect => write!(
            out,
            r#"<rect class="node" x="{left:.1}" y="{top:.1}" width="{w:.1}" height="{h:.1}"/>"#
        ),
        Shape::Round => write!(
            out,
            r#"<rect class="node" x="{left:.1}" y="{top:.1}" width="{w:.1}" height="{h:.1}" rx="{:.1}"/>"#,
            h / 2.0
        ),
        Shape::Circle => write!(
            out,
            r#"<circle class="node" cx="{x:.1}" cy="{y:.1}" r="{:.1}"/>"#,
            w / 2.0
        ),
        Shape::Diamond => write!(
            out,
            r#"<polygon class="node" points="{x:.1},{top:.1} {:.1},{y:.1} {x:.1},{:.1} {left:.1},{y:.1}"/>"#,
            x + w / 2.0,
            y + h / 2.0
        ),
    };
}

pub(crate) fn render(
    chart: &Flowchart,
    labels: &[Vec<String>],
    layout: &Layout,
    theme: DiagramTheme,
    security: SecurityLevel,
) -> String {
    let p = palette(theme);
    let (width, height) = (layout.width.ceil(), layout.height.ceil());
    let mut out = String::new();
    let _ = write!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" class="flowchart" width="{width}" height="{height}" viewBox="0 0 {width} {height}">"#
    );
    let _ = write!(
        out,
        "<style>.node{{fill:{};stroke:{};stroke-width:1.5}}.label,.edge-label{{fill:{};font-family:sans-serif;font-size:14px}}.edge{{stroke:{};stroke-width:1.5;fill:none}}.edge.thick{{stroke-width:3.5}}.edge.dotted{{stroke-dasharray:3 3}}</style>",
        p.node_fill, p.node_stroke, p.text, p.line
    );
    let _ = write!(
        out,
        r#"<defs><marker id="arrowhead" viewBox="0 0 10 10" refX="9" refY="5" markerWidth="8" markerHeight="8" orient="auto"><path d="M0,0 L10,5 L0,10 z" fill="{}"/></marker></defs>"#,
        p.line
    );

    for edge in &chart.edges {
        let from = &layout.nodes[edge.from];
        let to = &layout.nodes[edge.to];
        let class = match edge.style {
            EdgeStyle::Thick => "edge thick",
            EdgeStyle::Dotted => "edge dotted",
            EdgeStyle::Arrow | EdgeStyle::Open => "edge",
        };
        let marker = if edge.style == EdgeStyle::Open {
            ""
        } else {
            r#" marker-end="url(#arrowhead)""#
        };
        let (mx, my) = if edge.from == edge.to {
            let (rx, ry) = (from.x + from.w / 2.0, from.y);
            let _ = write!(
                out,
                r#"<path class="{class}" d="M{rx:.1},{:.1} C{:.1},{:.1} {:.1},{:.1} {rx:.1},{:.1}"{marker}/>"#,
                ry - 6.0,
                rx + 30.0,
                ry - 24.0,
                rx + 30.0,
                ry + 24.0,
                ry + 6.0
            );
            (rx + 30.0, ry)
        } else {
            let (x1, y1) = from.boundary_toward(to.x, to.y);
            let (x2, y2) = to.boundary_toward(from.x, from.y);
            let _ = write!(
                out,
                r#"<line class="{class}" x1="{x1:.1}" y1="{y1:.1}" x2="{x2:.1}" y2="{y2:.1}"{marker}/>"#
            );
            ((x1 + x2) / 2.0, (y1 + y2) / 2.0)
        };
        if let Some(label) = &edge.label {
            text_block(&mut out, mx, my, &label_lines(label, security), "edge-label");
        }
    }

    for ((node, placed), lines) in chart.nodes.iter().zip(&layout.nodes).zip(labels) {
        let _ = write!(out, r#"<g id="node-{}">"#, escape(&node.id));
        shape(&mut out, placed, node.shape);
        text_block(&mut out, placed.x, placed.y, lines, "label");
        out.push_str("</g>");
    }

    out.push_str("</svg>");
    out
}
