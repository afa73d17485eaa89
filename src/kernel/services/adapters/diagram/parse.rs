//! Flowchart grammar: header, node shapes, edge chains.

use crate::kernel::services::ports::DiagramError;
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Direction {
    TopDown,
    BottomUp,
    LeftRight,
    RightLeft,
}

impl Direction {
    fn parse(word: &str) -> Option<Self> {
        match word {
            "TD" | "TB" => Some(Direction::TopDown),
            "BT" => Some(Direction::BottomUp),
            "LR" => Some(Direction::LeftRight),
            "RL" => Some(Direction::RightLeft),
            _ => None,
        }
    }

    pub(crate) fn is_horizontal(self) -> bool {
        matches!(self, Direction::LeftRight | Direction::RightLeft)
    }

    pub(crate) fn is_reversed(self) -> bool {
        matches!(self, Direction::BottomUp | Direction::RightLeft)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Shape {
    Rect,
    Round,
    Circle,
    Diamond,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EdgeStyle {
    Arrow,
    Open,
    Dotted,
    Thick,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Node {
    pub id: String,
    pub label: String,
    pub shape: Shape,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Edge {
    pub from: usize,
    pub to: usize,
    pub style: EdgeStyle,
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Flowchart {
    pub direction: Direction,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

/// Statements that are valid grammar but carry nothing we draw.
const IGNORED_KEYWORDS: &[&str] = &[
    "style",
    "classDef",
    "class",
    "linkStyle",
    "click",
    "subgraph",
    "end",
    "direction",
];

const EDGE_OPS: &[(&str, EdgeStyle)] = &[
    ("-.->", EdgeStyle::Dotted),
    ("-->", EdgeStyle::Arrow),
    ("---", EdgeStyle::Open),
    ("==>", EdgeStyle::Thick),
];

pub(crate) fn parse_flowchart(source: &str) -> Result<Flowchart, DiagramError> {
    let mut lines = source
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line))
        .filter(|(_, line)| {
            let trimmed = line.trim();
            !trimmed.is_empty() && !trimmed.starts_with("%%")
        });

    let Some((header_line, header)) = lines.next() else {
        return Err(DiagramError::new("empty diagram", 1, 1));
    };
    let direction = parse_header(header_line, header)?;

    let mut builder = Builder::default();
    for (line_no, line) in lines {
        let first_word = line.split_whitespace().next().unwrap_or_default();
        if IGNORED_KEYWORDS.contains(&first_word) {
            continue;
        }
        for (offset, statement) in split_statements(line) {
            if statement.trim().is_empty() {
                continue;
            }
            let mut scanner = Scanner {
                text: statement,
                pos: 0,
                line: line_no,
                col_base: offset,
            };
            builder.statement(&mut scanner)?;
        }
    }

    Ok(Flowchart {
        direction,
        nodes: builder.nodes,
        edges: builder.edges,
    })
}

fn parse_header(line_no: usize, line: &str) -> Result<Direction, DiagramError> {
    let indent = line.len() - line.trim_start().len();
    let body = line.trim().trim_end_matches(';');
    let mut words = body.split_whitespace();
    let keyword = words.next().unwrap_or_default();
    if keyword != "graph" && keyword != "flowchart" {
        return Err(DiagramError::new(
            format!("unknown diagram type `{keyword}`"),
            line_no,
            indent + 1,
        ));
    }
    match words.next() {
        None => Ok(Direction::TopDown),
        Some(word) => Direction::parse(word).ok_or_else(|| {
            let col = line.find(word).map(|i| i + 1).unwrap_or(1);
            DiagramError::new(format!("unknown direction `{word}`"), line_no, col)
        }),
    }
}

/// Splits on `;` outside of node labels, keeping each piece's byte offset.
fn split_statements(line: &str) -> Vec<(usize, &str)> {
    let mut out = Vec::new();
    let mut depth = 0i32;
    let mut in_quote = false;
    let mut in_pipe = false;
    let mut start = 0;
    for (idx, ch) in line.char_indices() {
        match ch {
            '"' => in_quote = !in_quote,
            _ if in_quote => {}
            '|' if depth <= 0 => in_pipe = !in_pipe,
            '[' | '(' | '{' => depth += 1,
            ']' | ')' | '}' => depth -= 1,
            ';' if depth <= 0 && !in_pipe => {
                out.push((start, &line[start..idx]));
                start = idx + 1;
            }
            _ => {}
        }
    }
    out.push((start, &line[start..]));
    out
}

struct Scanner<'a> {
    text: &'a str,
    pos: usize,
    line: usize,
    col_base: usize,
}

impl<'a> Scanner<'a> {
    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn skip_ws(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn at_end(&self) -> bool {
        self.rest().trim().is_empty()
    }

    fn eat(&mut self, token: &str) -> bool {
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn error(&self, message: impl Into<String>) -> DiagramError {
        DiagramError::new(message, self.line, self.col_base + self.pos + 1)
    }

    fn ident(&mut self) -> Option<&'a str> {
        let rest = self.rest();
        let len = rest
            .char_indices()
            .find(|(_, c)| !(c.is_alphanumeric() || *c == '_'))
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        if len == 0 {
            return None;
        }
        let start = self.pos;
        self.pos += len;
        Some(&self.text[start..self.pos])
    }

    /// Reads up to `close`, returning the unquoted label.
    fn label_until(&mut self, close: &str) -> Result<String, DiagramError> {
        let Some(end) = self.rest().find(close) else {
            return Err(self.error(format!("unterminated label, expected `{close}`")));
        };
        let raw = &self.rest()[..end];
        self.pos += end + close.len();
        let trimmed = raw.trim();
        let unquoted = trimmed
            .strip_prefix('"')
            .and_then(|s| s.strip_suffix('"'))
            .unwrap_or(trimmed);
        Ok(unquoted.to_string())
    }
}

#[derive(Default)]
struct Builder {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    index: FxHashMap<String, usize>,
}

impl Builder {
    fn statement(&mut self, s: &mut Scanner<'_>) -> Result<(), DiagramError> {
        s.skip_ws();
        let mut prev = self.node_ref(s)?;
        loop {
            s.skip_ws();
            if s.at_end() {
                return Ok(());
            }
            let Some(style) = EDGE_OPS
                .iter()
                .find(|(op, _)| s.eat(op))
                .map(|(_, style)| *style)
            else {
                return Err(s.error("expected edge operator"));
            };
            s.skip_ws();
            let label = if s.eat("|") {
                Some(s.label_until("|")?)
            } else {
                None
            };
            s.skip_ws();
            if s.at_end() {
                return Err(s.error("edge is missing its target node"));
            }
            let next = self.node_ref(s)?;
            self.edges.push(Edge {
                from: prev,
                to: next,
                style,
                label: label.filter(|l| !l.is_empty()),
            });
            prev = next;
        }
    }

    fn node_ref(&mut self, s: &mut Scanner<'_>) -> Result<usize, DiagramError> {
        let Some(id) = s.ident().map(str::to_string) else {
            return Err(s.error("expected node id"));
        };
        let shaped = if s.eat("((") {
            Some((s.label_until("))")?, Shape::Circle))
        } else if s.eat("[") {
            Some((s.label_until("]")?, Shape::Rect))
        } else if s.eat("(") {
            Some((s.label_until(")")?, Shape::Round))
        } else if s.eat("{") {
            Some((s.label_until("}")?, Shape::Diamond))
        } else {
            None
        };

        let idx = match self.index.get(&id) {
            Some(&idx) => idx,
            None => {
                let idx = self.nodes.len();
                self.nodes.push(Node {
                    id: id.clone(),
                    label: id.clone(),
                    shape: Shape::Rect,
                });
                self.index.insert(id, idx);
                idx
            }
        };
        if let Some((label, shape)) = shaped {
            let node = &mut self.nodes[idx];
            node.label = label;
            node.shape = shape;
        }
        Ok(idx)
    }
}
