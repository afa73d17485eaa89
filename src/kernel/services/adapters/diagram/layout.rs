//! Layered placement: longest-path ranks along the flow axis, first
//! appearance order across it.

use super::parse::{Flowchart, Shape};
use unicode_width::UnicodeWidthStr;

pub(crate) const MARGIN: f32 = 16.0;
const RANK_GAP: f32 = 56.0;
const NODE_GAP: f32 = 32.0;
const CHAR_WIDTH: f32 = 8.0;
const LINE_HEIGHT: f32 = 18.0;
const PADDING_X: f32 = 28.0;
const PADDING_Y: f32 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Placed {
    /// Center point.
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Placed {
    /// Where the segment from this node's center toward `(tx, ty)` leaves
    /// its bounding box.
    pub(crate) fn boundary_toward(&self, tx: f32, ty: f32) -> (f32, f32) {
        let dx = tx - self.x;
        let dy = ty - self.y;
        if dx == 0.0 && dy == 0.0 {
            return (self.x, self.y);
        }
        let sx = if dx != 0.0 { (self.w / 2.0) / dx.abs() } else { f32::INFINITY };
        let sy = if dy != 0.0 { (self.h / 2.0) / dy.abs() } else { f32::INFINITY };
        let t = sx.min(sy);
        (self.x + dx * t, self.y + dy * t)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Layout {
    pub nodes: Vec<Placed>,
    pub width: f32,
    pub height: f32,
}

fn node_size(lines: &[String], shape: Shape) -> (f32, f32) {
    let widest = lines
        .iter()
        .map(|l| UnicodeWidthStr::width(l.as_str()))
        .max()
        .unwrap_or(0) as f32;
    let w = (widest * CHAR_WIDTH + PADDING_X).max(60.0);
    let h = lines.len().max(1) as f32 * LINE_HEIGHT + PADDING_Y;
    match shape {
        Shape::Rect | Shape::Round => (w, h),
        Shape::Diamond => (w * 1.3, h * 1.6),
        Shape::Circle => {
            let d = w.max(h);
            (d, d)
        }
    }
}

fn ranks(chart: &Flowchart) -> Vec<usize> {
    let n = chart.nodes.len();
    let mut rank = vec![0usize; n];
    // Bounded relaxation; cycles stop growing at n - 1.
    for _ in 0..n {
        let mut changed = false;
        for edge in &chart.edges {
            if edge.from == edge.to {
                continue;
            }
            let candidate = (rank[edge.from] + 1).min(n.saturating_sub(1));
            if rank[edge.to] < candidate {
                rank[edge.to] = candidate;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
    rank
}

pub(crate) fn layout(chart: &Flowchart, labels: &[Vec<String>]) -> Layout {
    let horizontal = chart.direction.is_horizontal();
    let sizes: Vec<(f32, f32)> = chart
        .nodes
        .iter()
        .zip(labels)
        .map(|(node, lines)| node_size(lines, node.shape))
        .collect();
    // (main, cross) extents: main runs along the flow.
    let extent = |i: usize| {
        let (w, h) = sizes[i];
        if horizontal { (w, h) } else { (h, w) }
    };

    let rank = ranks(chart);
    let rank_count = rank.iter().copied().max().map(|r| r + 1).unwrap_or(0);
    let mut members: Vec<Vec<usize>> = vec![Vec::new(); rank_count];
    for (idx, r) in rank.iter().enumerate() {
        members[*r].push(idx);
    }

    let rank_main: Vec<f32> = members
        .iter()
        .map(|m| m.iter().map(|&i| extent(i).0).fold(0.0, f32::max))
        .collect();
    let rank_cross: Vec<f32> = members
        .iter()
        .map(|m| {
            let total: f32 = m.iter().map(|&i| extent(i).1).sum();
            total + NODE_GAP * m.len().saturating_sub(1) as f32
        })
        .collect();
    let total_cross = rank_cross.iter().copied().fold(0.0, f32::max);
    let total_main =
        rank_main.iter().sum::<f32>() + RANK_GAP * rank_count.saturating_sub(1) as f32;

    let mut centers = vec![(0.0f32, 0.0f32); chart.nodes.len()];
    let mut main_cursor = 0.0;
    for (r, m) in members.iter().enumerate() {
        let main_center = main_cursor + rank_main[r] / 2.0;
        let mut cross_cursor = (total_cross - rank_cross[r]) / 2.0;
        for &i in m {
            let (_, cross) = extent(i);
            centers[i] = (main_center, cross_cursor + cross / 2.0);
            cross_cursor += cross + NODE_GAP;
        }
        main_cursor += rank_main[r] + RANK_GAP;
    }

    let reversed = chart.direction.is_reversed();
    let nodes = centers
        .iter()
        .zip(&sizes)
        .map(|(&(main, cross), &(w, h))| {
            let main = if reversed { total_main - main } else { main };
            let (x, y) = if horizontal { (main, cross) } else { (cross, main) };
            Placed {
                x: x + MARGIN,
                y: y + MARGIN,
                w,
                h,
            }
        })
        .collect();

    let (width, height) = if horizontal {
        (total_main, total_cross)
    } else {
        (total_cross, total_main)
    };
    Layout {
        nodes,
        width: width + MARGIN * 2.0,
        height: height + MARGIN * 2.0,
    }
}
