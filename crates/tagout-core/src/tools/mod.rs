//! Drawing tools and the uncommitted drawing session.

use crate::annotation::MIN_POINTS;
use crate::geometry::{far_enough, flatten_strokes};
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Default spacing below which free-draw points are dropped.
pub const DEFAULT_MIN_SPACING: f64 = 3.0;

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    #[default]
    Select,
    FreeDraw,
    LineDraw,
    Pan,
}

impl ToolKind {
    /// Tools that accumulate geometry.
    pub fn is_drawing(self) -> bool {
        matches!(self, ToolKind::FreeDraw | ToolKind::LineDraw)
    }
}

/// Pointer input accumulated into a shape that has not been saved yet.
///
/// Free-draw collects any number of strokes which are flattened into one
/// point run on commit. Line-draw collects clicked vertices plus a preview
/// point that follows the pointer and is never persisted.
#[derive(Debug, Clone)]
pub struct DrawingSession {
    tool: ToolKind,
    /// Finished free-draw strokes, each with at least two points.
    strokes: Vec<Vec<Point>>,
    /// Stroke under the pressed pointer.
    current_stroke: Option<Vec<Point>>,
    /// Clicked line-draw vertices.
    vertices: Vec<Point>,
    /// Live pointer position while line-drawing.
    preview: Option<Point>,
    min_spacing: f64,
}

impl Default for DrawingSession {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_SPACING)
    }
}

impl DrawingSession {
    pub fn new(min_spacing: f64) -> Self {
        Self {
            tool: ToolKind::default(),
            strokes: Vec::new(),
            current_stroke: None,
            vertices: Vec::new(),
            preview: None,
            min_spacing,
        }
    }

    pub fn tool(&self) -> ToolKind {
        self.tool
    }

    /// Switch tools. Anything accumulated so far is discarded.
    pub fn set_tool(&mut self, tool: ToolKind) {
        if !self.is_empty() {
            log::debug!("tool switch {:?} -> {:?} discards pending drawing", self.tool, tool);
        }
        self.cancel();
        self.tool = tool;
    }

    /// Start a free-draw stroke.
    pub fn begin_stroke(&mut self, point: Point) {
        if self.tool != ToolKind::FreeDraw {
            return;
        }
        // A release we never saw; keep what was drawn.
        if self.current_stroke.is_some() {
            self.end_stroke();
        }
        self.current_stroke = Some(vec![point]);
    }

    /// Extend the open stroke if `point` is far enough from its last point.
    pub fn extend_stroke(&mut self, point: Point) -> bool {
        let spacing = self.min_spacing;
        let Some(stroke) = self.current_stroke.as_mut() else {
            return false;
        };
        match stroke.last() {
            Some(&last) if !far_enough(last, point, spacing) => false,
            _ => {
                stroke.push(point);
                true
            }
        }
    }

    /// Close the open stroke. Strokes shorter than two points are dropped.
    /// Returns whether the stroke was kept.
    pub fn end_stroke(&mut self) -> bool {
        match self.current_stroke.take() {
            Some(stroke) if stroke.len() >= MIN_POINTS => {
                self.strokes.push(stroke);
                true
            }
            _ => false,
        }
    }

    /// Append a line-draw vertex. A click on top of the previous vertex is ignored.
    pub fn add_vertex(&mut self, point: Point) -> bool {
        if self.tool != ToolKind::LineDraw {
            return false;
        }
        if let Some(&last) = self.vertices.last() {
            if !far_enough(last, point, self.min_spacing) {
                return false;
            }
        }
        self.vertices.push(point);
        true
    }

    /// Remove the last line-draw vertex.
    pub fn undo_vertex(&mut self) -> bool {
        self.tool == ToolKind::LineDraw && self.vertices.pop().is_some()
    }

    /// Track the pointer for the line-draw rubber band.
    pub fn set_preview(&mut self, point: Option<Point>) {
        if self.tool == ToolKind::LineDraw {
            self.preview = point;
        }
    }

    pub fn strokes(&self) -> &[Vec<Point>] {
        &self.strokes
    }

    pub fn current_stroke(&self) -> Option<&[Point]> {
        self.current_stroke.as_deref()
    }

    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    pub fn preview(&self) -> Option<Point> {
        self.preview
    }

    /// The point run a commit would persist, in draw order.
    pub fn pending_points(&self) -> Vec<Point> {
        match self.tool {
            ToolKind::FreeDraw => flatten_strokes(
                self.strokes
                    .iter()
                    .map(Vec::as_slice)
                    .chain(self.current_stroke.as_deref()),
            ),
            ToolKind::LineDraw => self.vertices.clone(),
            ToolKind::Select | ToolKind::Pan => Vec::new(),
        }
    }

    fn pending_len(&self) -> usize {
        match self.tool {
            ToolKind::FreeDraw => {
                self.strokes.iter().map(Vec::len).sum::<usize>()
                    + self.current_stroke.as_ref().map_or(0, Vec::len)
            }
            ToolKind::LineDraw => self.vertices.len(),
            ToolKind::Select | ToolKind::Pan => 0,
        }
    }

    /// Whether enough points exist to persist an annotation.
    pub fn can_commit(&self) -> bool {
        self.pending_len() >= MIN_POINTS
    }

    /// Discard everything accumulated; the tool stays selected.
    pub fn cancel(&mut self) {
        self.strokes.clear();
        self.current_stroke = None;
        self.vertices.clear();
        self.preview = None;
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty() && self.current_stroke.is_none() && self.vertices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stroke(session: &mut DrawingSession, points: &[(f64, f64)]) {
        let mut iter = points.iter().map(|&(x, y)| Point::new(x, y));
        if let Some(first) = iter.next() {
            session.begin_stroke(first);
        }
        for p in iter {
            session.extend_stroke(p);
        }
        session.end_stroke();
    }

    #[test]
    fn test_tool_selection() {
        let mut session = DrawingSession::default();
        assert_eq!(session.tool(), ToolKind::Select);
        session.set_tool(ToolKind::LineDraw);
        assert_eq!(session.tool(), ToolKind::LineDraw);
    }

    #[test]
    fn test_two_strokes_flatten_in_order() {
        let mut session = DrawingSession::default();
        session.set_tool(ToolKind::FreeDraw);
        stroke(&mut session, &[(0.0, 0.0), (10.0, 0.0), (20.0, 0.0)]);
        stroke(&mut session, &[(0.0, 50.0), (10.0, 50.0), (20.0, 50.0), (30.0, 50.0)]);

        let points = session.pending_points();
        assert_eq!(points.len(), 7);
        assert_eq!(points[0], Point::new(0.0, 0.0));
        assert_eq!(points[2], Point::new(20.0, 0.0));
        assert_eq!(points[3], Point::new(0.0, 50.0));
        assert_eq!(points[6], Point::new(30.0, 50.0));
        assert!(session.can_commit());
    }

    #[test]
    fn test_single_point_stroke_is_discarded() {
        let mut session = DrawingSession::default();
        session.set_tool(ToolKind::FreeDraw);
        stroke(&mut session, &[(5.0, 5.0)]);
        assert!(session.strokes().is_empty());
        assert!(!session.can_commit());
        assert!(session.pending_points().is_empty());
    }

    #[test]
    fn test_min_spacing_filters_micro_moves() {
        let mut session = DrawingSession::default();
        session.set_tool(ToolKind::FreeDraw);
        session.begin_stroke(Point::new(0.0, 0.0));
        assert!(!session.extend_stroke(Point::new(1.0, 1.0)));
        assert!(!session.extend_stroke(Point::new(3.0, 0.0)));
        assert!(session.extend_stroke(Point::new(4.0, 0.0)));
        assert_eq!(session.current_stroke().map(<[Point]>::len), Some(2));
    }

    #[test]
    fn test_open_stroke_counts_toward_commit() {
        let mut session = DrawingSession::default();
        session.set_tool(ToolKind::FreeDraw);
        session.begin_stroke(Point::new(0.0, 0.0));
        session.extend_stroke(Point::new(10.0, 0.0));
        assert!(session.can_commit());
        assert_eq!(session.pending_points().len(), 2);
    }

    #[test]
    fn test_line_draw_vertices_and_undo() {
        let mut session = DrawingSession::default();
        session.set_tool(ToolKind::LineDraw);
        assert!(session.add_vertex(Point::new(10.0, 10.0)));
        assert!(session.add_vertex(Point::new(50.0, 10.0)));
        // Repeat click on the same spot.
        assert!(!session.add_vertex(Point::new(50.0, 10.0)));
        session.set_preview(Some(Point::new(80.0, 40.0)));

        assert_eq!(session.pending_points(), vec![Point::new(10.0, 10.0), Point::new(50.0, 10.0)]);
        assert!(session.undo_vertex());
        assert!(!session.can_commit());
        assert_eq!(session.preview(), Some(Point::new(80.0, 40.0)));
    }

    #[test]
    fn test_tool_switch_cancels() {
        let mut session = DrawingSession::default();
        session.set_tool(ToolKind::LineDraw);
        session.add_vertex(Point::new(0.0, 0.0));
        session.add_vertex(Point::new(10.0, 0.0));
        session.set_tool(ToolKind::FreeDraw);
        assert!(session.is_empty());
        assert!(session.pending_points().is_empty());
    }

    #[test]
    fn test_select_tool_accumulates_nothing() {
        let mut session = DrawingSession::default();
        session.begin_stroke(Point::ZERO);
        assert!(!session.add_vertex(Point::ZERO));
        assert!(session.is_empty());
        assert!(!session.undo_vertex());
    }
}
