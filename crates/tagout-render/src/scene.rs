//! Snapshot of everything one frame draws.

use kurbo::{Affine, Point, Size};
use peniko::Color;
use tagout_core::annotation::Annotation;
use tagout_core::editor::DiagramEditor;
use tagout_core::identity::{AnnotationId, PointId};
use tagout_core::isolation::{IsolationPoint, PlanWorkspace};
use tagout_core::surface::DiagramSurface;

/// Geometry that has been drawn but not saved yet.
#[derive(Debug, Clone)]
pub struct PendingDrawing<'a> {
    pub strokes: &'a [Vec<Point>],
    pub current_stroke: Option<&'a [Point]>,
    pub vertices: &'a [Point],
    /// Rubber-band end point; drawn, never saved.
    pub preview: Option<Point>,
    pub color: Color,
    pub stroke_width: f64,
}

/// Isolation markers of the plan shown on top of the annotations.
#[derive(Debug, Clone)]
pub struct PlanOverlay<'a> {
    pub points: &'a [IsolationPoint],
    pub marker_size: u32,
    pub active_point: Option<PointId>,
}

/// Input of [`crate::render`].
pub struct SceneState<'a> {
    /// World → view transform.
    pub transform: Affine,
    /// Viewport size in view pixels.
    pub viewport_size: Size,
    pub surface: Option<DiagramSurface>,
    /// Annotations to draw, already filtered for lock mode.
    pub annotations: Vec<&'a Annotation>,
    pub selected: Option<AnnotationId>,
    pub drawing: Option<PendingDrawing<'a>>,
    pub plan: Option<PlanOverlay<'a>>,
    pub background_color: Color,
    pub selection_color: Color,
}

impl<'a> SceneState<'a> {
    /// Create an empty scene.
    pub fn new(viewport_size: Size) -> Self {
        Self {
            transform: Affine::IDENTITY,
            viewport_size,
            surface: None,
            annotations: Vec::new(),
            selected: None,
            drawing: None,
            plan: None,
            background_color: Color::from_rgba8(250, 250, 250, 255),
            selection_color: Color::from_rgba8(59, 130, 246, 255), // Blue
        }
    }

    /// Capture the editor's current view.
    pub fn from_editor(editor: &'a DiagramEditor, viewport_size: Size) -> Self {
        let session = editor.session();
        let drawing = (!session.is_empty() || session.preview().is_some()).then(|| PendingDrawing {
            strokes: session.strokes(),
            current_stroke: session.current_stroke(),
            vertices: session.vertices(),
            preview: session.preview(),
            color: editor.active_kind().default_color().into(),
            stroke_width: editor.config().stroke_width,
        });
        Self {
            transform: editor.camera().transform(),
            surface: editor.surface(),
            annotations: editor.visible_annotations().collect(),
            selected: editor.selection().active(),
            drawing,
            ..Self::new(viewport_size)
        }
    }

    /// Overlay the markers of a plan.
    pub fn with_plan(mut self, workspace: &'a PlanWorkspace) -> Self {
        self.plan = Some(PlanOverlay {
            points: workspace.points(),
            marker_size: workspace.plan().marker_size,
            active_point: workspace.active_point(),
        });
        self
    }
}
