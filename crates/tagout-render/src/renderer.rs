//! Display list construction.

use crate::scene::{PendingDrawing, SceneState};
use kurbo::{Affine, Point, Rect, Size};
use peniko::Color;
use tagout_core::annotation::InspectionStatus;
use tagout_core::identity::{AnnotationId, PointId};
use tagout_core::isolation::PointStatus;

/// Extra width of the halo drawn under the selected annotation.
const SELECTION_HALO: f64 = 6.0;
/// Radius of the inspection badge at an annotation's first point.
const BADGE_RADIUS: f64 = 5.0;

/// One drawing primitive. Geometry is in world units unless stated.
#[derive(Debug, Clone)]
pub enum DrawCommand {
    /// Fill the viewport.
    Clear(Color),
    /// World → view transform for all following commands.
    SetTransform(Affine),
    /// Where the diagram page sits.
    Surface(Rect),
    /// Halo under the selected annotation.
    Highlight { points: Vec<Point>, color: Color, width: f64 },
    Polyline { id: AnnotationId, points: Vec<Point>, color: Color, width: f64 },
    StatusBadge { id: AnnotationId, center: Point, radius: f64, color: Color },
    /// Unsaved geometry, drawn dashed.
    Preview { points: Vec<Point>, color: Color, width: f64 },
    Marker {
        id: PointId,
        center: Point,
        radius: f64,
        color: Color,
        sequence: u32,
        label: String,
        active: bool,
    },
}

/// Ordered draw commands for one frame.
#[derive(Debug, Clone, Default)]
pub struct DisplayList {
    pub viewport_size: Size,
    commands: Vec<DrawCommand>,
}

impl DisplayList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn iter(&self) -> impl Iterator<Item = &DrawCommand> {
        self.commands.iter()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

/// Trait for rendering backends.
///
/// A backend turns a [`SceneState`] into whatever it draws with; the
/// display list is the reference backend hosts replay onto their canvas.
pub trait Renderer {
    /// Build the commands for a frame. Called once per frame.
    fn build_scene(&mut self, scene: &SceneState);

    /// Get the background color (for clearing).
    fn background_color(&self, scene: &SceneState) -> Color {
        scene.background_color
    }
}

impl Renderer for DisplayList {
    fn build_scene(&mut self, scene: &SceneState) {
        self.clear();
        self.viewport_size = scene.viewport_size;
        self.push(DrawCommand::Clear(self.background_color(scene)));
        self.push(DrawCommand::SetTransform(scene.transform));
        if let Some(surface) = scene.surface {
            self.push(DrawCommand::Surface(surface.bounds()));
        }

        for annotation in &scene.annotations {
            let width = annotation.stroke_width;
            if scene.selected == Some(annotation.id) {
                self.push(DrawCommand::Highlight {
                    points: annotation.points.clone(),
                    color: scene.selection_color.with_alpha(0.4),
                    width: width + SELECTION_HALO,
                });
            }
            self.push(DrawCommand::Polyline {
                id: annotation.id,
                points: annotation.points.clone(),
                color: annotation.color.into(),
                width,
            });
            if let Some(&first) = annotation.points.first() {
                self.push(DrawCommand::StatusBadge {
                    id: annotation.id,
                    center: first,
                    radius: BADGE_RADIUS,
                    color: inspection_color(annotation.inspection_status),
                });
            }
        }

        if let Some(drawing) = &scene.drawing {
            self.push_pending(drawing);
        }

        if let Some(plan) = &scene.plan {
            let radius = f64::from(plan.marker_size) / 2.0;
            for point in plan.points {
                self.push(DrawCommand::Marker {
                    id: point.id,
                    center: point.position,
                    radius,
                    color: point_status_color(point.status),
                    sequence: point.sequence,
                    label: point.tag_number.clone(),
                    active: plan.active_point == Some(point.id),
                });
            }
        }
    }
}

impl DisplayList {
    fn push_pending(&mut self, drawing: &PendingDrawing) {
        let (color, width) = (drawing.color, drawing.stroke_width);
        for stroke in drawing.strokes.iter().map(Vec::as_slice).chain(drawing.current_stroke) {
            if stroke.len() >= 2 {
                self.push(DrawCommand::Preview { points: stroke.to_vec(), color, width });
            }
        }
        let mut line: Vec<Point> = drawing.vertices.to_vec();
        if !line.is_empty() {
            line.extend(drawing.preview);
        }
        if line.len() >= 2 {
            self.push(DrawCommand::Preview { points: line, color, width });
        }
    }
}

/// Build the display list for a scene.
pub fn render(scene: &SceneState) -> DisplayList {
    let mut list = DisplayList::new();
    list.build_scene(scene);
    list
}

/// Badge color for an inspection outcome.
pub fn inspection_color(status: InspectionStatus) -> Color {
    match status {
        InspectionStatus::Ok => Color::from_rgba8(22, 163, 74, 255),
        InspectionStatus::Warning => Color::from_rgba8(245, 158, 11, 255),
        InspectionStatus::Critical => Color::from_rgba8(220, 38, 38, 255),
        InspectionStatus::NotInspected => Color::from_rgba8(156, 163, 175, 255),
    }
}

/// Marker color for an isolation point.
pub fn point_status_color(status: PointStatus) -> Color {
    match status {
        PointStatus::Pending => Color::from_rgba8(156, 163, 175, 255),
        PointStatus::Isolated => Color::from_rgba8(220, 38, 38, 255),
        PointStatus::Verified => Color::from_rgba8(22, 163, 74, 255),
        PointStatus::Restored => Color::from_rgba8(37, 99, 235, 255),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tagout_core::color::SerializableColor;
    use tagout_core::config::EditorConfig;
    use tagout_core::editor::DiagramEditor;
    use tagout_core::identity::{Actor, Role, UserRef};
    use tagout_core::input::PointerEvent;
    use tagout_core::isolation::{NewPlan, PlanCommand, PlanWorkspace, PointType};
    use tagout_core::storage::MemoryStore;
    use tagout_core::surface::DiagramSurface;
    use tagout_core::tools::ToolKind;
    use uuid::Uuid;

    fn admin() -> Actor {
        Actor::new(UserRef::new(Uuid::new_v4(), "Ada Admin"), Role::Administrator)
    }

    fn click(editor: &mut DiagramEditor, x: f64, y: f64) {
        editor.handle_pointer(PointerEvent::left_down(Point::new(x, y)));
        editor.handle_pointer(PointerEvent::left_up(Point::new(x, y)));
    }

    fn saved_line(store: &MemoryStore, from: Point, to: Point) -> DiagramEditor {
        let mut editor = DiagramEditor::new(Uuid::new_v4(), admin(), EditorConfig::default());
        editor.set_tool(ToolKind::LineDraw);
        click(&mut editor, from.x, from.y);
        click(&mut editor, to.x, to.y);
        assert!(pollster::block_on(editor.save_current_drawing(store)));
        editor
    }

    #[test]
    fn test_empty_scene() {
        let list = render(&SceneState::new(Size::new(800.0, 600.0)));
        assert_eq!(list.len(), 2);
        assert!(matches!(list.commands()[0], DrawCommand::Clear(_)));
        assert!(matches!(list.commands()[1], DrawCommand::SetTransform(t) if t == Affine::IDENTITY));
    }

    #[test]
    fn test_selected_annotation_gets_highlight() {
        let store = MemoryStore::new();
        let mut editor = saved_line(&store, Point::new(0.0, 0.0), Point::new(100.0, 0.0));
        let id = editor.selection().active().unwrap();
        let list = render(&SceneState::from_editor(&editor, Size::new(800.0, 600.0)));
        let kinds: Vec<&str> = list
            .iter()
            .map(|c| match c {
                DrawCommand::Clear(_) => "clear",
                DrawCommand::SetTransform(_) => "transform",
                DrawCommand::Surface(_) => "surface",
                DrawCommand::Highlight { .. } => "highlight",
                DrawCommand::Polyline { .. } => "polyline",
                DrawCommand::StatusBadge { .. } => "badge",
                DrawCommand::Preview { .. } => "preview",
                DrawCommand::Marker { .. } => "marker",
            })
            .collect();
        assert_eq!(kinds, vec!["clear", "transform", "highlight", "polyline", "badge"]);
        assert!(matches!(
            &list.commands()[3],
            DrawCommand::Polyline { id: pid, points, width, .. } if *pid == id && points.len() == 2 && *width == 3.0
        ));
        match &list.commands()[4] {
            DrawCommand::StatusBadge { color, .. } => assert_eq!(
                SerializableColor::from(*color),
                SerializableColor::from(inspection_color(InspectionStatus::NotInspected))
            ),
            other => panic!("unexpected {other:?}"),
        }

        // Locked with nothing selected draws no annotations.
        editor.toggle_lock();
        let list = render(&SceneState::from_editor(&editor, Size::new(800.0, 600.0)));
        assert!(!list.iter().any(|c| matches!(c, DrawCommand::Polyline { .. })));
    }

    #[test]
    fn test_line_preview_follows_pointer() {
        let mut editor = DiagramEditor::new(Uuid::new_v4(), admin(), EditorConfig::default());
        editor.set_tool(ToolKind::LineDraw);
        click(&mut editor, 10.0, 10.0);
        editor.handle_pointer(PointerEvent::Move { position: Point::new(40.0, 10.0) });

        let list = render(&SceneState::from_editor(&editor, Size::new(800.0, 600.0)));
        let previews: Vec<&Vec<Point>> = list
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Preview { points, .. } => Some(points),
                _ => None,
            })
            .collect();
        assert_eq!(previews, vec![&vec![Point::new(10.0, 10.0), Point::new(40.0, 10.0)]]);
    }

    #[test]
    fn test_markers_and_surface() {
        let store = MemoryStore::new();
        let actor = admin();
        let plan = store.add_plan(&actor, Uuid::new_v4(), NewPlan::named("Pump")).unwrap();
        let mut workspace = PlanWorkspace::new(actor, plan, Vec::new());
        let create = PlanCommand::PointCreateRequested {
            position: Point::new(200.0, 120.0),
            point_type: PointType::Valve,
            tag_number: "V-101".into(),
        };
        assert!(pollster::block_on(workspace.dispatch(&store, create)));

        let mut scene = SceneState::new(Size::new(800.0, 600.0)).with_plan(&workspace);
        scene.surface = Some(DiagramSurface::new(1000, 700));
        let list = render(&scene);
        assert!(matches!(list.commands()[2], DrawCommand::Surface(r) if r == Rect::new(0.0, 0.0, 1000.0, 700.0)));
        match list.commands().last() {
            Some(DrawCommand::Marker { center, radius, sequence, label, active, color, .. }) => {
                assert_eq!(*center, Point::new(200.0, 120.0));
                assert_eq!(*radius, 12.0);
                assert_eq!(*sequence, 1);
                assert_eq!(label, "V-101");
                assert!(*active);
                assert_eq!(
                    SerializableColor::from(*color),
                    SerializableColor::from(point_status_color(PointStatus::Pending))
                );
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
