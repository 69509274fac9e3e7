//! Per-diagram annotation editor.

use crate::annotation::{Annotation, AnnotationKind, AnnotationPatch, InspectionStatus, MIN_POINTS, NewAnnotation};
use crate::camera::Camera;
use crate::config::EditorConfig;
use crate::geometry::polyline_distance;
use crate::identity::{Actor, AnnotationId, DiagramId};
use crate::input::{Key, KeyInput, MouseButton, PointerEvent, Shortcut};
use crate::selection::SelectionController;
use crate::storage::{PersistenceApi, PersistenceError, PersistenceResult};
use crate::store::AnnotationStore;
use crate::surface::{DiagramSurface, SurfaceProvider};
use crate::tools::{DrawingSession, ToolKind};
use kurbo::{Point, Size};

/// View padding used when fitting the page into the viewport.
const FIT_PADDING: f64 = 20.0;

/// What an input event did to the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorResponse {
    /// Nothing changed.
    Ignored,
    /// Local state changed; redraw.
    Changed,
    /// The user asked to save the current drawing.
    CommitRequested,
}

/// State of one diagram view: camera, drawing session, selection and
/// the mirror of persisted annotations.
///
/// Drawing, hit-testing and camera changes are synchronous. Persistence
/// goes through [`PersistenceApi`] and is only reflected once confirmed.
pub struct DiagramEditor {
    diagram_id: DiagramId,
    config: EditorConfig,
    camera: Camera,
    store: AnnotationStore,
    session: DrawingSession,
    selection: SelectionController,
    actor: Actor,
    active_kind: AnnotationKind,
    commit_in_flight: bool,
    error: Option<PersistenceError>,
    surface: Option<DiagramSurface>,
    /// Last view position of an ongoing pan drag.
    pan_anchor: Option<Point>,
}

impl DiagramEditor {
    /// Create an editor. Non-administrators start locked.
    pub fn new(diagram_id: DiagramId, actor: Actor, config: EditorConfig) -> Self {
        let mut selection = SelectionController::new();
        if !actor.is_admin() {
            selection.set_locked(true);
        }
        Self {
            diagram_id,
            camera: Camera::with_limits(config.min_zoom, config.max_zoom),
            store: AnnotationStore::new(diagram_id),
            session: DrawingSession::new(config.min_point_spacing),
            selection,
            actor,
            active_kind: AnnotationKind::default(),
            commit_in_flight: false,
            error: None,
            surface: None,
            pan_anchor: None,
            config,
        }
    }

    /// Diagram this editor works on.
    pub fn diagram_id(&self) -> DiagramId {
        self.diagram_id
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Current view transform.
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Confirmed annotations of the diagram.
    pub fn store(&self) -> &AnnotationStore {
        &self.store
    }

    /// Unsaved drawing.
    pub fn session(&self) -> &DrawingSession {
        &self.session
    }

    pub fn selection(&self) -> &SelectionController {
        &self.selection
    }

    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    /// Active tool.
    pub fn tool(&self) -> ToolKind {
        self.session.tool()
    }

    /// Kind the next committed drawing gets.
    pub fn active_kind(&self) -> AnnotationKind {
        self.active_kind
    }

    pub fn is_locked(&self) -> bool {
        self.selection.is_locked()
    }

    /// Whether a create request is awaiting its result.
    pub fn commit_in_flight(&self) -> bool {
        self.commit_in_flight
    }

    /// Page dimensions picked up by [`Self::attach_surface`].
    pub fn surface(&self) -> Option<DiagramSurface> {
        self.surface
    }

    /// Last persistence error, if not yet dismissed.
    pub fn error(&self) -> Option<&PersistenceError> {
        self.error.as_ref()
    }

    /// Dismiss and return the last persistence error.
    pub fn take_error(&mut self) -> Option<PersistenceError> {
        self.error.take()
    }

    fn fail(&mut self, err: PersistenceError) -> bool {
        log::warn!("diagram {} request rejected: {}", self.diagram_id, err);
        self.error = Some(err);
        false
    }

    /// Replace the annotation mirror with a fresh listing.
    pub async fn load<A: PersistenceApi + ?Sized>(&mut self, api: &A) -> bool {
        match api.list_annotations(self.diagram_id).await {
            Ok(annotations) => {
                self.store.replace_all(annotations);
                if let Some(id) = self.selection.active() {
                    if self.store.get(id).is_none() {
                        self.selection.clear();
                    }
                }
                true
            }
            Err(err) => self.fail(err),
        }
    }

    /// Pick up the page from the host. Returns whether one is available.
    pub fn attach_surface<P: SurfaceProvider + ?Sized>(&mut self, provider: &P) -> bool {
        self.surface = provider.surface();
        self.surface.is_some()
    }

    /// Fit the page into a viewport of `viewport` view pixels.
    pub fn fit_to_view(&mut self, viewport: Size) -> bool {
        match self.surface {
            Some(surface) if !surface.is_empty() => {
                self.camera.fit_to_surface(surface, viewport, FIT_PADDING);
                true
            }
            _ => false,
        }
    }

    /// Fit every annotation into a viewport of `viewport` view pixels.
    /// Returns false when there is nothing to fit.
    pub fn fit_to_content(&mut self, viewport: Size) -> bool {
        let Some(bounds) = self.store.bounds() else {
            return false;
        };
        self.camera.fit_to_rect(bounds, viewport, FIT_PADDING);
        true
    }

    /// Switch tools, discarding any pending drawing. Drawing tools are
    /// refused while locked.
    pub fn set_tool(&mut self, tool: ToolKind) -> bool {
        if self.is_locked() && tool != ToolKind::Select {
            return false;
        }
        self.pan_anchor = None;
        self.session.set_tool(tool);
        true
    }

    /// Kind used for the next commit.
    pub fn set_active_kind(&mut self, kind: AnnotationKind) {
        self.active_kind = kind;
    }

    /// Enter or leave lock mode. Either way the select tool is forced and
    /// the selection cleared. Non-administrators cannot unlock.
    pub fn set_locked(&mut self, locked: bool) -> bool {
        if !locked && !self.actor.is_admin() {
            return false;
        }
        if !self.selection.set_locked(locked) {
            return false;
        }
        self.pan_anchor = None;
        self.session.set_tool(ToolKind::Select);
        log::debug!("diagram {} lock {}", self.diagram_id, if locked { "on" } else { "off" });
        true
    }

    /// Flip lock mode; see [`Self::set_locked`].
    pub fn toggle_lock(&mut self) -> bool {
        self.set_locked(!self.is_locked())
    }

    /// Annotations to draw, in list order.
    pub fn visible_annotations(&self) -> impl Iterator<Item = &Annotation> {
        self.store.iter().filter(|a| self.selection.is_visible(a.id))
    }

    /// Zoom by `steps` wheel notches around a view point.
    pub fn zoom_at(&mut self, screen_point: Point, steps: f64) {
        self.camera.zoom_at(screen_point, self.config.zoom_step.powf(steps));
    }

    /// First annotation within the world-space hit threshold of `world`.
    /// The threshold does not scale with zoom.
    fn hit(&self, world: Point) -> Option<AnnotationId> {
        self.store.hit(world, self.config.hit_threshold).map(|a| a.id)
    }

    /// Whether `world` lies on the selected annotation.
    fn on_selection(&self, world: Point) -> bool {
        self.selection
            .active()
            .and_then(|id| self.store.get(id))
            .is_some_and(|a| polyline_distance(world, &a.points) <= self.config.hit_threshold)
    }

    fn click_select(&mut self, world: Point) -> EditorResponse {
        let before = self.selection.active();
        // Hidden annotations must not shadow the visible selection.
        let hit = if self.is_locked() && self.on_selection(world) { before } else { self.hit(world) };
        self.selection.click(hit);
        if self.selection.active() == before {
            EditorResponse::Ignored
        } else {
            EditorResponse::Changed
        }
    }

    fn starts_pan(&self, button: MouseButton, space: bool) -> bool {
        match button {
            MouseButton::Middle => true,
            MouseButton::Left => space || self.tool() == ToolKind::Pan,
            MouseButton::Right => false,
        }
    }

    /// Route a pointer event given in view pixels.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> EditorResponse {
        let screen = event.position();

        if let Some(anchor) = self.pan_anchor {
            return match event {
                PointerEvent::Move { .. } => {
                    self.camera.pan(screen - anchor);
                    self.pan_anchor = Some(screen);
                    EditorResponse::Changed
                }
                PointerEvent::Up { .. } => {
                    self.pan_anchor = None;
                    EditorResponse::Changed
                }
                _ => EditorResponse::Ignored,
            };
        }
        if let PointerEvent::Down { button, modifiers, .. } = event {
            if self.starts_pan(button, modifiers.space) {
                self.pan_anchor = Some(screen);
                return EditorResponse::Changed;
            }
        }

        let world = self.camera.screen_to_world(screen);
        if self.is_locked() {
            return match event {
                PointerEvent::Down { button: MouseButton::Left, .. } => self.click_select(world),
                _ => EditorResponse::Ignored,
            };
        }

        match (self.tool(), event) {
            (ToolKind::Select, PointerEvent::Down { button: MouseButton::Left, .. }) => self.click_select(world),
            (ToolKind::FreeDraw, PointerEvent::Down { button: MouseButton::Left, .. }) => {
                self.session.begin_stroke(world);
                EditorResponse::Changed
            }
            (ToolKind::FreeDraw, PointerEvent::Move { .. }) => {
                if self.session.extend_stroke(world) {
                    EditorResponse::Changed
                } else {
                    EditorResponse::Ignored
                }
            }
            (ToolKind::FreeDraw, PointerEvent::Up { button: MouseButton::Left, .. }) => {
                if self.session.current_stroke().is_none() {
                    return EditorResponse::Ignored;
                }
                self.session.end_stroke();
                EditorResponse::Changed
            }
            (ToolKind::LineDraw, PointerEvent::Down { button: MouseButton::Left, .. }) => {
                if self.session.add_vertex(world) {
                    EditorResponse::Changed
                } else {
                    EditorResponse::Ignored
                }
            }
            (ToolKind::LineDraw, PointerEvent::Move { .. }) => {
                self.session.set_preview(Some(world));
                EditorResponse::Changed
            }
            (ToolKind::LineDraw, PointerEvent::DoubleClick { .. }) => {
                if self.session.can_commit() {
                    EditorResponse::CommitRequested
                } else {
                    EditorResponse::Ignored
                }
            }
            _ => EditorResponse::Ignored,
        }
    }

    /// Keyboard shortcuts. All of them are disabled while locked.
    pub fn handle_key(&mut self, input: KeyInput) -> EditorResponse {
        if self.is_locked() {
            return EditorResponse::Ignored;
        }
        match Shortcut::from_key(input) {
            Some(Shortcut::Commit) if self.session.can_commit() => EditorResponse::CommitRequested,
            Some(Shortcut::Cancel) if !self.session.is_empty() => {
                self.cancel_current_drawing();
                EditorResponse::Changed
            }
            Some(Shortcut::UndoVertex) if self.session.undo_vertex() => EditorResponse::Changed,
            _ if input.key == Key::Escape && self.selection.active().is_some() => {
                self.selection.clear();
                EditorResponse::Changed
            }
            _ => EditorResponse::Ignored,
        }
    }

    /// Build the create payload for the pending drawing and mark a commit
    /// as in flight. `None` when there is nothing to save, the view is
    /// locked, or a previous commit has not resolved yet.
    pub fn prepare_commit(&mut self) -> Option<NewAnnotation> {
        if self.commit_in_flight || self.is_locked() {
            return None;
        }
        let points = self.session.pending_points();
        if points.len() < MIN_POINTS {
            return None;
        }
        let kind = self.active_kind;
        self.commit_in_flight = true;
        Some(NewAnnotation {
            kind,
            points,
            color: kind.default_color(),
            stroke_width: self.config.stroke_width,
            label: self.store.next_label(kind),
            material: String::new(),
            dimension: String::new(),
            description: String::new(),
            inspection_status: InspectionStatus::NotInspected,
        })
    }

    /// Resolve the in-flight commit. On success the new annotation is
    /// selected (unless the view was locked meanwhile) and the session
    /// reset; on failure the session is kept so the user can retry.
    pub fn finish_commit(&mut self, result: PersistenceResult<Annotation>) -> bool {
        self.commit_in_flight = false;
        match result {
            Ok(annotation) => {
                log::debug!("committed {} ({} points)", annotation.label, annotation.points.len());
                if !self.is_locked() {
                    self.selection.select(annotation.id);
                }
                self.store.upsert(annotation);
                self.session.cancel();
                true
            }
            Err(err) => self.fail(err),
        }
    }

    /// Persist the pending drawing as a new annotation of the active kind.
    pub async fn save_current_drawing<A: PersistenceApi + ?Sized>(&mut self, api: &A) -> bool {
        let Some(shape) = self.prepare_commit() else {
            return false;
        };
        let result = api.create_annotation(&self.actor, self.diagram_id, shape).await;
        self.finish_commit(result)
    }

    /// Discard the pending drawing.
    pub fn cancel_current_drawing(&mut self) {
        self.session.cancel();
    }

    /// Apply a partial update. Administrators only; geometry must keep at
    /// least two points.
    pub async fn update_annotation<A: PersistenceApi + ?Sized>(
        &mut self,
        api: &A,
        id: AnnotationId,
        patch: AnnotationPatch,
    ) -> bool {
        if !self.actor.is_admin() || self.store.get(id).is_none() {
            return false;
        }
        if patch.points.as_ref().is_some_and(|p| p.len() < MIN_POINTS) {
            return false;
        }
        match api.update_annotation(&self.actor, id, patch).await {
            Ok(annotation) => {
                self.store.upsert(annotation);
                true
            }
            Err(err) => self.fail(err),
        }
    }

    /// Record an inspection result. No request when the status is unchanged.
    pub async fn set_inspection_status<A: PersistenceApi + ?Sized>(
        &mut self,
        api: &A,
        id: AnnotationId,
        status: InspectionStatus,
    ) -> bool {
        if self.store.get(id).is_some_and(|a| a.inspection_status == status) {
            return false;
        }
        self.update_annotation(api, id, AnnotationPatch::status(status)).await
    }

    /// Delete an annotation and drop it from the selection.
    pub async fn delete_annotation<A: PersistenceApi + ?Sized>(&mut self, api: &A, id: AnnotationId) -> bool {
        if !self.actor.is_admin() || self.store.get(id).is_none() {
            return false;
        }
        match api.delete_annotation(&self.actor, id).await {
            Ok(()) => {
                self.store.remove(id);
                self.selection.forget(id);
                true
            }
            Err(err) => self.fail(err),
        }
    }
}
