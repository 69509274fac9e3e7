//! Editing state for one isolation plan and its points.

use super::{
    AuditEntry, IsolationPlan, IsolationPoint, NewPoint, PlanAction, PlanPatch, PlanProgress, PointAction, PointPatch,
    PointType, audit_trail, clamp_marker_size,
};
use crate::geometry::hit_test;
use crate::identity::{Actor, PointId};
use crate::storage::{PersistenceApi, PersistenceError};
use kurbo::Point;
use std::collections::HashMap;

/// Everything the plan view can ask for.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanCommand {
    PointCreateRequested { position: Point, point_type: PointType, tag_number: String },
    PointMoveRequested { id: PointId, position: Point },
    PointRetypeRequested { id: PointId, point_type: PointType },
    PointDeleteRequested { id: PointId },
    PointActionRequested { id: PointId, action: PointAction },
    PlanActionRequested(PlanAction),
    MarkerSizeChanged(u32),
}

/// One plan, its points in sequence order and the acting user.
///
/// Commands are checked locally first; a command that fails the local
/// check returns `false` without touching persistence. Point moves are
/// optimistic and roll back to the last confirmed position when the
/// store refuses them. Everything else is only reflected once confirmed.
pub struct PlanWorkspace {
    actor: Actor,
    plan: IsolationPlan,
    points: Vec<IsolationPoint>,
    confirmed: HashMap<PointId, Point>,
    active_point: Option<PointId>,
    error: Option<PersistenceError>,
}

impl PlanWorkspace {
    /// Workspace over `plan` with its listed points.
    pub fn new(actor: Actor, plan: IsolationPlan, points: Vec<IsolationPoint>) -> Self {
        let mut workspace = Self {
            actor,
            plan,
            points: Vec::new(),
            confirmed: HashMap::new(),
            active_point: None,
            error: None,
        };
        workspace.set_points(points);
        workspace
    }

    /// Refresh the points from persistence.
    pub async fn reload<A: PersistenceApi + ?Sized>(&mut self, api: &A) -> bool {
        match api.list_points(self.plan.id).await {
            Ok(points) => {
                self.set_points(points);
                true
            }
            Err(err) => self.fail(err),
        }
    }

    fn set_points(&mut self, points: Vec<IsolationPoint>) {
        let plan_id = self.plan.id;
        self.points = points.into_iter().filter(|p| p.plan_id == plan_id).collect();
        self.points.sort_by_key(|p| p.sequence);
        self.confirmed = self.points.iter().map(|p| (p.id, p.position)).collect();
        if let Some(id) = self.active_point {
            if self.point(id).is_none() {
                self.active_point = None;
            }
        }
    }

    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    pub fn plan(&self) -> &IsolationPlan {
        &self.plan
    }

    /// Points in sequence order, including any drag preview.
    pub fn points(&self) -> &[IsolationPoint] {
        &self.points
    }

    pub fn point(&self, id: PointId) -> Option<&IsolationPoint> {
        self.points.iter().find(|p| p.id == id)
    }

    pub fn active_point(&self) -> Option<PointId> {
        self.active_point
    }

    /// Set the active point; unknown ids clear it.
    pub fn select_point(&mut self, id: Option<PointId>) {
        self.active_point = id.filter(|id| self.point(*id).is_some());
    }

    /// Create, move, retype and delete are open.
    pub fn can_edit_points(&self) -> bool {
        self.actor.is_admin() && self.plan.status.allows_point_edits()
    }

    /// Isolate, verify and restore are open.
    pub fn can_advance_points(&self) -> bool {
        self.plan.status.allows_point_actions()
    }

    /// Plan actions to offer the current actor.
    pub fn available_plan_actions(&self) -> Vec<PlanAction> {
        if self.actor.is_admin() {
            self.plan.status.available_actions()
        } else {
            Vec::new()
        }
    }

    /// Topmost marker under `position`, hit radius half the marker size.
    pub fn marker_at(&self, position: Point) -> Option<&IsolationPoint> {
        let radius = f64::from(self.plan.marker_size) / 2.0;
        hit_test(position, self.points.iter().rev(), radius)
    }

    /// Move a marker locally while it is being dragged.
    pub fn preview_move(&mut self, id: PointId, position: Point) -> bool {
        if !self.can_edit_points() {
            return false;
        }
        match self.points.iter_mut().find(|p| p.id == id) {
            Some(point) => {
                point.position = position;
                true
            }
            None => false,
        }
    }

    /// Point counts per status.
    pub fn progress(&self) -> PlanProgress {
        PlanProgress::of(&self.points)
    }

    /// Stamped transitions for the sign-off sheet.
    pub fn audit_trail(&self) -> Vec<AuditEntry> {
        audit_trail(&self.points)
    }

    pub fn error(&self) -> Option<&PersistenceError> {
        self.error.as_ref()
    }

    /// Dismiss and return the last persistence error.
    pub fn take_error(&mut self) -> Option<PersistenceError> {
        self.error.take()
    }

    fn fail(&mut self, err: PersistenceError) -> bool {
        log::warn!("plan {} request rejected: {}", self.plan.id, err);
        self.error = Some(err);
        false
    }

    fn confirm_point(&mut self, point: IsolationPoint) {
        self.confirmed.insert(point.id, point.position);
        match self.points.iter_mut().find(|p| p.id == point.id) {
            Some(slot) => *slot = point,
            None => {
                self.points.push(point);
                self.points.sort_by_key(|p| p.sequence);
            }
        }
    }

    fn rollback_position(&mut self, id: PointId) {
        if let (Some(confirmed), Some(point)) = (self.confirmed.get(&id), self.points.iter_mut().find(|p| p.id == id)) {
            point.position = *confirmed;
        }
    }

    /// Run one command. Returns whether the persisted state changed.
    pub async fn dispatch<A: PersistenceApi + ?Sized>(&mut self, api: &A, command: PlanCommand) -> bool {
        match command {
            PlanCommand::PointCreateRequested { position, point_type, tag_number } => {
                if !self.can_edit_points() || tag_number.trim().is_empty() {
                    return false;
                }
                let new = NewPoint::new(point_type, tag_number, position);
                match api.create_point(&self.actor, self.plan.id, new).await {
                    Ok(point) => {
                        self.active_point = Some(point.id);
                        self.confirm_point(point);
                        true
                    }
                    Err(err) => self.fail(err),
                }
            }
            PlanCommand::PointMoveRequested { id, position } => {
                if !self.preview_move(id, position) {
                    return false;
                }
                match api.update_point(&self.actor, id, PointPatch::moved_to(position)).await {
                    Ok(point) => {
                        self.confirm_point(point);
                        true
                    }
                    Err(err) => {
                        self.rollback_position(id);
                        self.fail(err)
                    }
                }
            }
            PlanCommand::PointRetypeRequested { id, point_type } => {
                if !self.can_edit_points() || self.point(id).is_none_or(|p| p.point_type == point_type) {
                    return false;
                }
                match api.update_point(&self.actor, id, PointPatch::retyped(point_type)).await {
                    Ok(point) => {
                        self.confirm_point(point);
                        true
                    }
                    Err(err) => self.fail(err),
                }
            }
            PlanCommand::PointDeleteRequested { id } => {
                if !self.can_edit_points() || self.point(id).is_none() {
                    return false;
                }
                match api.delete_point(&self.actor, id).await {
                    Ok(()) => {
                        self.points.retain(|p| p.id != id);
                        self.confirmed.remove(&id);
                        if self.active_point == Some(id) {
                            self.active_point = None;
                        }
                        true
                    }
                    Err(err) => self.fail(err),
                }
            }
            PlanCommand::PointActionRequested { id, action } => {
                let offered = self.point(id).and_then(|p| p.status.next_action()) == Some(action);
                if !self.can_advance_points() || !offered {
                    return false;
                }
                match api.transition_point_status(&self.actor, id, action).await {
                    Ok(point) => {
                        self.confirm_point(point);
                        true
                    }
                    Err(err) => self.fail(err),
                }
            }
            PlanCommand::PlanActionRequested(action) => {
                if !self.available_plan_actions().contains(&action) {
                    return false;
                }
                match api.transition_plan(&self.actor, self.plan.id, action).await {
                    Ok(plan) => {
                        self.plan = plan;
                        true
                    }
                    Err(err) => self.fail(err),
                }
            }
            PlanCommand::MarkerSizeChanged(size) => {
                let size = clamp_marker_size(size);
                if !self.actor.is_admin() || size == self.plan.marker_size {
                    return false;
                }
                match api.update_plan(&self.actor, self.plan.id, PlanPatch::marker_size(size)).await {
                    Ok(plan) => {
                        self.plan = plan;
                        true
                    }
                    Err(err) => self.fail(err),
                }
            }
        }
    }
}
