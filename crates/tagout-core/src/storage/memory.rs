//! In-memory persistence implementation.

use super::{BoxFuture, PersistenceApi, PersistenceError, PersistenceResult};
use crate::annotation::{Annotation, AnnotationPatch, MIN_POINTS, NewAnnotation};
use crate::identity::{Actor, AnnotationId, DiagramId, PlanId, PointId};
use crate::isolation::{
    DeleteConfirmation, IsolationPlan, IsolationPoint, NewPlan, NewPoint, PlanAction, PlanPatch, PointAction,
    PointPatch, WorkflowError, next_sequence,
};
use chrono::Utc;
use kurbo::Point;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    annotations: Vec<Annotation>,
    plans: Vec<IsolationPlan>,
    points: Vec<IsolationPoint>,
}

/// In-memory persistence for tests and the reference server.
///
/// Enforces the same rules a production backend must: administrator-only
/// edits, workflow order, draft-only point definitions and write-once
/// audit stamps. Records are listed in insertion order.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

fn require_admin(actor: &Actor) -> PersistenceResult<()> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(PersistenceError::Forbidden(format!(
            "{} is not an administrator",
            actor.user.display_name
        )))
    }
}

fn validate_points(points: &[Point]) -> PersistenceResult<()> {
    if points.len() < MIN_POINTS {
        return Err(PersistenceError::Validation(format!(
            "an annotation needs at least {MIN_POINTS} points, got {}",
            points.len()
        )));
    }
    if points.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
        return Err(PersistenceError::Validation("points must be finite".into()));
    }
    Ok(())
}

fn validate_stroke(width: f64) -> PersistenceResult<()> {
    if width.is_finite() && width > 0.0 {
        Ok(())
    } else {
        Err(PersistenceError::Validation(format!("invalid stroke width {width}")))
    }
}

fn validate_text(field: &str, value: &str) -> PersistenceResult<()> {
    if value.trim().is_empty() {
        Err(PersistenceError::Validation(format!("{field} must not be empty")))
    } else {
        Ok(())
    }
}

impl Tables {
    fn plan(&self, id: PlanId) -> PersistenceResult<&IsolationPlan> {
        self.plans
            .iter()
            .find(|p| p.id == id)
            .ok_or(PersistenceError::not_found("plan", id))
    }

    fn point_mut(&mut self, id: PointId) -> PersistenceResult<&mut IsolationPoint> {
        self.points
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(PersistenceError::not_found("point", id))
    }

    /// Status gate for point definition edits on `plan_id`.
    fn check_points_editable(&self, plan_id: PlanId) -> PersistenceResult<()> {
        let plan = self.plan(plan_id)?;
        if !plan.status.allows_point_edits() {
            return Err(WorkflowError::PointsFrozen(plan.status).into());
        }
        Ok(())
    }

    fn plan_of_point(&self, id: PointId) -> PersistenceResult<PlanId> {
        self.points
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.plan_id)
            .ok_or(PersistenceError::not_found("point", id))
    }
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> PersistenceResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|e| PersistenceError::Transport(format!("Lock error: {}", e)))
    }

    fn write(&self) -> PersistenceResult<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|e| PersistenceError::Transport(format!("Lock error: {}", e)))
    }

    /// Annotations of a diagram.
    pub fn annotations(&self, diagram_id: DiagramId) -> PersistenceResult<Vec<Annotation>> {
        Ok(self
            .read()?
            .annotations
            .iter()
            .filter(|a| a.diagram_id == diagram_id)
            .cloned()
            .collect())
    }

    /// Validate and insert an annotation. Administrators only.
    pub fn add_annotation(
        &self,
        actor: &Actor,
        diagram_id: DiagramId,
        shape: NewAnnotation,
    ) -> PersistenceResult<Annotation> {
        require_admin(actor)?;
        validate_points(&shape.points)?;
        validate_stroke(shape.stroke_width)?;
        let annotation = shape.into_annotation(Uuid::new_v4(), diagram_id, Utc::now());
        self.write()?.annotations.push(annotation.clone());
        log::debug!("created annotation {} on diagram {}", annotation.id, diagram_id);
        Ok(annotation)
    }

    /// Apply a patch, re-validating geometry and stroke width.
    pub fn edit_annotation(
        &self,
        actor: &Actor,
        id: AnnotationId,
        patch: AnnotationPatch,
    ) -> PersistenceResult<Annotation> {
        require_admin(actor)?;
        if let Some(points) = &patch.points {
            validate_points(points)?;
        }
        if let Some(width) = patch.stroke_width {
            validate_stroke(width)?;
        }
        let mut tables = self.write()?;
        let annotation = tables
            .annotations
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(PersistenceError::not_found("annotation", id))?;
        annotation.apply(patch, Utc::now());
        Ok(annotation.clone())
    }

    /// Delete an annotation. Administrators only.
    pub fn remove_annotation(&self, actor: &Actor, id: AnnotationId) -> PersistenceResult<()> {
        require_admin(actor)?;
        let mut tables = self.write()?;
        let idx = tables
            .annotations
            .iter()
            .position(|a| a.id == id)
            .ok_or(PersistenceError::not_found("annotation", id))?;
        tables.annotations.remove(idx);
        Ok(())
    }

    /// Plans of a diagram.
    pub fn plans(&self, diagram_id: DiagramId) -> PersistenceResult<Vec<IsolationPlan>> {
        Ok(self
            .read()?
            .plans
            .iter()
            .filter(|p| p.diagram_id == diagram_id)
            .cloned()
            .collect())
    }

    /// Single plan by id.
    pub fn plan(&self, id: PlanId) -> PersistenceResult<IsolationPlan> {
        self.read()?.plan(id).cloned()
    }

    /// Create a draft plan.
    pub fn add_plan(&self, actor: &Actor, diagram_id: DiagramId, plan: NewPlan) -> PersistenceResult<IsolationPlan> {
        require_admin(actor)?;
        validate_text("plan name", &plan.name)?;
        let plan = plan.into_plan(Uuid::new_v4(), diagram_id, actor.user.clone(), Utc::now());
        self.write()?.plans.push(plan.clone());
        log::debug!("created plan {} '{}'", plan.id, plan.name);
        Ok(plan)
    }

    /// Edit a plan; descriptive fields only while not terminal.
    pub fn edit_plan(&self, actor: &Actor, id: PlanId, patch: PlanPatch) -> PersistenceResult<IsolationPlan> {
        require_admin(actor)?;
        if let Some(name) = &patch.name {
            validate_text("plan name", name)?;
        }
        let mut tables = self.write()?;
        let plan = tables
            .plans
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(PersistenceError::not_found("plan", id))?;
        plan.apply(patch, Utc::now())?;
        Ok(plan.clone())
    }

    /// Delete a plan together with its points.
    pub fn remove_plan(&self, actor: &Actor, id: PlanId, confirmation: DeleteConfirmation) -> PersistenceResult<()> {
        require_admin(actor)?;
        let mut tables = self.write()?;
        tables.plan(id)?.check_delete(confirmation)?;
        tables.plans.retain(|p| p.id != id);
        tables.points.retain(|p| p.plan_id != id);
        log::debug!("deleted plan {id}");
        Ok(())
    }

    /// Apply a workflow step and stamp it. Administrators only.
    pub fn advance_plan(&self, actor: &Actor, id: PlanId, action: PlanAction) -> PersistenceResult<IsolationPlan> {
        require_admin(actor)?;
        let mut tables = self.write()?;
        let plan = tables
            .plans
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(PersistenceError::not_found("plan", id))?;
        plan.apply_action(action, &actor.user, Utc::now())?;
        Ok(plan.clone())
    }

    /// Points of a plan ordered by sequence.
    pub fn points(&self, plan_id: PlanId) -> PersistenceResult<Vec<IsolationPoint>> {
        let tables = self.read()?;
        tables.plan(plan_id)?;
        let mut points: Vec<IsolationPoint> = tables.points.iter().filter(|p| p.plan_id == plan_id).cloned().collect();
        points.sort_by_key(|p| p.sequence);
        Ok(points)
    }

    /// Append a point to a draft plan with the next sequence number.
    pub fn add_point(&self, actor: &Actor, plan_id: PlanId, point: NewPoint) -> PersistenceResult<IsolationPoint> {
        require_admin(actor)?;
        validate_text("tag number", &point.tag_number)?;
        let mut tables = self.write()?;
        tables.check_points_editable(plan_id)?;
        let sequence = next_sequence(tables.points.iter().filter(|p| p.plan_id == plan_id));
        let point = point.into_point(Uuid::new_v4(), plan_id, sequence, Utc::now());
        tables.points.push(point.clone());
        Ok(point)
    }

    /// Move, retype or rename a point while its plan is a draft.
    pub fn edit_point(&self, actor: &Actor, id: PointId, patch: PointPatch) -> PersistenceResult<IsolationPoint> {
        require_admin(actor)?;
        if let Some(tag) = &patch.tag_number {
            validate_text("tag number", tag)?;
        }
        let mut tables = self.write()?;
        let plan_id = tables.plan_of_point(id)?;
        tables.check_points_editable(plan_id)?;
        let point = tables.point_mut(id)?;
        point.apply(patch, Utc::now());
        Ok(point.clone())
    }

    /// Delete a point while its plan is a draft. Remaining points keep their numbers.
    pub fn remove_point(&self, actor: &Actor, id: PointId) -> PersistenceResult<()> {
        require_admin(actor)?;
        let mut tables = self.write()?;
        let plan_id = tables.plan_of_point(id)?;
        tables.check_points_editable(plan_id)?;
        tables.points.retain(|p| p.id != id);
        Ok(())
    }

    /// Isolate, verify or restore a point. Open to any user while the plan is active.
    pub fn advance_point(&self, actor: &Actor, id: PointId, action: PointAction) -> PersistenceResult<IsolationPoint> {
        let mut tables = self.write()?;
        let plan_id = tables.plan_of_point(id)?;
        let status = tables.plan(plan_id)?.status;
        if !status.allows_point_actions() {
            return Err(WorkflowError::PlanNotActive(status).into());
        }
        let point = tables.point_mut(id)?;
        point.apply_action(action, &actor.user, Utc::now())?;
        log::debug!("point {} {} by {}", point.tag_number, point.status, actor.user.display_name);
        Ok(point.clone())
    }
}

impl PersistenceApi for MemoryStore {
    fn list_annotations(&self, diagram_id: DiagramId) -> BoxFuture<'_, PersistenceResult<Vec<Annotation>>> {
        Box::pin(async move { self.annotations(diagram_id) })
    }

    fn create_annotation(
        &self,
        actor: &Actor,
        diagram_id: DiagramId,
        shape: NewAnnotation,
    ) -> BoxFuture<'_, PersistenceResult<Annotation>> {
        let actor = actor.clone();
        Box::pin(async move { self.add_annotation(&actor, diagram_id, shape) })
    }

    fn update_annotation(
        &self,
        actor: &Actor,
        id: AnnotationId,
        patch: AnnotationPatch,
    ) -> BoxFuture<'_, PersistenceResult<Annotation>> {
        let actor = actor.clone();
        Box::pin(async move { self.edit_annotation(&actor, id, patch) })
    }

    fn delete_annotation(&self, actor: &Actor, id: AnnotationId) -> BoxFuture<'_, PersistenceResult<()>> {
        let actor = actor.clone();
        Box::pin(async move { self.remove_annotation(&actor, id) })
    }

    fn list_plans(&self, diagram_id: DiagramId) -> BoxFuture<'_, PersistenceResult<Vec<IsolationPlan>>> {
        Box::pin(async move { self.plans(diagram_id) })
    }

    fn create_plan(
        &self,
        actor: &Actor,
        diagram_id: DiagramId,
        plan: NewPlan,
    ) -> BoxFuture<'_, PersistenceResult<IsolationPlan>> {
        let actor = actor.clone();
        Box::pin(async move { self.add_plan(&actor, diagram_id, plan) })
    }

    fn update_plan(&self, actor: &Actor, id: PlanId, patch: PlanPatch) -> BoxFuture<'_, PersistenceResult<IsolationPlan>> {
        let actor = actor.clone();
        Box::pin(async move { self.edit_plan(&actor, id, patch) })
    }

    fn delete_plan(
        &self,
        actor: &Actor,
        id: PlanId,
        confirmation: DeleteConfirmation,
    ) -> BoxFuture<'_, PersistenceResult<()>> {
        let actor = actor.clone();
        Box::pin(async move { self.remove_plan(&actor, id, confirmation) })
    }

    fn transition_plan(
        &self,
        actor: &Actor,
        id: PlanId,
        action: PlanAction,
    ) -> BoxFuture<'_, PersistenceResult<IsolationPlan>> {
        let actor = actor.clone();
        Box::pin(async move { self.advance_plan(&actor, id, action) })
    }

    fn list_points(&self, plan_id: PlanId) -> BoxFuture<'_, PersistenceResult<Vec<IsolationPoint>>> {
        Box::pin(async move { self.points(plan_id) })
    }

    fn create_point(
        &self,
        actor: &Actor,
        plan_id: PlanId,
        point: NewPoint,
    ) -> BoxFuture<'_, PersistenceResult<IsolationPoint>> {
        let actor = actor.clone();
        Box::pin(async move { self.add_point(&actor, plan_id, point) })
    }

    fn update_point(
        &self,
        actor: &Actor,
        id: PointId,
        patch: PointPatch,
    ) -> BoxFuture<'_, PersistenceResult<IsolationPoint>> {
        let actor = actor.clone();
        Box::pin(async move { self.edit_point(&actor, id, patch) })
    }

    fn delete_point(&self, actor: &Actor, id: PointId) -> BoxFuture<'_, PersistenceResult<()>> {
        let actor = actor.clone();
        Box::pin(async move { self.remove_point(&actor, id) })
    }

    fn transition_point_status(
        &self,
        actor: &Actor,
        id: PointId,
        action: PointAction,
    ) -> BoxFuture<'_, PersistenceResult<IsolationPoint>> {
        let actor = actor.clone();
        Box::pin(async move { self.advance_point(&actor, id, action) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{AnnotationKind, InspectionStatus};
    use crate::identity::{Role, UserRef};
    use crate::isolation::{PlanStatus, PointStatus, PointType};
    use pollster::block_on;

    fn admin() -> Actor {
        Actor::new(UserRef::new(Uuid::new_v4(), "Ada Admin"), Role::Administrator)
    }

    fn operator() -> Actor {
        Actor::new(UserRef::new(Uuid::new_v4(), "Otto Operator"), Role::Operator)
    }

    fn shape(points: Vec<Point>) -> NewAnnotation {
        NewAnnotation {
            kind: AnnotationKind::Pipe,
            points,
            color: AnnotationKind::Pipe.default_color(),
            stroke_width: 3.0,
            label: "RØR-001".into(),
            material: String::new(),
            dimension: String::new(),
            description: String::new(),
            inspection_status: InspectionStatus::NotInspected,
        }
    }

    fn active_plan(store: &MemoryStore, admin: &Actor) -> (IsolationPlan, IsolationPoint) {
        let plan = store.add_plan(admin, Uuid::new_v4(), NewPlan::named("Pump swap")).unwrap();
        let point = store
            .add_point(admin, plan.id, NewPoint::new(PointType::Valve, "V-1", Point::new(5.0, 5.0)))
            .unwrap();
        for action in [PlanAction::Submit, PlanAction::Approve, PlanAction::Activate] {
            store.advance_plan(admin, plan.id, action).unwrap();
        }
        (plan, point)
    }

    #[test]
    fn test_annotation_round_trip() {
        let store = MemoryStore::new();
        let diagram = Uuid::new_v4();
        let admin = admin();
        let created = block_on(store.create_annotation(
            &admin,
            diagram,
            shape(vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)]),
        ))
        .unwrap();

        let listed = block_on(store.list_annotations(diagram)).unwrap();
        assert_eq!(listed, vec![created.clone()]);
        assert!(block_on(store.list_annotations(Uuid::new_v4())).unwrap().is_empty());

        let updated = block_on(store.update_annotation(
            &admin,
            created.id,
            AnnotationPatch::status(InspectionStatus::Warning),
        ))
        .unwrap();
        assert_eq!(updated.inspection_status, InspectionStatus::Warning);

        block_on(store.delete_annotation(&admin, created.id)).unwrap();
        assert!(matches!(
            block_on(store.delete_annotation(&admin, created.id)),
            Err(PersistenceError::NotFound { entity: "annotation", .. })
        ));
    }

    #[test]
    fn test_annotation_rules() {
        let store = MemoryStore::new();
        let diagram = Uuid::new_v4();
        let line = vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)];

        assert!(matches!(
            store.add_annotation(&operator(), diagram, shape(line.clone())),
            Err(PersistenceError::Forbidden(_))
        ));
        assert!(matches!(
            store.add_annotation(&admin(), diagram, shape(vec![Point::new(0.0, 0.0)])),
            Err(PersistenceError::Validation(_))
        ));

        let created = store.add_annotation(&admin(), diagram, shape(line)).unwrap();
        let shrink = AnnotationPatch { points: Some(vec![Point::ZERO]), ..AnnotationPatch::default() };
        assert!(matches!(
            store.edit_annotation(&admin(), created.id, shrink),
            Err(PersistenceError::Validation(_))
        ));
    }

    #[test]
    fn test_plan_lifecycle_stamps() {
        let store = MemoryStore::new();
        let admin = admin();
        let plan = block_on(store.create_plan(&admin, Uuid::new_v4(), NewPlan::named("Drain T-4"))).unwrap();
        assert_eq!(plan.status, PlanStatus::Draft);
        assert_eq!(plan.created_by, admin.user);

        assert!(matches!(
            block_on(store.transition_plan(&admin, plan.id, PlanAction::Activate)),
            Err(PersistenceError::Workflow(WorkflowError::IllegalPlanTransition { .. }))
        ));

        block_on(store.transition_plan(&admin, plan.id, PlanAction::Submit)).unwrap();
        let approved = block_on(store.approve_plan(&admin, plan.id)).unwrap();
        assert_eq!(approved.approved_by, Some(admin.user.clone()));
        let active = block_on(store.transition_plan(&admin, plan.id, PlanAction::Activate)).unwrap();
        assert!(active.actual_start.is_some());
        assert!(matches!(
            block_on(store.transition_plan(&operator(), plan.id, PlanAction::Complete)),
            Err(PersistenceError::Forbidden(_))
        ));
    }

    #[test]
    fn test_points_frozen_outside_draft() {
        let store = MemoryStore::new();
        let admin = admin();
        let (plan, point) = active_plan(&store, &admin);

        assert_eq!(
            store.add_point(&admin, plan.id, NewPoint::new(PointType::Drain, "D-1", Point::ZERO)),
            Err(WorkflowError::PointsFrozen(PlanStatus::Active).into())
        );
        assert!(store.edit_point(&admin, point.id, PointPatch::moved_to(Point::ZERO)).is_err());
        assert!(store.remove_point(&admin, point.id).is_err());

        // Marker size is still adjustable.
        let resized = store.edit_plan(&admin, plan.id, PlanPatch::marker_size(40)).unwrap();
        assert_eq!(resized.marker_size, 40);
    }

    #[test]
    fn test_point_sequence_keeps_gaps() {
        let store = MemoryStore::new();
        let admin = admin();
        let plan = store.add_plan(&admin, Uuid::new_v4(), NewPlan::named("Vent line")).unwrap();
        let mut ids = Vec::new();
        for tag in ["V-1", "V-2", "V-3"] {
            let p = store.add_point(&admin, plan.id, NewPoint::new(PointType::Valve, tag, Point::ZERO)).unwrap();
            ids.push(p.id);
        }
        store.remove_point(&admin, ids[2]).unwrap();
        store.remove_point(&admin, ids[0]).unwrap();
        let next = store.add_point(&admin, plan.id, NewPoint::new(PointType::Vent, "X-1", Point::ZERO)).unwrap();
        assert_eq!(next.sequence, 3);
        let sequences: Vec<u32> = store.points(plan.id).unwrap().iter().map(|p| p.sequence).collect();
        assert_eq!(sequences, vec![2, 3]);

        assert!(matches!(
            store.add_point(&admin, plan.id, NewPoint::new(PointType::Vent, "  ", Point::ZERO)),
            Err(PersistenceError::Validation(_))
        ));
    }

    #[test]
    fn test_point_actions_need_active_plan() {
        let store = MemoryStore::new();
        let admin = admin();
        let plan = store.add_plan(&admin, Uuid::new_v4(), NewPlan::named("Draft only")).unwrap();
        let point = store.add_point(&admin, plan.id, NewPoint::new(PointType::Valve, "V-9", Point::ZERO)).unwrap();
        assert_eq!(
            store.advance_point(&admin, point.id, PointAction::Isolate),
            Err(WorkflowError::PlanNotActive(PlanStatus::Draft).into())
        );
    }

    #[test]
    fn test_operator_isolates_once() {
        let store = MemoryStore::new();
        let admin = admin();
        let worker = operator();
        let (_, point) = active_plan(&store, &admin);

        let isolated = block_on(store.transition_point_status(&worker, point.id, PointAction::Isolate)).unwrap();
        assert_eq!(isolated.status, PointStatus::Isolated);
        let stamp = isolated.isolated.clone().unwrap();
        assert_eq!(stamp.by, worker.user);

        let again = block_on(store.transition_point_status(&admin, point.id, PointAction::Isolate));
        assert!(matches!(
            again,
            Err(PersistenceError::Workflow(WorkflowError::IllegalPointTransition { .. }))
        ));
        let reloaded = store.points(point.plan_id).unwrap();
        assert_eq!(reloaded[0].isolated, Some(stamp));
    }

    #[test]
    fn test_delete_plan_needs_double_confirmation_and_cascades() {
        let store = MemoryStore::new();
        let admin = admin();
        let (plan, _) = active_plan(&store, &admin);

        assert_eq!(
            store.remove_plan(&admin, plan.id, DeleteConfirmation::Single),
            Err(WorkflowError::ConfirmationRequired(PlanStatus::Active).into())
        );
        store.remove_plan(&admin, plan.id, DeleteConfirmation::Double).unwrap();
        assert!(matches!(store.points(plan.id), Err(PersistenceError::NotFound { entity: "plan", .. })));
        assert!(store.read().unwrap().points.is_empty());
    }
}
