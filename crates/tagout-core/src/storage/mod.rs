//! Persistence contract the engine talks to.
//!
//! The engine never owns durable storage; it issues requests through
//! [`PersistenceApi`] and reflects confirmed results. Implementations must
//! re-check roles and workflow order themselves since the client is not
//! the only guard.

mod memory;

pub use memory::MemoryStore;

use crate::annotation::{Annotation, AnnotationPatch, NewAnnotation};
use crate::identity::{Actor, AnnotationId, DiagramId, PlanId, PointId};
use crate::isolation::{
    DeleteConfirmation, IsolationPlan, IsolationPoint, NewPlan, NewPoint, PlanAction, PlanPatch, PointAction,
    PointPatch, WorkflowError,
};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;
use uuid::Uuid;

/// Persistence errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PersistenceError {
    /// Rejected input such as too few points or an empty name.
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },
    #[error("Forbidden: {0}")]
    Forbidden(String),
    /// Illegal transition or status conflict.
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
    /// The backend could not be reached or failed.
    #[error("Transport error: {0}")]
    Transport(String),
}

impl PersistenceError {
    /// Missing record of the given kind.
    pub(crate) fn not_found(entity: &'static str, id: Uuid) -> Self {
        Self::NotFound { entity, id }
    }
}

/// Result type for persistence operations.
pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Boxed future for async operations (compatible with WASM).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Request/response access to annotations, plans and points.
///
/// Every mutating call names the acting user so the implementation can
/// enforce roles independently of the client.
pub trait PersistenceApi {
    /// All annotations of a diagram, in stored order.
    fn list_annotations(&self, diagram_id: DiagramId) -> BoxFuture<'_, PersistenceResult<Vec<Annotation>>>;

    /// Persist a new annotation. Administrators only.
    fn create_annotation(
        &self,
        actor: &Actor,
        diagram_id: DiagramId,
        shape: NewAnnotation,
    ) -> BoxFuture<'_, PersistenceResult<Annotation>>;

    /// Apply a partial update and return the stored record.
    fn update_annotation(
        &self,
        actor: &Actor,
        id: AnnotationId,
        patch: AnnotationPatch,
    ) -> BoxFuture<'_, PersistenceResult<Annotation>>;

    /// Remove an annotation. Administrators only.
    fn delete_annotation(&self, actor: &Actor, id: AnnotationId) -> BoxFuture<'_, PersistenceResult<()>>;

    /// Isolation plans drawn on a diagram.
    fn list_plans(&self, diagram_id: DiagramId) -> BoxFuture<'_, PersistenceResult<Vec<IsolationPlan>>>;

    /// Create a plan in draft status.
    fn create_plan(
        &self,
        actor: &Actor,
        diagram_id: DiagramId,
        plan: NewPlan,
    ) -> BoxFuture<'_, PersistenceResult<IsolationPlan>>;

    /// Edit descriptive fields or the marker size.
    fn update_plan(&self, actor: &Actor, id: PlanId, patch: PlanPatch) -> BoxFuture<'_, PersistenceResult<IsolationPlan>>;

    /// Delete a plan together with its points. Plans that are pending,
    /// approved or active need [`DeleteConfirmation::Double`].
    fn delete_plan(
        &self,
        actor: &Actor,
        id: PlanId,
        confirmation: DeleteConfirmation,
    ) -> BoxFuture<'_, PersistenceResult<()>>;

    /// Apply one workflow step; out-of-order steps fail with
    /// [`PersistenceError::Workflow`].
    fn transition_plan(
        &self,
        actor: &Actor,
        id: PlanId,
        action: PlanAction,
    ) -> BoxFuture<'_, PersistenceResult<IsolationPlan>>;

    /// Approve a pending plan, recording the approver.
    fn approve_plan(&self, actor: &Actor, id: PlanId) -> BoxFuture<'_, PersistenceResult<IsolationPlan>> {
        self.transition_plan(actor, id, PlanAction::Approve)
    }

    /// Points of a plan ordered by sequence.
    fn list_points(&self, plan_id: PlanId) -> BoxFuture<'_, PersistenceResult<Vec<IsolationPoint>>>;

    /// Add a point to a draft plan; it gets the next sequence number.
    fn create_point(
        &self,
        actor: &Actor,
        plan_id: PlanId,
        point: NewPoint,
    ) -> BoxFuture<'_, PersistenceResult<IsolationPoint>>;

    /// Move, retype or rename a point of a draft plan.
    fn update_point(
        &self,
        actor: &Actor,
        id: PointId,
        patch: PointPatch,
    ) -> BoxFuture<'_, PersistenceResult<IsolationPoint>>;

    fn delete_point(&self, actor: &Actor, id: PointId) -> BoxFuture<'_, PersistenceResult<()>>;

    /// Isolate, verify or restore a point of an active plan. Open to any
    /// actor; each step is stamped once.
    fn transition_point_status(
        &self,
        actor: &Actor,
        id: PointId,
        action: PointAction,
    ) -> BoxFuture<'_, PersistenceResult<IsolationPoint>>;
}
