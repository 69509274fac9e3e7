//! Request handlers over the shared store.
//!
//! Every mutating handler passes the acting user to the store, which
//! re-checks roles and workflow order on its own.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};
use tagout_core::annotation::{AnnotationPatch, NewAnnotation};
use tagout_core::identity::{AnnotationId, DiagramId, PlanId, PointId};
use tagout_core::isolation::{
    AuditEntry, DeleteConfirmation, NewPlan, NewPoint, PlanAction, PlanPatch, PlanProgress, PointAction, PointPatch,
    audit_trail,
};

use crate::error::ApiResult;
use crate::extract::{CurrentActor, JsonBody};
use crate::routes::AppState;

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

fn data<T: Serialize>(data: T) -> Json<DataResponse<T>> {
    Json(DataResponse { data })
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteParams {
    #[serde(default)]
    pub confirm: DeleteConfirmation,
}

#[derive(Debug, Deserialize)]
pub struct PlanTransition {
    pub action: PlanAction,
}

#[derive(Debug, Deserialize)]
pub struct PointTransition {
    pub action: PointAction,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// GET /health
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok", version: env!("CARGO_PKG_VERSION") })
}

/* --------------------------------------------------------------------------
   Annotations
   -------------------------------------------------------------------------- */

/// GET /diagrams/{diagram_id}/annotations
pub async fn list_annotations(
    _actor: CurrentActor,
    State(state): State<AppState>,
    Path(diagram_id): Path<DiagramId>,
) -> ApiResult<impl IntoResponse> {
    Ok(data(state.store.annotations(diagram_id)?))
}

/// POST /diagrams/{diagram_id}/annotations
pub async fn create_annotation(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    Path(diagram_id): Path<DiagramId>,
    JsonBody(input): JsonBody<NewAnnotation>,
) -> ApiResult<impl IntoResponse> {
    let annotation = state.store.add_annotation(&actor, diagram_id, input)?;
    tracing::info!(annotation_id = %annotation.id, %diagram_id, label = %annotation.label, "annotation created");
    Ok((StatusCode::CREATED, data(annotation)))
}

/// PATCH /annotations/{id}
pub async fn update_annotation(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    Path(id): Path<AnnotationId>,
    JsonBody(patch): JsonBody<AnnotationPatch>,
) -> ApiResult<impl IntoResponse> {
    Ok(data(state.store.edit_annotation(&actor, id, patch)?))
}

/// DELETE /annotations/{id}
pub async fn delete_annotation(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    Path(id): Path<AnnotationId>,
) -> ApiResult<impl IntoResponse> {
    state.store.remove_annotation(&actor, id)?;
    tracing::info!(annotation_id = %id, "annotation deleted");
    Ok(StatusCode::NO_CONTENT)
}

/* --------------------------------------------------------------------------
   Plans
   -------------------------------------------------------------------------- */

/// GET /diagrams/{diagram_id}/plans
pub async fn list_plans(
    _actor: CurrentActor,
    State(state): State<AppState>,
    Path(diagram_id): Path<DiagramId>,
) -> ApiResult<impl IntoResponse> {
    Ok(data(state.store.plans(diagram_id)?))
}

/// POST /diagrams/{diagram_id}/plans
pub async fn create_plan(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    Path(diagram_id): Path<DiagramId>,
    JsonBody(input): JsonBody<NewPlan>,
) -> ApiResult<impl IntoResponse> {
    let plan = state.store.add_plan(&actor, diagram_id, input)?;
    tracing::info!(plan_id = %plan.id, %diagram_id, name = %plan.name, "plan created");
    Ok((StatusCode::CREATED, data(plan)))
}

/// GET /plans/{id}
pub async fn get_plan(
    _actor: CurrentActor,
    State(state): State<AppState>,
    Path(id): Path<PlanId>,
) -> ApiResult<impl IntoResponse> {
    Ok(data(state.store.plan(id)?))
}

/// PATCH /plans/{id}
pub async fn update_plan(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    Path(id): Path<PlanId>,
    JsonBody(patch): JsonBody<PlanPatch>,
) -> ApiResult<impl IntoResponse> {
    Ok(data(state.store.edit_plan(&actor, id, patch)?))
}

/// DELETE /plans/{id}?confirm=double
pub async fn delete_plan(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    Path(id): Path<PlanId>,
    Query(params): Query<DeleteParams>,
) -> ApiResult<impl IntoResponse> {
    state.store.remove_plan(&actor, id, params.confirm)?;
    tracing::info!(plan_id = %id, confirm = ?params.confirm, "plan deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /plans/{id}/transitions
pub async fn transition_plan(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    Path(id): Path<PlanId>,
    JsonBody(body): JsonBody<PlanTransition>,
) -> ApiResult<impl IntoResponse> {
    let plan = state.store.advance_plan(&actor, id, body.action)?;
    tracing::info!(plan_id = %id, action = %body.action, status = %plan.status, "plan transitioned");
    Ok(data(plan))
}

/// POST /plans/{id}/approve
pub async fn approve_plan(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    Path(id): Path<PlanId>,
) -> ApiResult<impl IntoResponse> {
    let plan = state.store.advance_plan(&actor, id, PlanAction::Approve)?;
    tracing::info!(plan_id = %id, approver = %actor.user.display_name, "plan approved");
    Ok(data(plan))
}

/// GET /plans/{id}/audit
///
/// Stamped point transitions for sign-off, plus per-status counts.
pub async fn plan_audit(
    _actor: CurrentActor,
    State(state): State<AppState>,
    Path(id): Path<PlanId>,
) -> ApiResult<impl IntoResponse> {
    #[derive(Serialize)]
    struct Audit {
        progress: PlanProgress,
        entries: Vec<AuditEntry>,
    }
    let points = state.store.points(id)?;
    Ok(data(Audit { progress: PlanProgress::of(&points), entries: audit_trail(&points) }))
}

/* --------------------------------------------------------------------------
   Points
   -------------------------------------------------------------------------- */

/// GET /plans/{id}/points
pub async fn list_points(
    _actor: CurrentActor,
    State(state): State<AppState>,
    Path(plan_id): Path<PlanId>,
) -> ApiResult<impl IntoResponse> {
    Ok(data(state.store.points(plan_id)?))
}

/// POST /plans/{id}/points
pub async fn create_point(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    Path(plan_id): Path<PlanId>,
    JsonBody(input): JsonBody<NewPoint>,
) -> ApiResult<impl IntoResponse> {
    let point = state.store.add_point(&actor, plan_id, input)?;
    tracing::info!(point_id = %point.id, %plan_id, sequence = point.sequence, "point created");
    Ok((StatusCode::CREATED, data(point)))
}

/// PATCH /points/{id}
pub async fn update_point(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    Path(id): Path<PointId>,
    JsonBody(patch): JsonBody<PointPatch>,
) -> ApiResult<impl IntoResponse> {
    Ok(data(state.store.edit_point(&actor, id, patch)?))
}

/// DELETE /points/{id}
pub async fn delete_point(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    Path(id): Path<PointId>,
) -> ApiResult<impl IntoResponse> {
    state.store.remove_point(&actor, id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /points/{id}/transitions
pub async fn transition_point(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    Path(id): Path<PointId>,
    JsonBody(body): JsonBody<PointTransition>,
) -> ApiResult<impl IntoResponse> {
    let point = state.store.advance_point(&actor, id, body.action)?;
    tracing::info!(
        point_id = %id,
        tag = %point.tag_number,
        status = %point.status,
        by = %actor.user.display_name,
        "point transitioned"
    );
    Ok(data(point))
}
