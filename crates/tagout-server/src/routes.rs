//! Router and shared state.

use axum::Router;
use axum::routing::{get, patch, post};
use std::sync::Arc;
use tagout_core::storage::MemoryStore;

use crate::handlers;

/// State shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<MemoryStore>,
}

impl AppState {
    pub fn new(store: MemoryStore) -> Self {
        Self { store: Arc::new(store) }
    }
}

/// All routes.
///
/// ```text
/// GET    /health
/// GET    /diagrams/{diagram_id}/annotations     list_annotations
/// POST   /diagrams/{diagram_id}/annotations     create_annotation
/// PATCH  /annotations/{id}                      update_annotation
/// DELETE /annotations/{id}                      delete_annotation
/// GET    /diagrams/{diagram_id}/plans           list_plans
/// POST   /diagrams/{diagram_id}/plans           create_plan
/// GET    /plans/{id}                            get_plan
/// PATCH  /plans/{id}                            update_plan
/// DELETE /plans/{id}?confirm=double             delete_plan
/// POST   /plans/{id}/transitions                transition_plan
/// POST   /plans/{id}/approve                    approve_plan
/// GET    /plans/{id}/audit                      plan_audit
/// GET    /plans/{id}/points                     list_points
/// POST   /plans/{id}/points                     create_point
/// PATCH  /points/{id}                           update_point
/// DELETE /points/{id}                           delete_point
/// POST   /points/{id}/transitions               transition_point
/// ```
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/diagrams/{diagram_id}/annotations",
            get(handlers::list_annotations).post(handlers::create_annotation),
        )
        .route(
            "/annotations/{id}",
            patch(handlers::update_annotation).delete(handlers::delete_annotation),
        )
        .route(
            "/diagrams/{diagram_id}/plans",
            get(handlers::list_plans).post(handlers::create_plan),
        )
        .route(
            "/plans/{id}",
            get(handlers::get_plan)
                .patch(handlers::update_plan)
                .delete(handlers::delete_plan),
        )
        .route("/plans/{id}/transitions", post(handlers::transition_plan))
        .route("/plans/{id}/approve", post(handlers::approve_plan))
        .route("/plans/{id}/audit", get(handlers::plan_audit))
        .route(
            "/plans/{id}/points",
            get(handlers::list_points).post(handlers::create_point),
        )
        .route(
            "/points/{id}",
            patch(handlers::update_point).delete(handlers::delete_point),
        )
        .route("/points/{id}/transitions", post(handlers::transition_point))
        .with_state(state)
}
