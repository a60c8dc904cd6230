//! Router configuration for the swimdesk API.

use super::health::{health_check, readiness_check};
use super::state::AppState;
use crate::api::{admin, assessments, bookings, invitations, pos, sessions, swimmers, tasks};
use axum::{
    Router,
    routing::{delete, get, patch, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Builds the complete Axum router.
///
/// Health checks are unauthenticated; everything under `/api` resolves the
/// caller's portal session through the extractors in [`crate::auth`].
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Bookings
        .route("/bookings", get(bookings::list_bookings))
        .route("/bookings", post(bookings::create_recurring_booking))
        .route("/bookings/single", post(bookings::create_single_booking))
        .route("/bookings/:id/cancel", post(bookings::cancel_booking))
        // Sessions and batch generation
        .route("/sessions", get(sessions::list_sessions))
        .route("/sessions/generate", post(sessions::generate_sessions))
        .route(
            "/sessions/batches/:batch_id/open",
            post(sessions::open_batch),
        )
        .route(
            "/sessions/batches/:batch_id",
            delete(sessions::delete_batch),
        )
        // Swimmers
        .route("/swimmers", get(swimmers::list_swimmers))
        .route("/swimmers/analytics", get(swimmers::swimmer_analytics))
        // Purchase orders
        .route("/pos", get(pos::list_purchase_orders))
        .route("/pos", post(pos::create_purchase_order))
        // Staff tasks
        .route("/tasks", get(tasks::list_tasks))
        .route("/tasks", post(tasks::create_task))
        .route("/tasks/:id", get(tasks::get_task))
        .route("/tasks/:id", patch(tasks::patch_task))
        .route("/tasks/:id", delete(tasks::delete_task))
        // Invitations and assessments
        .route(
            "/invitations/claim/:token",
            post(invitations::claim_invitation),
        )
        .route("/assessments/complete", post(assessments::complete_assessment))
        // Admin
        .route(
            "/admin/swimmers/:id/invite-parent",
            post(admin::invite_parent),
        );

    Router::new()
        // Health checks (no authentication)
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        // API routes under /api prefix
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
