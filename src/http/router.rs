//! Router configuration for the HTTP API.
//!
//! This module sets up all routes, middleware (CORS, compression, tracing),
//! and creates the axum router ready for serving.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration - permissive for development, should be restricted in production
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the API router with versioned endpoints
    let api_v1 = Router::new()
        // Bookings
        .route("/reservations", post(handlers::create_reservation))
        .route("/passes/monthly", post(handlers::create_monthly_pass))
        .route("/passes/yearly", post(handlers::create_yearly_pass))
        // Cancellation handshake
        .route("/cancel-reservation", post(handlers::cancel_reservation))
        .route("/mark-as-scanned/{spot_id}", get(handlers::mark_as_scanned))
        .route(
            "/check-scan-status/{spot_id}",
            get(handlers::check_scan_status),
        )
        // Employees
        .route(
            "/employees",
            get(handlers::list_employees).post(handlers::create_employee),
        )
        .route("/verify-face", post(handlers::verify_face));

    // Combine all routes
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/v1", api_v1)
        // Face probes are photos; allow a generous upload size.
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::LocalRepository;
    use std::sync::Arc;

    #[test]
    fn router_builds_with_local_state() {
        let repo =
            Arc::new(LocalRepository::new()) as Arc<dyn crate::db::repository::FullRepository>;
        let state = AppState::new(repo);
        let _router = create_router(state);
    }
}
