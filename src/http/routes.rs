use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// URL prefix analyzed images are served under
pub const UPLOADS_ROUTE: &str = "/static/uploads";

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    let uploaded_images = ServeDir::new(state.uploads.dir());

    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Sessions and analysis
        .route("/sessions", post(handlers::create_session))
        .route("/analyze", post(handlers::analyze))
        .route("/analyze/live", get(handlers::analyze_live))
        // History queries
        .route("/history", get(handlers::session_history))
        .route("/history/live", get(handlers::live_history))
        .route("/history/stats", get(handlers::history_stats))
        // Administration
        .route("/admin/sessions/cleanup", post(handlers::force_cleanup))
        .route("/admin/stats", get(handlers::detailed_stats))
        // Analyzed images only; histories stay behind the API
        .nest_service(UPLOADS_ROUTE, uploaded_images)
        .layer(CorsLayer::permissive())
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
