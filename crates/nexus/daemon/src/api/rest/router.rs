//! API Router configuration

use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the main API router
pub fn create_router(state: AppState, enable_cors: bool) -> Router {
    let api_routes = Router::new()
        // Health
        .route("/health", get(handlers::health_check))
        // Governance state
        .route("/state", get(handlers::get_state))
        .route("/workers", get(handlers::list_workers))
        .route("/ticker", get(handlers::get_ticker))
        // Loop control
        .route("/loop/activate", post(handlers::activate_loop))
        .route("/loop/deactivate", post(handlers::deactivate_loop))
        .route("/loop/trigger", post(handlers::trigger_cycle))
        // Audit
        .route("/audit", get(handlers::list_audit))
        .route("/anomalies", post(handlers::report_anomaly))
        // Log feed
        .route("/logs", get(handlers::list_logs))
        .route("/logs/stream", get(handlers::stream_logs));

    let router = Router::new()
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http());

    let router = if enable_cors {
        router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        router
    };

    router.with_state(state)
}
