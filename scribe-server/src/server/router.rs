use super::handlers::{self, AppState};
use super::metrics_handler::{metrics_handler, track_http_metrics};
use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the Axum router with all endpoints
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Prometheus scrape endpoint
        .route("/metrics", get(metrics_handler))
        // Entity REST API endpoints
        .route(
            "/entity",
            post(handlers::create_entity).get(handlers::list_entities),
        )
        .route(
            "/entity/{id}",
            get(handlers::get_entity).delete(handlers::delete_entity),
        )
        .route_layer(middleware::from_fn(track_http_metrics))
        // Add state and middleware
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
