use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::analytics::StatsAggregator;

use super::handlers::{get_stats, health_check, AppState};

pub fn create_api_router(aggregator: StatsAggregator) -> Router {
    let state = Arc::new(AppState { aggregator });

    let api_routes = Router::new()
        .route("/stats", get(get_stats))
        .with_state(state);

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes)
        // Any origin may call the API
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
