use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::analytics::{QueryError, StatsAggregator, StatsQueryParams, StatsReport};

use super::error::ApiError;

pub struct AppState {
    pub aggregator: StatsAggregator,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub message: String,
}

/// Combined stats for one page over a custom date range
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    query: Result<Query<StatsQueryParams>, QueryRejection>,
) -> Result<Json<StatsReport>, ApiError> {
    // Undecodable query strings get the same JSON 400 as failed validation
    let Query(params) = query.map_err(|rejection| {
        warn!("Rejected stats query: {}", rejection.body_text());
        ApiError::from(QueryError::Malformed(rejection.body_text()))
    })?;

    info!(
        site_id = ?params.site_id,
        start_date = ?params.start_date,
        end_date = ?params.end_date,
        page_url = ?params.page_url,
        "Fetching data"
    );

    let query = params.validate().map_err(|e| {
        warn!("Rejected stats query: {}", e);
        ApiError::from(e)
    })?;

    match state.aggregator.build_report(&query).await {
        Ok(report) => Ok(Json(report)),
        Err(e) => {
            error!(
                status = ?e.status(),
                upstream_body = e.body().unwrap_or_default(),
                "Error fetching data: {}",
                e
            );
            Err(ApiError::from(e))
        }
    }
}

/// Health check endpoint
pub async fn health_check() -> Json<SuccessResponse> {
    Json(SuccessResponse {
        message: "OK".to_string(),
    })
}
