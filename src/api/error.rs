use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::analytics::QueryError;
use crate::upstream::UpstreamError;

use super::handlers::ErrorResponse;

/// Message returned for every upstream failure; the cause is only logged.
pub const FETCH_FAILED_MESSAGE: &str = "Failed to fetch data";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] QueryError),
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error = match &self {
            Self::InvalidRequest(reason) => reason.to_string(),
            Self::Upstream(_) => FETCH_FAILED_MESSAGE.to_string(),
        };

        (self.status_code(), Json(ErrorResponse { error })).into_response()
    }
}
