//! API error responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Errors returned by dashboard handlers as `{"error": ...}` JSON
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unknown chart: {0}")]
    UnknownChart(String),

    #[error("Invalid sort column: {0}")]
    InvalidColumn(String),

    #[error("SSA not found: {0}")]
    SsaNotFound(String),

    #[error("No dataset loaded")]
    NoDataset,

    #[error(transparent)]
    Common(#[from] ssa_common::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::UnknownChart(_) | ApiError::InvalidColumn(_) => StatusCode::BAD_REQUEST,
            ApiError::SsaNotFound(_) | ApiError::NoDataset => StatusCode::NOT_FOUND,
            ApiError::Common(ssa_common::Error::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Common(ssa_common::Error::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            ApiError::Common(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}
