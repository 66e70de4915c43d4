use axum::Json;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Unknown target")]
    UnknownTarget(String),
    /// Body extraction failed; keeps the extractor's status (400, 413, ...).
    #[error("Invalid request body: {1}")]
    InvalidBody(StatusCode, String),
    #[error("Not authenticated")]
    Unauthorized,
    #[error("UPSTREAM_BASE_URL missing")]
    MissingUpstreamConfig,
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(#[from] reqwest::Error),
    #[error("{0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    code: u16,
    error: String,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::UnknownTarget(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidBody(status, _) => *status,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::MissingUpstreamConfig | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let AppError::UnknownTarget(target) = &self {
            tracing::info!("Rejecting proxy call for unknown target {:?}", target);
        }

        let body = Json(ErrorResponse {
            code: status.as_u16(),
            error: self.to_string(),
        });

        (status, body).into_response()
    }
}
