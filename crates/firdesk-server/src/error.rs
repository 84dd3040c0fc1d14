use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Errors returned to HTTP callers as `{"error": "..."}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("inference failed: {0:#}")]
    Inference(#[from] anyhow::Error),

    #[error("inference task aborted: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Body sent for every server-side failure; details stay in the logs.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Inference(_) | Self::Join(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to return to the caller.
    pub fn public_message(&self) -> String {
        match self {
            Self::BadRequest(msg) => msg.clone(),
            Self::Inference(_) | Self::Join(_) => INTERNAL_ERROR_MESSAGE.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        (status, Json(json!({ "error": self.public_message() }))).into_response()
    }
}
