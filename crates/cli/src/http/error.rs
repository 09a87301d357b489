//! Mapping of lifecycle failures onto HTTP responses

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tweetbot_domain::TweetError;

/// Error body returned by every endpoint
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub detail: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    pub fn invalid_argument(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: ErrorBody {
                code: "INVALID_ARGUMENT",
                detail: detail.into(),
            },
        }
    }
}

impl From<TweetError> for ApiError {
    fn from(err: TweetError) -> Self {
        let (status, code) = match &err {
            TweetError::InvalidArgument(_) => (StatusCode::BAD_REQUEST, "INVALID_ARGUMENT"),
            TweetError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            TweetError::InvalidState(_) => (StatusCode::BAD_REQUEST, "INVALID_STATE"),
            TweetError::Upstream { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "UPSTREAM_ERROR"),
            TweetError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
        };

        if status.is_server_error() {
            tracing::error!(code, error = %err, "Request failed");
        }

        Self {
            status,
            body: ErrorBody {
                code,
                detail: err.to_string(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
