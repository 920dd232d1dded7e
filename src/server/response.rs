use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::error::Error;

pub const OK_MESSAGE: &str = "OK";
pub const CONFLICT_MESSAGE: &str = "repository is already exists.";
pub const METHOD_NOT_MATCH_MESSAGE: &str = "request method not match.";
pub const FETCH_FAILED_MESSAGE: &str = "failed to fetch readme.";
pub const PARTIAL_WRITE_MESSAGE: &str = "repository saved but search index sync is pending.";

/// Envelope for every API response. `status` mirrors the HTTP status code.
#[derive(Debug, Serialize, Deserialize)]
pub struct Message<T> {
    pub status: u16,
    pub message: String,
    pub data: Option<T>,
}

impl<T: Serialize> Message<T> {
    #[must_use]
    pub fn ok(data: T) -> Self {
        Self {
            status: StatusCode::OK.as_u16(),
            message: OK_MESSAGE.to_string(),
            data: Some(data),
        }
    }
}

impl<T: Serialize> IntoResponse for Message<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

/// API error that converts to a proper HTTP response
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_GATEWAY,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        Message::<()> {
            status: self.status.as_u16(),
            message: self.message,
            data: None,
        }
        .into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::InvalidToken => ApiError::bad_request(crate::auth::INVALID_TOKEN_MESSAGE),
            Error::AlreadyExists => ApiError::bad_request(CONFLICT_MESSAGE),
            Error::Config(msg) => ApiError::internal(msg),
            Error::NotFound => ApiError::not_found("repository not found."),
            Error::Fetch { url, source } => {
                tracing::warn!("README fetch failed for {url}: {source}");
                ApiError::bad_gateway(FETCH_FAILED_MESSAGE)
            }
            Error::PartialWrite { .. } => ApiError::internal(PARTIAL_WRITE_MESSAGE),
            e => {
                tracing::error!("Request failed: {e}");
                ApiError::internal("internal server error.")
            }
        }
    }
}
