use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};

use super::helpers::resolve_identity;
use crate::error::Error;
use crate::server::AppState;
use crate::server::response::ApiError;
use crate::types::Identity;

pub const INVALID_TOKEN_MESSAGE: &str = "token is invalid.";

/// Extractor that requires a resolvable `authorization` header.
pub struct RequireAccount(pub Identity);

impl RequireAccount {
    #[must_use]
    pub fn account(&self) -> &str {
        &self.0.belong
    }
}

#[derive(Debug)]
pub enum AuthError {
    InvalidToken,
    InternalError,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            AuthError::InvalidToken => ApiError::bad_request(INVALID_TOKEN_MESSAGE),
            AuthError::InternalError => ApiError::internal("internal server error."),
        }
        .into_response()
    }
}

impl FromRequestParts<Arc<AppState>> for RequireAccount {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        // A header that is not valid visible ASCII cannot match any stored token.
        let auth_header = match parts.headers.get(AUTHORIZATION) {
            Some(value) => Some(value.to_str().map_err(|_| AuthError::InvalidToken)?),
            None => None,
        };

        let identity =
            resolve_identity(state.store.as_ref(), auth_header).map_err(|e| match e {
                Error::InvalidToken => AuthError::InvalidToken,
                e => {
                    tracing::error!("Failed to resolve token: {e}");
                    AuthError::InternalError
                }
            })?;

        Ok(RequireAccount(identity))
    }
}
