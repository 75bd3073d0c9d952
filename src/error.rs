use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::auth::AuthError;
use crate::proxy::ProxyError;

/// Errors surfaced by the HTTP API as `{error, ...}` JSON bodies.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error(transparent)]
    Proxy(#[from] ProxyError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Proxy(e) => e.status(),
            ApiError::Auth(e) => match e {
                AuthError::EmailAlreadyInUse => StatusCode::CONFLICT,
                AuthError::EmailNotVerified => StatusCode::FORBIDDEN,
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::WeakPassword { .. }
                | AuthError::InvalidEmail
                | AuthError::UnknownVerificationToken => StatusCode::BAD_REQUEST,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::Proxy(ProxyError::MissingParameter) => json!({ "error": self.to_string() }),
            ApiError::Proxy(ProxyError::Transport(details))
            | ApiError::Proxy(ProxyError::InvalidBody(details)) => {
                json!({ "error": "Proxy error", "details": details })
            }
            ApiError::Auth(e) => json!({ "error": e.to_string(), "code": e.code() }),
            _ => json!({ "error": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}
