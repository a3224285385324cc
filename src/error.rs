use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::auth::password::PasswordError;

pub const LOGIN_PATH: &str = "/login";

/// Message shown for every failed login, whatever the cause.
pub const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Failures a handler can surface to the client.
///
/// Only the variants that carry a message for the client render it; the
/// internal ones are logged and answered with a generic body.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("not authenticated")]
    NotAuthenticated { next: String },
    #[error("insufficient role")]
    InsufficientRole,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("{0}")]
    Validation(String),
    #[error("not found")]
    NotFound,
    #[error("{0}")]
    Conflict(String),
    #[error("corrupt stored credential")]
    CorruptCredential,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<PasswordError> for AppError {
    fn from(e: PasswordError) -> Self {
        match e {
            PasswordError::EmptyInput => AppError::Validation("Password must not be empty".into()),
            PasswordError::CorruptHash(_) => AppError::CorruptCredential,
            PasswordError::Hashing(msg) => AppError::Internal(anyhow::anyhow!(msg)),
        }
    }
}

/// `/login?next=...` for a caller that must authenticate first.
pub fn login_redirect(next: &str) -> String {
    if next.is_empty() {
        return LOGIN_PATH.to_string();
    }
    format!("{}?next={}", LOGIN_PATH, urlencoding::encode(next))
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::NotAuthenticated { next } => {
                return Redirect::to(&login_redirect(&next)).into_response();
            }
            AppError::InsufficientRole => (StatusCode::FORBIDDEN, "forbidden".to_string()),
            AppError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, INVALID_CREDENTIALS.to_string())
            }
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound => (StatusCode::NOT_FOUND, "not found".to_string()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::CorruptCredential => {
                error!("stored password hash is malformed");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }
            AppError::Internal(e) => {
                error!(error = %e, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
