use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::auth::AuthError;
use crate::gateway::GatewayError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Backend error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Authentication required".to_string(),
            ),
            AppError::Forbidden => (
                StatusCode::FORBIDDEN,
                "FORBIDDEN",
                "Access denied".to_string(),
            ),
            AppError::Gateway(GatewayError::NotConfigured) | AppError::Auth(AuthError::NotConfigured) => {
                tracing::error!("Backend is not configured");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "BACKEND_NOT_CONFIGURED",
                    "The data backend is not configured".to_string(),
                )
            }
            AppError::Gateway(e) => {
                tracing::error!("Backend error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "BACKEND_ERROR",
                    "A backend error occurred".to_string(),
                )
            }
            // Credential and sign-up rejections are meant for the user.
            AppError::Auth(AuthError::Api { status, message }) if *status < 500 => (
                StatusCode::UNAUTHORIZED,
                "AUTH_REJECTED",
                message.clone(),
            ),
            AppError::Auth(AuthError::MissingSession) => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Authentication required".to_string(),
            ),
            AppError::Auth(e) => {
                tracing::error!("Auth error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "AUTH_ERROR",
                    "An authentication backend error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
