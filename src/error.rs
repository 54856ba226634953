use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::error;

use crate::{auth::services::AuthError, db::StoreError, response::ApiResponse};

/// Transport-level error; every variant renders the uniform failure envelope.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("validation failed: {0:?}")]
    Validation(Vec<String>),

    #[error("bad request: {message}")]
    BadRequest {
        message: String,
        errors: Option<Vec<String>>,
    },

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// The payload is logged, the client only sees a generic message.
    #[error("internal error: {0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        AppError::BadRequest {
            message: message.into(),
            errors: None,
        }
    }

    pub fn internal(err: impl std::fmt::Display) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        AppError::internal(e)
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        AppError::internal(e)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest {
            message: "Invalid request body".into(),
            errors: Some(vec![rejection.body_text()]),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                ApiResponse::failure("Validation failed", Some(errors)),
            ),
            AppError::BadRequest { message, errors } => {
                (StatusCode::BAD_REQUEST, ApiResponse::failure(message, errors))
            }
            AppError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, ApiResponse::failure(msg, None))
            }
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, ApiResponse::failure(msg, None)),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ApiResponse::failure(msg, None)),
            AppError::Internal(msg) => {
                error!(error = %msg, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiResponse::failure("Internal server error", None),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}
