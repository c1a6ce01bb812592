use crate::core::SubmitError;
use crate::core::validator::ValidationError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid submission: {0}")]
    Validation(#[from] ValidationError),
    #[error("already submitting")]
    AlreadySubmitting,
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl From<SubmitError> for AppError {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::Validation(e) => Self::Validation(e),
            SubmitError::AlreadySubmitting => Self::AlreadySubmitting,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::Validation(e) => {
                tracing::debug!(field = e.field.as_str(), "Validation failed");
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    json!({ "error": e.describe(), "field": e.field, "reason": e.reason }),
                )
            }
            Self::AlreadySubmitting => {
                tracing::debug!("Submission already in flight");
                (StatusCode::CONFLICT, json!({ "error": "already submitting" }))
            }
            Self::BadRequest(msg) => {
                tracing::debug!(message = %msg, "Bad request");
                (StatusCode::BAD_REQUEST, json!({ "error": msg }))
            }
            Self::Internal(msg) => {
                tracing::error!(message = %msg, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": "Internal server error" }))
            }
        };

        (status, Json(body)).into_response()
    }
}
