//! HTTP error mapping
//!
//! Every handler error becomes a JSON body of the same shape. Booking rule
//! violations carry their stable `code` so clients can branch on it.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::services::error::{DomainError, ErrorCategory};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Request body failed field validation
    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        AppError::Forbidden(msg.into())
    }

    fn status(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            AppError::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
            AppError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation_error"),
            AppError::Domain(err) => match err.category() {
                ErrorCategory::Validation => (StatusCode::UNPROCESSABLE_ENTITY, "validation_error"),
                ErrorCategory::Conflict => (StatusCode::CONFLICT, "conflict"),
                ErrorCategory::Referential => (StatusCode::CONFLICT, "referential_conflict"),
                ErrorCategory::NotFound => (StatusCode::NOT_FOUND, "not_found"),
                ErrorCategory::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
            },
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }
}

/// JSON error body
#[derive(Serialize, Debug)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    /// Per-field validation failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// Stable machine-readable code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            details: None,
            code: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type) = self.status();

        if status.is_server_error() {
            error!(error = %self, error_type, "Request error");
        }

        let mut body = ErrorResponse::new(error_type, self.to_string());
        match &self {
            AppError::Domain(err) => body = body.with_code(err.code()),
            AppError::Validation(errors) => body.details = serde_json::to_value(errors).ok(),
            _ => {}
        }

        (status, Json(body)).into_response()
    }
}
