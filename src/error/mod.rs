use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::mailer::{BackgroundError, ComposeError};
use crate::template::TemplateError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

impl From<ComposeError> for AppError {
    fn from(err: ComposeError) -> Self {
        match err {
            ComposeError::Template(e) => AppError::Template(e),
            e @ ComposeError::InvalidAddress { .. } => AppError::Validation(e.to_string()),
        }
    }
}

impl From<BackgroundError> for AppError {
    fn from(err: BackgroundError) -> Self {
        AppError::Unavailable(err.to_string())
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Serialize)]
struct ErrorBody {
    code: String,
    message: String,
}

/// Check if running in production mode (based on RUN_MODE env var)
fn is_production() -> bool {
    std::env::var("RUN_MODE")
        .map(|m| m == "production" || m == "prod")
        .unwrap_or(false)
}

/// Hide internal detail from clients in production.
fn public_message(detail: &str, generic: &str) -> String {
    if is_production() {
        generic.to_string()
    } else {
        detail.to_string()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, client_message, log_message) = match &self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                msg.clone(),
                msg.clone(),
            ),
            AppError::Template(TemplateError::NotFound(name)) => {
                let msg = format!("Template '{}' not found", name);
                (StatusCode::NOT_FOUND, "TEMPLATE_NOT_FOUND", msg.clone(), msg)
            }
            AppError::Template(e @ TemplateError::Render { .. }) => {
                let msg = e.to_string();
                (StatusCode::UNPROCESSABLE_ENTITY, "TEMPLATE_RENDER_ERROR", msg.clone(), msg)
            }
            AppError::Template(e) => {
                let log_msg = e.to_string();
                let client_msg = public_message(&log_msg, "Template is invalid");
                (StatusCode::INTERNAL_SERVER_ERROR, "TEMPLATE_ERROR", client_msg, log_msg)
            }
            AppError::Unavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "SERVICE_UNAVAILABLE",
                msg.clone(),
                msg.clone(),
            ),
        };

        // Always log the detailed error server-side
        tracing::error!(
            code = %code,
            status = %status.as_u16(),
            message = %log_message,
            "API error"
        );

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message: client_message,
            },
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
