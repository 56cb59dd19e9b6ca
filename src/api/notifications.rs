//! Email notification trigger.

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::mailer::parse_mailbox;
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct SendEmailRequest {
    pub recipient: String,
    pub template: String,
    /// Template payload; defaults to an empty object
    #[serde(default = "empty_object")]
    pub data: serde_json::Value,
}

fn empty_object() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

#[derive(Debug, Serialize)]
pub struct EmailAccepted {
    pub delivery_id: Uuid,
    pub status: &'static str,
    pub accepted_at: DateTime<Utc>,
}

/// POST /api/v1/notifications/email
///
/// Validates the request and resolves the template up front, then hands the
/// delivery to the background mailer and answers `202 Accepted`.
pub async fn send_email(
    State(state): State<AppState>,
    Json(request): Json<SendEmailRequest>,
) -> Result<(StatusCode, Json<EmailAccepted>)> {
    if request.template.trim().is_empty() {
        return Err(AppError::Validation("template is required".to_string()));
    }
    parse_mailbox("recipient", &request.recipient)?;
    state
        .mailer
        .mailer()
        .composer()
        .resolver()
        .resolve(&request.template)?;

    let delivery_id = state
        .mailer
        .spawn_send(request.recipient, request.template, request.data)?;

    tracing::info!(%delivery_id, "Email notification accepted");

    Ok((
        StatusCode::ACCEPTED,
        Json(EmailAccepted {
            delivery_id,
            status: "accepted",
            accepted_at: Utc::now(),
        }),
    ))
}
