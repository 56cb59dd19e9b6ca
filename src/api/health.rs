//! Health check endpoint.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub environment: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub database: DatabaseHealthResponse,
    pub mail: MailHealthResponse,
}

#[derive(Debug, Serialize)]
pub struct DatabaseHealthResponse {
    pub status: String,
    pub connected: bool,
    pub pool_size: u32,
    pub idle_connections: u32,
}

#[derive(Debug, Serialize)]
pub struct MailHealthResponse {
    pub in_flight: usize,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let pool = &state.postgres_pool;
    let connected = match pool.ping(state.settings.db.ping_timeout()).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Health check database ping failed");
            false
        }
    };

    let status = if connected { "available" } else { "degraded" };

    Json(HealthResponse {
        status: status.to_string(),
        environment: state.settings.server.env.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        database: DatabaseHealthResponse {
            status: if connected { "available" } else { "unavailable" }.to_string(),
            connected,
            pool_size: pool.size(),
            idle_connections: pool.num_idle() as u32,
        },
        mail: MailHealthResponse {
            in_flight: state.mailer.in_flight(),
        },
    })
}
