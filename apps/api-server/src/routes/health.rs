//! Liveness and database check.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use serde::{Deserialize, Serialize};

use crate::response::ApiResponse;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub status: String,
    pub database: bool,
    pub version: String,
    pub server_time: String,
}

async fn health(State(state): State<AppState>) -> ApiResponse<HealthStatus> {
    let database = state.db.health_check().await;
    let status = if database {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    ApiResponse::new(
        status,
        HealthStatus {
            status: if database { "ok" } else { "degraded" }.to_string(),
            database,
            version: env!("CARGO_PKG_VERSION").to_string(),
            server_time: chrono::Utc::now().to_rfc3339(),
        },
        if database { "Healthy" } else { "Database unavailable" },
    )
}
