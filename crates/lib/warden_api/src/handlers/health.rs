//! Health check.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use tracing::warn;
use warden_core::deadline::bounded;

use crate::AppState;
use crate::models::HealthResponse;

/// `GET /api/health`: 200 when both stores answer, 503 otherwise.
pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let limit = state.auth.store_timeout;
    let (database, sessions) = tokio::join!(
        bounded(limit, "database ping", state.verifier.store().ping()),
        bounded(limit, "session store ping", state.sessions.ping()),
    );
    if let Err(e) = &database {
        warn!(error = %e, "Database health check failed");
    }
    if let Err(e) = &sessions {
        warn!(error = %e, store = state.sessions.name(), "Session store health check failed");
    }

    let healthy = database.is_ok() && sessions.is_ok();
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        status,
        Json(HealthResponse {
            status: if healthy { "ok" } else { "degraded" }.to_string(),
            version: warden_core::version().to_string(),
            database: database.is_ok(),
            session_store: sessions.is_ok(),
        }),
    )
}
