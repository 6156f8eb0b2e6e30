//! Health check handler.

use axum::extract::State;
use axum::Json;

use crate::models::HealthResponse;
use crate::AppState;

/// `GET /api/health` — liveness plus a database round trip.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_connected = sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(&state.pool)
        .await
        .is_ok();

    Json(HealthResponse {
        status: "ok".to_string(),
        version: studium_core::version().to_string(),
        db_connected,
    })
}
