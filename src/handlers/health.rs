use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::state::AppState;

/// GET /health - liveness plus database and token store reachability
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    let (database, store) = tokio::join!(state.users.health_check(), state.auth.health_check());

    match (database, store) {
        (Ok(()), Ok(())) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "version": env!("CARGO_PKG_VERSION"),
                    "database": "ok",
                    "token_store": "ok"
                }
            })),
        ),
        (database, store) => {
            if let Err(e) = &database {
                tracing::warn!("Health check: database unavailable: {}", e);
            }
            if let Err(e) = &store {
                tracing::warn!("Health check: token store unavailable: {}", e);
            }
            let database_status = if database.is_ok() { "ok" } else { "unavailable" };
            let store_status = if store.is_ok() { "ok" } else { "unavailable" };
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "dependency unavailable",
                    "code": "SERVICE_UNAVAILABLE",
                    "data": {
                        "status": "degraded",
                        "timestamp": now,
                        "database": database_status,
                        "token_store": store_status
                    }
                })),
            )
        }
    }
}
