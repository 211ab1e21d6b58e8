use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::AppState;

/// `GET /health` — liveness/readiness probe. Reports whether the in-memory
/// catalog has ever been populated (secrets or policies present), which is
/// the only externally observable sign that the initial fetch, or a
/// subsequent reload, has succeeded.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.store.current();
    let body = serde_json::json!({
        "status": "ok",
        "secrets": snapshot.secret_count(),
        "policies": snapshot.policy_count(),
        "snapshot_installed_at": snapshot.installed_at(),
    });
    (StatusCode::OK, Json(body))
}
