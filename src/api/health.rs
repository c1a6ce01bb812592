use crate::api::MgmtState;
use crate::api::schemas::health::HealthResponse;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use tokio::time::timeout;

/// Liveness probe: returns 200 OK as long as the server is running.
pub async fn livez() -> impl IntoResponse {
    StatusCode::OK
}

/// Readiness probe: checks that the submission store is reachable.
pub async fn readyz(State(state): State<MgmtState>) -> impl IntoResponse {
    let store_status = match timeout(state.check_timeout, state.store.check()).await {
        Ok(Ok(())) => "ok",
        Ok(Err(e)) => {
            tracing::warn!(error = %e, component = "store", "Readiness probe failed");
            "error"
        }
        Err(_) => {
            tracing::warn!(component = "store", "Readiness probe timed out");
            "error"
        }
    };

    let status_code = if store_status == "ok" { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    let response = HealthResponse { status: store_status.to_string(), store: store_status.to_string() };

    (status_code, Json(response))
}
