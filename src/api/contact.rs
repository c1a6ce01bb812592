use crate::api::AppState;
use crate::api::rate_limit::ClientIp;
use crate::api::schemas::contact::{OutcomeResponse, StatusResponse};
use crate::domain::submission::{ClientContext, SubmissionInput};
use crate::error::{AppError, Result};
use axum::extract::rejection::JsonRejection;
use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use tracing::Instrument;

/// Accepts one contact-form submission from the calling visitor.
///
/// Recorded submissions answer 200 whether or not every notification went out; the body's
/// `kind` tells the two apart. A lost submission answers 502.
///
/// # Errors
/// Returns `AppError::BadRequest` for an unreadable body, `AppError::Validation` for
/// rejected fields, `AppError::AlreadySubmitting` while this visitor has one in flight and
/// `AppError::Internal` if the submission task itself dies.
#[tracing::instrument(skip_all, fields(client_ip = tracing::field::Empty))]
pub async fn submit_contact(
    State(state): State<AppState>,
    ClientIp(client_ip): ClientIp,
    headers: HeaderMap,
    payload: std::result::Result<Json<SubmissionInput>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(input) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    tracing::Span::current().record("client_ip", tracing::field::display(client_ip));

    // Once started, a submission runs to completion even if the visitor disconnects, so a
    // stored record always gets both notification attempts.
    let controller = state.registry.controller_for(client_ip);
    let client = ClientContext::from_headers(&headers);
    let outcome = tokio::spawn(async move { controller.submit(input, client).await }.in_current_span())
        .await
        .map_err(|e| AppError::Internal(format!("submission task failed: {e}")))??;

    let status = if outcome.is_success() { StatusCode::OK } else { StatusCode::BAD_GATEWAY };
    Ok((status, Json(OutcomeResponse::from(outcome))))
}

/// Reports whether the calling visitor has a submission in flight.
pub async fn submission_status(State(state): State<AppState>, ClientIp(client_ip): ClientIp) -> impl IntoResponse {
    Json(StatusResponse { submitting: state.registry.is_submitting(client_ip) })
}
