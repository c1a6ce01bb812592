use crate::api::rate_limit::IpKeyExtractor;
use crate::config::Config;
use crate::core::{ControllerRegistry, SubmissionStore};
use axum::body::Body;
use axum::http::{HeaderName, Request};
use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use std::time::Duration;
use tower_governor::GovernorLayer;
use tower_governor::governor::GovernorConfigBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, RequestId, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

pub mod contact;
pub mod health;
pub mod rate_limit;
pub mod schemas;

const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Clone, Debug)]
pub struct AppState {
    pub registry: ControllerRegistry,
    pub client_ips: IpKeyExtractor,
}

#[derive(Clone, Debug)]
pub struct MgmtState {
    pub store: Arc<dyn SubmissionStore>,
    pub check_timeout: Duration,
}

/// Configures and returns the public API router.
///
/// # Panics
/// Panics if the rate limiter configuration cannot be constructed (a zero burst size).
pub fn app_router(config: &Config, registry: ControllerRegistry) -> Router {
    let client_ips = IpKeyExtractor::new(config.server.trusted_proxies.clone());

    let interval_ns = 1_000_000_000 / config.rate_limit.per_second.max(1);
    let submit_limit = Arc::new(
        GovernorConfigBuilder::default()
            .per_nanosecond(u64::from(interval_ns))
            .burst_size(config.rate_limit.burst)
            .key_extractor(client_ips.clone())
            .finish()
            .expect("Failed to build contact rate limiter config"),
    );

    let state = AppState { registry, client_ips };

    // Only submissions are throttled; the status poll is cheap.
    let contact_routes = Router::new()
        .route("/contact", post(contact::submit_contact))
        .layer(GovernorLayer::new(submit_limit))
        .route("/contact/status", get(contact::submission_status));

    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    Router::new()
        .nest("/v1", contact_routes)
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = request
                        .extensions()
                        .get::<RequestId>()
                        .and_then(|id| id.header_value().to_str().ok())
                        .unwrap_or_default()
                        .to_string();

                    tracing::info_span!(
                        "request",
                        "request_id" = %request_id,
                        "http.request.method" = %request.method(),
                        "url.path" = %request.uri().path(),
                        "http.response.status_code" = tracing::field::Empty,
                        "otel.kind" = "server",
                    )
                })
                .on_response(|response: &axum::http::Response<_>, latency: Duration, span: &tracing::Span| {
                    let status = response.status();
                    span.record("http.response.status_code", status.as_u16());
                    tracing::info!(latency_ms = %latency.as_millis(), status = %status.as_u16(), "request completed");
                })
                .on_failure(|error, _latency, _span: &tracing::Span| {
                    tracing::error!(error = %error, "request failed");
                }),
        )
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
        .with_state(state)
}

pub fn mgmt_router(state: MgmtState) -> Router {
    Router::new().route("/livez", get(health::livez)).route("/readyz", get(health::readyz)).with_state(state)
}
