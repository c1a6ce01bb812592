use crate::api::AppState;
use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use axum::http::{Extensions, HeaderMap, Request, StatusCode};
use ipnetwork::IpNetwork;
use std::net::{IpAddr, SocketAddr};
use tower_governor::GovernorError;
use tower_governor::key_extractor::KeyExtractor;

/// Resolves the visitor's address behind trusted reverse proxies.
///
/// Used both as the rate-limit key and to pick the visitor's submission controller.
#[derive(Clone, Debug)]
pub struct IpKeyExtractor {
    trusted_proxies: Vec<IpNetwork>,
}

impl IpKeyExtractor {
    #[must_use]
    pub const fn new(trusted_proxies: Vec<IpNetwork>) -> Self {
        Self { trusted_proxies }
    }

    #[must_use]
    pub fn identify_client_ip(&self, headers: &HeaderMap, peer_addr: IpAddr) -> IpAddr {
        // Only trust X-Forwarded-For if the request comes from a known proxy.
        if !self.is_trusted(&peer_addr) {
            return peer_addr;
        }

        // Rightmost address that is not one of ours is the visitor.
        let xff = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok());
        if let Some(xff_val) = xff
            && let Some(real_ip) =
                xff_val.rsplit(',').filter_map(|s| s.trim().parse::<IpAddr>().ok()).find(|ip| !self.is_trusted(ip))
        {
            return real_ip;
        }

        peer_addr
    }

    fn is_trusted(&self, ip: &IpAddr) -> bool {
        self.trusted_proxies.iter().any(|net| net.contains(*ip))
    }
}

impl KeyExtractor for IpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        let peer_ip = peer_ip(req.extensions()).ok_or(GovernorError::UnableToExtractKey)?;
        Ok(self.identify_client_ip(req.headers(), peer_ip))
    }
}

fn peer_ip(extensions: &Extensions) -> Option<IpAddr> {
    extensions.get::<ConnectInfo<SocketAddr>>().map(|ConnectInfo(addr)| addr.ip())
}

/// The visitor's address as resolved by [`IpKeyExtractor`], so handlers key the controller
/// registry exactly as the rate limiter keys its buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientIp(pub IpAddr);

impl FromRequestParts<AppState> for ClientIp {
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(peer) = peer_ip(&parts.extensions) else {
            tracing::error!("Peer address missing; serve the router with connect info");
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        };
        Ok(Self(state.client_ips.identify_client_ip(&parts.headers, peer)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn extractor() -> IpKeyExtractor {
        IpKeyExtractor::new(vec!["10.0.0.0/8".parse().unwrap(), "127.0.0.1/32".parse().unwrap()])
    }

    fn forwarded(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_untrusted_peer_ignores_forwarded_header() {
        let peer: IpAddr = "203.0.113.7".parse().unwrap();
        assert_eq!(extractor().identify_client_ip(&forwarded("1.1.1.1"), peer), peer);
    }

    #[test]
    fn test_trusted_peer_uses_rightmost_untrusted_hop() {
        let peer: IpAddr = "127.0.0.1".parse().unwrap();
        let ip = extractor().identify_client_ip(&forwarded("9.9.9.9, 1.1.1.1, 10.0.0.5"), peer);
        assert_eq!(ip, "1.1.1.1".parse::<IpAddr>().unwrap());
    }

    fn app_state() -> AppState {
        use crate::core::{ControllerRegistry, NotificationDispatcher, OutcomeReducer, SubmissionPipeline};
        use crate::test_support::{FakeProvider, FakeStore};
        use std::sync::Arc;
        use std::time::Duration;

        let pipeline = SubmissionPipeline::new(
            Arc::new(FakeStore::default()),
            NotificationDispatcher::new(Arc::new(FakeProvider::default()), Duration::from_secs(1)),
            OutcomeReducer::default(),
            "portfolio-website",
            Duration::from_secs(1),
        );
        AppState { registry: ControllerRegistry::new(Arc::new(pipeline)), client_ips: extractor() }
    }

    #[tokio::test]
    async fn test_client_ip_extractor_resolves_through_proxy() {
        let peer: SocketAddr = "10.0.0.7:443".parse().unwrap();
        let (mut parts, ()) = Request::builder()
            .header("x-forwarded-for", "198.51.100.4, 10.0.0.2")
            .extension(ConnectInfo(peer))
            .body(())
            .unwrap()
            .into_parts();

        let ClientIp(ip) = ClientIp::from_request_parts(&mut parts, &app_state()).await.unwrap();
        assert_eq!(ip, "198.51.100.4".parse::<IpAddr>().unwrap());
    }

    #[tokio::test]
    async fn test_client_ip_extractor_requires_connect_info() {
        let (mut parts, ()) = Request::builder().body(()).unwrap().into_parts();

        let rejection = ClientIp::from_request_parts(&mut parts, &app_state()).await.unwrap_err();
        assert_eq!(rejection, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_trusted_peer_without_header() {
        let peer: IpAddr = "10.1.1.1".parse().unwrap();
        assert_eq!(extractor().identify_client_ip(&HeaderMap::new(), peer), peer);
    }
}
