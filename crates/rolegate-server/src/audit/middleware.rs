//! Actor context middleware
//!
//! [`ActorContextLayer`] runs inside the authentication middleware. For every
//! request it:
//! - resolves the client IP (`X-Forwarded-For` first hop, `X-Real-IP`, then
//!   the socket peer address)
//! - reads the acting user from verified [`Claims`], if any
//! - inserts the resulting [`AuditContext`] into the request extensions
//! - emits one request log line with method, path, IP, user agent and user

use std::{
    future::Future,
    net::SocketAddr,
    pin::Pin,
    task::{Context, Poll},
};

use axum::{
    extract::{ConnectInfo, Request},
    http::HeaderMap,
    response::Response,
};
use tower::{Layer, Service};
use tracing::info;

use super::AuditContext;
use crate::auth::Claims;

/// Layer that attaches an [`AuditContext`] to every request
#[derive(Debug, Clone, Default)]
pub struct ActorContextLayer;

impl ActorContextLayer {
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for ActorContextLayer {
    type Service = ActorContextMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ActorContextMiddleware { inner }
    }
}

/// Actor context middleware service
#[derive(Debug, Clone)]
pub struct ActorContextMiddleware<S> {
    inner: S,
}

impl<S> Service<Request> for ActorContextMiddleware<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request) -> Self::Future {
        // Take the service that was driven to readiness, leave a clone behind.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        let peer = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ci| ci.0);
        let ip = client_ip(request.headers(), peer);
        let user_id = request.extensions().get::<Claims>().map(|c| c.user_id);

        let user_agent = request
            .headers()
            .get("user-agent")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();

        info!(
            method = %request.method(),
            path = %request.uri().path(),
            ip = ip.as_deref().unwrap_or_default(),
            user_agent,
            user_id = user_id.unwrap_or(0),
            "Request received"
        );

        let ctx = AuditContext::anonymous().with_actor(user_id, ip.as_deref());
        request.extensions_mut().insert(ctx);

        Box::pin(inner.call(request))
    }
}

/// Resolve the client IP from proxy headers, falling back to the peer address
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<String> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    let real_ip = || {
        headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    forwarded
        .or_else(real_ip)
        .map(str::to_owned)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, routing::get, Extension, Router};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    async fn echo_context(ctx: AuditContext) -> String {
        format!(
            "{}|{}",
            ctx.actor_user_id().unwrap_or(0),
            ctx.actor_ip().unwrap_or_default()
        )
    }

    async fn call(app: Router, request: axum::http::Request<Body>) -> (StatusCode, String) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn claims(user_id: u64) -> Claims {
        Claims {
            user_id,
            email: "a@x.com".to_string(),
            iat: 0,
            nbf: 0,
            exp: i64::MAX,
        }
    }

    #[test]
    fn test_forwarded_for_first_hop_wins() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", " 203.0.113.7 , 10.0.0.1".parse().unwrap());
        headers.insert("x-real-ip", "198.51.100.2".parse().unwrap());

        let peer: SocketAddr = "127.0.0.1:5000".parse().unwrap();
        assert_eq!(client_ip(&headers, Some(peer)).as_deref(), Some("203.0.113.7"));
    }

    #[test]
    fn test_real_ip_then_peer() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", "198.51.100.2".parse().unwrap());
        assert_eq!(client_ip(&headers, None).as_deref(), Some("198.51.100.2"));

        let peer: SocketAddr = "127.0.0.1:5000".parse().unwrap();
        assert_eq!(client_ip(&HeaderMap::new(), Some(peer)).as_deref(), Some("127.0.0.1"));
        assert_eq!(client_ip(&HeaderMap::new(), None), None);
    }

    #[tokio::test]
    async fn test_anonymous_request_gets_empty_context() {
        let app = Router::new()
            .route("/ctx", get(echo_context))
            .layer(ActorContextLayer::new());

        let (status, body) = call(
            app,
            axum::http::Request::builder()
                .uri("/ctx")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "0|");
    }

    #[tokio::test]
    async fn test_claims_and_ip_reach_handler() {
        // Extension layer is outermost, standing in for the auth middleware.
        let app = Router::new()
            .route("/ctx", get(echo_context))
            .layer(ActorContextLayer::new())
            .layer(Extension(claims(11)));

        let (status, body) = call(
            app,
            axum::http::Request::builder()
                .uri("/ctx")
                .header("x-forwarded-for", "203.0.113.7")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "11|203.0.113.7");
    }
}
