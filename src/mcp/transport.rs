//! HTTP transport for the protocol dispatcher.
//!
//! Routes:
//!
//! - `POST /mcp`: request envelope in, response envelope out
//! - `GET /mcp?type=tools|resources|all`: discovery shortcut (default `all`)
//! - `OPTIONS /mcp`: CORS preflight
//! - `GET /health`: liveness
//!
//! The HTTP status of an envelope response comes from
//! [`ErrorCode::http_status`](crate::mcp::protocol::ErrorCode::http_status).
//! Every response carries the configured security headers, and responses to
//! allowed cross-origin requests carry CORS headers.
//!
//! Clients are identified for rate limiting by the `x-client-id` header,
//! then the first `x-forwarded-for` entry, then `"anonymous"`.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Query, Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::context::ServerContext;
use crate::error::ServeError;
use crate::mcp::dispatcher::ProtocolDispatcher;
use crate::mcp::protocol::{ErrorCode, ResponseEnvelope};

/// Client id used when a request carries no identifying header.
pub const ANONYMOUS_CLIENT: &str = "anonymous";

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// The protocol dispatcher.
    pub dispatcher: Arc<ProtocolDispatcher>,
}

/// Builds the axum `Router` with all protocol routes.
///
/// The request body limit is read from `maxRequestSize` once, here. Changing
/// it later through [`ServerContext::update_config`] does not affect a router
/// that is already built.
pub fn build_router(dispatcher: Arc<ProtocolDispatcher>) -> Router {
    let body_limit = dispatcher.context().get_config().max_request_size;
    let state = AppState { dispatcher };

    Router::new()
        .route(
            "/mcp",
            post(handle_envelope)
                .get(handle_discovery_shortcut)
                .options(handle_preflight),
        )
        .route("/health", get(handle_health))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            apply_policy_headers,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds the configured address and serves until `shutdown` resolves.
///
/// # Errors
///
/// Returns an error if the bind address is invalid, the TCP bind fails, or
/// the server stops with an IO error.
pub async fn serve<F>(dispatcher: Arc<ProtocolDispatcher>, shutdown: F) -> Result<(), ServeError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let bind_address = dispatcher.context().get_config().bind_address;
    let addr: SocketAddr = bind_address
        .parse()
        .map_err(|_| ServeError::InvalidAddress {
            addr: bind_address.clone(),
        })?;

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| ServeError::Bind {
            addr: addr.to_string(),
            source: e,
        })?;

    tracing::info!(%addr, "HTTP transport listening");

    let pruner = tokio::spawn(prune_rate_limits(Arc::clone(dispatcher.context())));
    let result = axum::serve(listener, build_router(dispatcher))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(ServeError::Serve);
    pruner.abort();
    result
}

/// Drops expired rate limit windows once per configured window.
async fn prune_rate_limits(context: Arc<ServerContext>) {
    loop {
        let window_ms = context.get_config().rate_limit.window_ms.max(1_000);
        tokio::time::sleep(Duration::from_millis(window_ms)).await;
        let evicted = context.prune_rate_limits();
        if evicted > 0 {
            tracing::debug!(evicted, "Pruned expired rate limit windows");
        }
    }
}

/// Resolves when the process receives SIGINT or SIGTERM.
#[cfg(unix)]
pub async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let (Ok(mut sigint), Ok(mut sigterm)) = (
        signal(SignalKind::interrupt()),
        signal(SignalKind::terminate()),
    ) else {
        tracing::warn!("Failed to install signal handlers, shutdown requires killing the process");
        std::future::pending::<()>().await;
        return;
    };

    tokio::select! {
        _ = sigint.recv() => tracing::info!("Received SIGINT, initiating graceful shutdown"),
        _ = sigterm.recv() => tracing::info!("Received SIGTERM, initiating graceful shutdown"),
    }
}

/// Resolves when the process receives Ctrl+C.
#[cfg(windows)]
pub async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("Received Ctrl+C, initiating graceful shutdown");
    } else {
        tracing::warn!("Failed to listen for Ctrl+C, shutdown requires killing the process");
        std::future::pending::<()>().await;
    }
}

/// Extracts the rate limiting identity of a request.
#[must_use]
pub fn client_id(headers: &HeaderMap) -> String {
    let header_value = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    header_value("x-client-id")
        .or_else(|| {
            header_value("x-forwarded-for")
                .and_then(|v| v.split(',').next())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        })
        .unwrap_or(ANONYMOUS_CLIENT)
        .to_string()
}

fn envelope_response(envelope: &ResponseEnvelope) -> Response {
    let status =
        StatusCode::from_u16(envelope.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(envelope)).into_response()
}

async fn handle_envelope(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let raw: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            return envelope_response(&ResponseEnvelope::error(
                ErrorCode::InvalidRequest,
                "Request body is not valid JSON",
                Some(Value::String(e.to_string())),
            ))
        }
    };

    let envelope = state.dispatcher.handle(&client_id(&headers), &raw).await;
    envelope_response(&envelope)
}

#[derive(Debug, Deserialize)]
struct DiscoveryQuery {
    #[serde(rename = "type")]
    kind: Option<String>,
}

async fn handle_discovery_shortcut(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<DiscoveryQuery>,
) -> Response {
    let raw = json!({"type": query.kind.as_deref().unwrap_or("all")});
    let envelope = state.dispatcher.handle(&client_id(&headers), &raw).await;
    envelope_response(&envelope)
}

async fn handle_preflight(State(state): State<AppState>, headers: HeaderMap) -> StatusCode {
    let allowed = headers
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|origin| state.dispatcher.context().is_cors_allowed(origin));

    if allowed {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::FORBIDDEN
    }
}

async fn handle_health(State(state): State<AppState>) -> impl IntoResponse {
    let config = state.dispatcher.context().get_config();
    Json(json!({"status": "ok", "service": config.name}))
}

async fn apply_policy_headers(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let origin = request
        .headers()
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let mut response = next.run(request).await;
    let context = state.dispatcher.context();
    let headers = response.headers_mut();

    for (name, value) in context.security_headers() {
        headers.insert(name, HeaderValue::from_static(value));
    }

    if let Some(cors) = origin.and_then(|o| context.cors_headers(&o)) {
        for (name, value) in cors {
            match HeaderValue::from_str(&value) {
                Ok(v) => {
                    headers.insert(name, v);
                }
                Err(_) => tracing::warn!(header = name, "Skipping unrepresentable CORS header"),
            }
        }
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_id_prefers_explicit_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-client-id", HeaderValue::from_static("script-7"));
        headers.insert("x-forwarded-for", HeaderValue::from_static("10.0.0.1"));
        assert_eq!(client_id(&headers), "script-7");
    }

    #[test]
    fn client_id_uses_first_forwarded_address() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.9, 10.0.0.1"),
        );
        assert_eq!(client_id(&headers), "203.0.113.9");
    }

    #[test]
    fn client_id_defaults_to_anonymous() {
        assert_eq!(client_id(&HeaderMap::new()), ANONYMOUS_CLIENT);

        let mut headers = HeaderMap::new();
        headers.insert("x-client-id", HeaderValue::from_static("  "));
        assert_eq!(client_id(&headers), ANONYMOUS_CLIENT);
    }

    #[test]
    fn envelope_status_follows_error_code() {
        let response = envelope_response(&ResponseEnvelope::error(
            ErrorCode::RateLimitExceeded,
            "slow down",
            None,
        ));
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

        let ok = envelope_response(&ResponseEnvelope::tool_result(json!(1)));
        assert_eq!(ok.status(), StatusCode::OK);
    }
}
