//! Integration tests for the HTTP router.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use component_docs_mcp::config::{Config, ConfigPatch, CorsConfig, RateLimitConfig};
use component_docs_mcp::context::ServerContext;
use component_docs_mcp::docs::{register_documentation, Catalog};
use component_docs_mcp::mcp::{build_router, ProtocolDispatcher};

fn router_with(config: Config) -> Router {
    let dispatcher = Arc::new(ProtocolDispatcher::new(Arc::new(ServerContext::new(config))));
    register_documentation(&dispatcher, Arc::new(Catalog::builtin().expect("catalog")));
    build_router(dispatcher)
}

fn router() -> Router {
    router_with(Config::default())
}

fn post(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/mcp")
        .header("content-type", "application/json")
        .body(body.into())
        .expect("req")
}

async fn json_body(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), 1 << 20)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

#[tokio::test]
async fn test_health_returns_ok() {
    let req = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .expect("req");
    let resp = router().oneshot(req).await.expect("resp");
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], Config::default().name);
}

#[tokio::test]
async fn test_tool_call_succeeds() {
    let resp = router()
        .oneshot(post(
            json!({"tool": "get_component", "params": {"name": "Button"}}).to_string(),
        ))
        .await
        .expect("resp");
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["status"], "success");
    assert_eq!(body["result"]["name"], "Button");
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let resp = router().oneshot(post("{not json")).await.expect("resp");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = json_body(resp).await;
    assert_eq!(body["error"]["code"], "INVALID_REQUEST");
}

#[tokio::test]
async fn test_non_utf8_body_is_invalid_request() {
    let resp = router()
        .oneshot(post(vec![0xff_u8, 0xfe, 0x7b]))
        .await
        .expect("resp");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = json_body(resp).await;
    assert_eq!(body["status"], "error");
    assert_eq!(body["error"]["code"], "INVALID_REQUEST");
}

#[tokio::test]
async fn test_invalid_envelope_is_bad_request() {
    let resp = router()
        .oneshot(post(json!({"tool": "get_component"}).to_string()))
        .await
        .expect("resp");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_tool_is_not_found() {
    let resp = router()
        .oneshot(post(json!({"tool": "missing", "params": {}}).to_string()))
        .await
        .expect("resp");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body = json_body(resp).await;
    assert_eq!(body["error"]["code"], "TOOL_NOT_FOUND");
}

#[tokio::test]
async fn test_handler_error_is_internal_error() {
    let resp = router()
        .oneshot(post(
            json!({"tool": "get_component", "params": {"name": "Nope"}}).to_string(),
        ))
        .await
        .expect("resp");
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(resp).await;
    assert_eq!(body["error"]["code"], "INTERNAL_ERROR");
}

#[tokio::test]
async fn test_rate_limited_client_gets_429() {
    let app = router_with(Config::default().merged(ConfigPatch {
        rate_limit: Some(RateLimitConfig {
            enabled: true,
            max_requests: 1,
            window_ms: 60_000,
        }),
        ..ConfigPatch::default()
    }));
    let discovery = || {
        Request::builder()
            .uri("/mcp?type=tools")
            .header("x-client-id", "burst")
            .body(Body::empty())
            .expect("req")
    };

    let first = app.clone().oneshot(discovery()).await.expect("resp");
    assert_eq!(first.status(), StatusCode::OK);

    let second = app.clone().oneshot(discovery()).await.expect("resp");
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    let body = json_body(second).await;
    assert_eq!(body["error"]["code"], "RATE_LIMIT_EXCEEDED");

    let other = Request::builder()
        .uri("/mcp?type=tools")
        .header("x-client-id", "someone-else")
        .body(Body::empty())
        .expect("req");
    let resp = app.oneshot(other).await.expect("resp");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_discovery_shortcut_defaults_to_all() {
    let req = Request::builder()
        .uri("/mcp")
        .body(Body::empty())
        .expect("req");
    let resp = router().oneshot(req).await.expect("resp");
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["tools"].as_array().map(Vec::len), Some(4));
    assert_eq!(body["resources"].as_array().map(Vec::len), Some(3));
}

#[tokio::test]
async fn test_discovery_shortcut_rejects_unknown_type() {
    let req = Request::builder()
        .uri("/mcp?type=prompts")
        .body(Body::empty())
        .expect("req");
    let resp = router().oneshot(req).await.expect("resp");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_security_headers_on_every_response() {
    let resp = router().oneshot(post("garbage")).await.expect("resp");
    let headers = resp.headers();
    assert!(headers.contains_key("content-security-policy"));
    assert_eq!(headers["x-frame-options"], "DENY");
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert!(!headers.contains_key("strict-transport-security"));
}

#[tokio::test]
async fn test_cors_headers_for_allowed_origin() {
    let req = Request::builder()
        .uri("/health")
        .header("origin", "https://app.example")
        .body(Body::empty())
        .expect("req");
    let resp = router().oneshot(req).await.expect("resp");
    assert!(resp
        .headers()
        .contains_key("access-control-allow-origin"));
}

#[tokio::test]
async fn test_preflight_respects_allowed_origins() {
    let app = router_with(Config::default().merged(ConfigPatch {
        cors: Some(CorsConfig {
            allowed_origins: vec!["https://allowed.example".to_string()],
            ..CorsConfig::default()
        }),
        ..ConfigPatch::default()
    }));
    let preflight = |origin: &str| {
        Request::builder()
            .method("OPTIONS")
            .uri("/mcp")
            .header("origin", origin)
            .body(Body::empty())
            .expect("req")
    };

    let allowed = app
        .clone()
        .oneshot(preflight("https://allowed.example"))
        .await
        .expect("resp");
    assert_eq!(allowed.status(), StatusCode::NO_CONTENT);
    assert_eq!(
        allowed.headers()["access-control-allow-origin"],
        "https://allowed.example"
    );

    let denied = app
        .oneshot(preflight("https://evil.example"))
        .await
        .expect("resp");
    assert_eq!(denied.status(), StatusCode::FORBIDDEN);
    assert!(!denied
        .headers()
        .contains_key("access-control-allow-origin"));
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let app = router_with(Config::default().merged(ConfigPatch {
        max_request_size: Some(64),
        ..ConfigPatch::default()
    }));
    let padding = "x".repeat(256);
    let resp = app
        .oneshot(post(
            json!({"tool": "search_components", "params": {"query": padding}}).to_string(),
        ))
        .await
        .expect("resp");
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_body_limit_is_fixed_when_router_is_built() {
    let dispatcher = Arc::new(ProtocolDispatcher::new(Arc::new(ServerContext::new(
        Config::default().merged(ConfigPatch {
            max_request_size: Some(64),
            ..ConfigPatch::default()
        }),
    ))));
    let app = build_router(Arc::clone(&dispatcher));
    dispatcher.context().update_config(ConfigPatch {
        max_request_size: Some(1 << 20),
        ..ConfigPatch::default()
    });

    let padding = "x".repeat(256);
    let resp = app
        .oneshot(post(json!({"type": "all", "pad": padding}).to_string()))
        .await
        .expect("resp");
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
}
