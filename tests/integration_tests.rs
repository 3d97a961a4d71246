//! Integration tests using mock HTTP servers
//!
//! Drives the full router: HTTP request → gateway → probe driver / token
//! endpoint (wiremock) → JSON envelope or redirect.

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use datasource_gateway::cli::router;
use datasource_gateway::{Gateway, GatewayConfig};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use test_case::test_case;
use tower::ServiceExt;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// Helpers
// ============================================================================

const PUBLIC_URL: &str = "https://gateway.example.com";
const APP_ORIGIN: &str = "https://app.example.com";

fn config_yaml(upstream: &str) -> String {
    format!(
        r#"
server:
  public_url: "{PUBLIC_URL}"
  allowed_origins: ["{APP_ORIGIN}"]
oauth:
  state_secret: "integration-secret"
datasources:
  - id: orders-api
    name: "Orders API"
    plugin: probe
    connection:
      url: "{upstream}/orders"
    structure:
      tables:
        - name: orders
          type: TABLE
          columns:
            - name: id
              type: integer
            - name: total
              type: numeric
          keys:
            - type: primary
              name: orders_pkey
              columns: [id]
  - id: broken-api
    name: "Broken API"
    plugin: probe
    connection:
      url: "{upstream}/broken"
  - id: sheets
    name: "Sheets"
    plugin: probe
    connection:
      url: "{upstream}/sheets"
    authentication:
      type: oauth2
      authorization_url: "https://accounts.example.com/o/oauth2/auth"
      access_token_url: "{upstream}/token"
      client_id: "client-1"
      client_secret: "secret-1"
      scopes: ["spreadsheets.readonly"]
mocks:
  - name: users
    description: "Sample users"
    datasource:
      plugin: probe
      connection:
        url: "{upstream}/orders"
"#
    )
}

async fn upstream() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/orders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sheets"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("code=good-code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "ya29.token",
            "token_type": "Bearer",
            "expires_in": 3599
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("code=bad-code"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant"
        })))
        .mount(&server)
        .await;
    server
}

fn app(server: &MockServer) -> Router {
    app_from_yaml(&config_yaml(&server.uri()))
}

fn app_from_yaml(yaml: &str) -> Router {
    let config = GatewayConfig::from_yaml(yaml).unwrap();
    router(
        Arc::new(Gateway::from_config(&config).unwrap()),
        config.server.request_timeout(),
    )
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(
        app,
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

/// Returns the status and `Location` header of a redirecting request
async fn follow(app: &Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.clone().oneshot(request).await.unwrap();
    let location = response
        .headers()
        .get(header::LOCATION)
        .map(|v| v.to_str().unwrap().to_string())
        .unwrap_or_default();
    (response.status(), location)
}

/// Number of requests the upstream received on a path
async fn upstream_hits(server: &MockServer, upstream_path: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == upstream_path)
        .count()
}

fn query_param(url: &str, name: &str) -> Option<String> {
    url::Url::parse(url)
        .unwrap()
        .query_pairs()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
}

fn begin_request(ds: &str, page: &str) -> Request<Body> {
    Request::get(format!("/api/v1/datasources/{ds}/pages/{page}/code"))
        .header(header::ORIGIN, APP_ORIGIN)
        .body(Body::empty())
        .unwrap()
}

fn callback_request(query: &str) -> Request<Body> {
    Request::get(format!("/api/v1/datasources/authorize?{query}"))
        .body(Body::empty())
        .unwrap()
}

// ============================================================================
// Health + Test Route
// ============================================================================

#[tokio::test]
async fn test_health() {
    let server = upstream().await;
    let (status, body) = get(&app(&server), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn test_connection_success() {
    let server = upstream().await;
    let (status, body) = post_json(
        &app(&server),
        "/api/v1/datasources/test",
        json!({
            "name": "New API",
            "plugin": "probe",
            "connection": {"url": format!("{}/orders", server.uri())}
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["success"], true);
    assert_eq!(body["data"]["invalids"], json!([]));
}

#[tokio::test]
async fn test_connection_failure_is_reported_not_raised() {
    let server = upstream().await;
    let (status, body) = post_json(
        &app(&server),
        "/api/v1/datasources/test",
        json!({
            "name": "Broken",
            "plugin": "probe",
            "connection": {"url": format!("{}/broken", server.uri())}
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["success"], false);
    assert!(body["data"]["message"].as_str().unwrap().contains("503"));
}

#[tokio::test]
async fn test_connection_invalid_config() {
    let server = upstream().await;
    let (status, body) = post_json(
        &app(&server),
        "/api/v1/datasources/test",
        json!({"name": "", "plugin": "probe"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["success"], false);
    assert_eq!(
        body["data"]["invalids"],
        json!(["Missing datasource name", "Missing connection url"])
    );
}

#[tokio::test]
async fn test_connection_malformed_body() {
    let server = upstream().await;
    let (status, body) = post_json(
        &app(&server),
        "/api/v1/datasources/test",
        json!({"name": "no plugin"}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "invalid_request");
}

// ============================================================================
// Structure Route
// ============================================================================

#[tokio::test]
async fn test_structure_served_and_cached() {
    let server = upstream().await;
    let app = app(&server);

    let (status, first) = get(&app, "/api/v1/datasources/orders-api/structure").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["data"]["tables"][0]["name"], "orders");
    assert_eq!(first["data"]["tables"][0]["type"], "TABLE");
    assert_eq!(first["data"]["tables"][0]["columns"][1]["type"], "numeric");

    let (_, second) = get(&app, "/api/v1/datasources/orders-api/structure").await;
    assert_eq!(first, second);

    assert_eq!(upstream_hits(&server, "/orders").await, 1);

    let (status, _) = get(&app, "/api/v1/datasources/orders-api/structure?ignoreCache=true").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(upstream_hits(&server, "/orders").await, 2);
}

#[test_case("/api/v1/datasources/missing/structure", StatusCode::NOT_FOUND, "not_found" ; "unknown datasource")]
#[test_case("/api/v1/datasources/broken-api/structure", StatusCode::BAD_GATEWAY, "connection_error" ; "unreachable datasource")]
#[test_case("/api/v1/datasources/bad%20id/structure", StatusCode::BAD_REQUEST, "invalid_request" ; "malformed id")]
#[test_case("/api/v1/datasources/orders-api/structure?ignoreCache=maybe", StatusCode::BAD_REQUEST, "invalid_request" ; "malformed query")]
#[tokio::test]
async fn test_structure_errors(uri: &str, expected: StatusCode, code: &str) {
    let server = upstream().await;
    let (status, body) = get(&app(&server), uri).await;

    assert_eq!(status, expected);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], code);
    assert!(body.get("data").is_none());
}

// ============================================================================
// Authorization Routes
// ============================================================================

#[tokio::test]
async fn test_authorization_handshake() {
    let server = upstream().await;
    let app = app(&server);

    let (status, location) = follow(&app, begin_request("sheets", "page-7")).await;
    assert_eq!(status, StatusCode::FOUND);
    assert!(location.starts_with("https://accounts.example.com/o/oauth2/auth?"));
    assert_eq!(
        query_param(&location, "redirect_uri").as_deref(),
        Some("https://gateway.example.com/api/v1/datasources/authorize")
    );
    assert_eq!(
        query_param(&location, "scope").as_deref(),
        Some("spreadsheets.readonly")
    );
    let state = query_param(&location, "state").unwrap();

    let (status, location) =
        follow(&app, callback_request(&format!("code=good-code&state={state}"))).await;
    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(
        location,
        "https://app.example.com/pages/page-7/edit/datasources/sheets?response_status=success"
    );

    // The same state cannot be used twice
    let (status, location) =
        follow(&app, callback_request(&format!("code=good-code&state={state}"))).await;
    assert_eq!(status, StatusCode::FOUND);
    assert!(location.ends_with("response_status=replayed_state"));
}

#[tokio::test]
async fn test_authorization_refreshes_cached_structure() {
    let server = upstream().await;
    let app = app(&server);
    get(&app, "/api/v1/datasources/sheets/structure").await;
    get(&app, "/api/v1/datasources/sheets/structure").await;
    assert_eq!(upstream_hits(&server, "/sheets").await, 1);

    let (_, location) = follow(&app, begin_request("sheets", "page-7")).await;
    let state = query_param(&location, "state").unwrap();
    follow(&app, callback_request(&format!("code=good-code&state={state}"))).await;

    get(&app, "/api/v1/datasources/sheets/structure").await;
    assert_eq!(upstream_hits(&server, "/sheets").await, 2);
}

#[tokio::test]
async fn test_authorization_exchange_rejected() {
    let server = upstream().await;
    let app = app(&server);

    let (_, location) = follow(&app, begin_request("sheets", "page-7")).await;
    let state = query_param(&location, "state").unwrap();

    let (status, location) =
        follow(&app, callback_request(&format!("code=bad-code&state={state}"))).await;
    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(
        location,
        "https://app.example.com/pages/page-7/edit/datasources/sheets?response_status=provider_error"
    );
}

#[tokio::test]
async fn test_authorization_provider_denied() {
    let server = upstream().await;
    let app = app(&server);

    let (_, location) = follow(&app, begin_request("sheets", "page-7")).await;
    let state = query_param(&location, "state").unwrap();

    let (status, location) = follow(
        &app,
        callback_request(&format!("error=access_denied&state={state}")),
    )
    .await;
    assert_eq!(status, StatusCode::FOUND);
    assert!(location.ends_with("/pages/page-7/edit/datasources/sheets?response_status=access_denied"));
}

#[tokio::test]
async fn test_authorization_garbage_state() {
    let server = upstream().await;
    let (status, location) =
        follow(&app(&server), callback_request("code=good-code&state=forged")).await;

    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(
        location,
        "https://gateway.example.com/datasources?response_status=invalid_state"
    );
}

#[test_case("code=good-code&state=a&state=b" ; "duplicate state")]
#[test_case("code=good-code" ; "missing state")]
#[tokio::test]
async fn test_authorization_unreadable_callback_redirects(query: &str) {
    let server = upstream().await;
    let (status, location) = follow(&app(&server), callback_request(query)).await;

    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(
        location,
        "https://gateway.example.com/datasources?response_status=invalid_request"
    );
}

#[tokio::test]
async fn test_authorization_slow_token_endpoint_still_redirects() {
    let server = upstream().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("code=slow-code"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": "ya29.slow", "token_type": "Bearer"}))
                .set_delay(Duration::from_millis(1500)),
        )
        .mount(&server)
        .await;
    let yaml = config_yaml(&server.uri()).replacen("server:\n", "server:\n  request_timeout_secs: 1\n", 1);
    let app = app_from_yaml(&yaml);

    let (_, location) = follow(&app, begin_request("sheets", "page-7")).await;
    let state = query_param(&location, "state").unwrap();

    let (status, location) =
        follow(&app, callback_request(&format!("code=slow-code&state={state}"))).await;
    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(
        location,
        "https://app.example.com/pages/page-7/edit/datasources/sheets?response_status=success"
    );
}

#[tokio::test]
async fn test_begin_errors() {
    let server = upstream().await;
    let app = app(&server);

    let (status, body) = send(&app, begin_request("orders-api", "page-7")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "unsupported_auth");

    let (status, body) = send(&app, begin_request("missing", "page-7")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "not_found");

    let (status, body) = send(&app, begin_request("sheets", "..")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_request");

    let request = Request::get("/api/v1/datasources/sheets/pages/page-7/code")
        .header(header::ORIGIN, "https://evil.example.net")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_request");
}

#[tokio::test]
async fn test_begin_uses_referer_origin() {
    let server = upstream().await;
    let app = app(&server);

    let request = Request::get("/api/v1/datasources/sheets/pages/page-9/code")
        .header(header::REFERER, "https://app.example.com/pages/page-9/edit")
        .body(Body::empty())
        .unwrap();
    let (status, location) = follow(&app, request).await;
    assert_eq!(status, StatusCode::FOUND);
    let state = query_param(&location, "state").unwrap();

    let (_, location) =
        follow(&app, callback_request(&format!("code=good-code&state={state}"))).await;
    assert!(location.starts_with("https://app.example.com/pages/page-9/"));
}

// ============================================================================
// Mock Routes
// ============================================================================

#[tokio::test]
async fn test_mocks_list_and_provision() {
    let server = upstream().await;
    let app = app(&server);

    let (status, body) = get(&app, "/api/v1/datasources/mocks").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["data"],
        json!([{"name": "users", "description": "Sample users", "plugin": "probe"}])
    );

    let (status, body) = post_json(&app, "/api/v1/datasources/mocks", json!({"name": "users"})).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["data"]["id"].as_str().unwrap().to_string();
    assert!(id.starts_with("mock-"));
    assert_eq!(body["data"]["name"], "users");

    // The provisioned datasource is immediately usable
    let (status, _) = get(&app, &format!("/api/v1/datasources/{id}/structure")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_mocks_unknown_name() {
    let server = upstream().await;
    let (status, body) = post_json(
        &app(&server),
        "/api/v1/datasources/mocks",
        json!({"name": "nonexistent"}),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn test_list_datasources_includes_provisioned_mock() {
    let server = upstream().await;
    let config = GatewayConfig::from_yaml(&config_yaml(&server.uri())).unwrap();
    let gateway = Gateway::from_config(&config).unwrap();

    let ids: Vec<String> = gateway
        .list_datasources()
        .await
        .unwrap()
        .into_iter()
        .map(|ds| ds.id.to_string())
        .collect();
    assert_eq!(ids.len(), 3);
    assert!(ids.contains(&"orders-api".to_string()));

    let mock = gateway.provision_mock("users").await.unwrap();
    let listed = gateway.list_datasources().await.unwrap();
    assert_eq!(listed.len(), 4);
    assert!(listed.iter().any(|ds| ds.id == mock.id));
}
