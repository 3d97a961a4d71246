//! HTTP server mode
//!
//! REST routes under `/api/v1/datasources`. JSON results are wrapped in the
//! `{ success, data, error }` envelope; the authorization routes answer with
//! `302 Found` redirects.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServerSettings;
use crate::datasource::DatasourceConfig;
use crate::error::{Error, Result};
use crate::gateway::Gateway;
use crate::oauth::CallbackParams;
use crate::types::{DatasourceId, PageContext};

/// Route prefix of the datasource API
pub const API_PREFIX: &str = "/api/v1/datasources";

/// Query of the structure route
#[derive(Debug, Deserialize)]
struct StructureQuery {
    #[serde(default, rename = "ignoreCache")]
    ignore_cache: bool,
}

/// Request body for mock provisioning
#[derive(Debug, Deserialize)]
struct ProvisionRequest {
    name: String,
}

/// Error body of the response envelope
#[derive(Debug, Serialize)]
struct ApiError {
    code: &'static str,
    message: String,
}

/// Response wrapper
#[derive(Debug, Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ApiError>,
}

impl<T: Serialize> ApiResponse<T> {
    fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    fn error(e: &Error) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error: Some(ApiError {
                code: e.code(),
                message: e.to_string(),
            }),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::warn!(code = self.code(), error = %self, "Request failed");
        } else {
            tracing::debug!(code = self.code(), error = %self, "Request rejected");
        }
        (status, Json(ApiResponse::error(&self))).into_response()
    }
}

/// Wrap a result in the envelope
fn respond<T: Serialize>(status: StatusCode, result: Result<T>) -> Response {
    match result {
        Ok(data) => (status, Json(ApiResponse::success(data))).into_response(),
        Err(e) => e.into_response(),
    }
}

fn redirect(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// Build the gateway router
///
/// `request_timeout` bounds every route except the OAuth2 callback, which
/// must always answer with a redirect and is bounded by the token request
/// timeout instead.
pub fn router(gateway: Arc<Gateway>, request_timeout: Duration) -> Router {
    let callback_path = gateway.callback_path();
    let default_callback = format!("{API_PREFIX}/authorize");

    let timed = Router::new()
        .route("/health", get(health))
        .route(&format!("{API_PREFIX}/test"), post(test_datasource))
        .route(
            &format!("{API_PREFIX}/mocks"),
            get(list_mocks).post(provision_mock),
        )
        .route(&format!("{API_PREFIX}/:id/structure"), get(get_structure))
        .route(
            &format!("{API_PREFIX}/:id/pages/:page/code"),
            get(begin_authorization),
        )
        .layer(TimeoutLayer::new(request_timeout));

    let mut callbacks = Router::new().route(&default_callback, get(complete_authorization));
    if callback_path != default_callback {
        callbacks = callbacks.route(&callback_path, get(complete_authorization));
    }

    timed.merge(callbacks).with_state(gateway)
}

/// Start the HTTP server
pub async fn serve(gateway: Arc<Gateway>, settings: &ServerSettings) -> Result<()> {
    // Build CORS layer - the UI may be served from any origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = router(gateway, settings.request_timeout())
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", settings.host, settings.port)
        .parse()
        .map_err(|e| Error::config(format!("Invalid bind address {}: {e}", settings.host)))?;
    tracing::info!("Starting HTTP server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::config(format!("Failed to bind to {addr}: {e}")))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| Error::config(format!("Server error: {e}")))?;

    Ok(())
}

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// Test connectivity of a datasource configuration
async fn test_datasource(
    State(gateway): State<Arc<Gateway>>,
    body: std::result::Result<Json<DatasourceConfig>, JsonRejection>,
) -> Response {
    let result = async {
        let Json(config) = body.map_err(|e| Error::validation(e.body_text()))?;
        gateway.test_datasource(&config).await
    }
    .await;
    respond(StatusCode::OK, result)
}

/// Structure of a datasource
async fn get_structure(
    State(gateway): State<Arc<Gateway>>,
    Path(id): Path<String>,
    query: std::result::Result<Query<StructureQuery>, QueryRejection>,
) -> Response {
    let result = async {
        let id = DatasourceId::parse(id)?;
        let Query(query) = query.map_err(|e| Error::validation(e.body_text()))?;
        gateway.get_structure(&id, query.ignore_cache).await
    }
    .await;
    respond(StatusCode::OK, result)
}

/// Redirect the browser to the provider's consent page
async fn begin_authorization(
    State(gateway): State<Arc<Gateway>>,
    Path((id, page)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    let result = async {
        let id = DatasourceId::parse(id)?;
        let page = PageContext::parse(page)?;
        gateway
            .begin_authorization(&id, &page, request_origin(&headers))
            .await
    }
    .await;

    match result {
        Ok(url) => redirect(&url),
        Err(e) => e.into_response(),
    }
}

/// Provider callback
async fn complete_authorization(
    State(gateway): State<Arc<Gateway>>,
    query: std::result::Result<Query<CallbackParams>, QueryRejection>,
) -> Response {
    let outcome = match query {
        Ok(Query(callback)) => gateway.complete_authorization(callback).await,
        Err(e) => gateway.reject_authorization(&Error::validation(e.body_text())),
    };
    redirect(&outcome.redirect_url)
}

async fn list_mocks(State(gateway): State<Arc<Gateway>>) -> Response {
    respond(StatusCode::OK, gateway.list_mocks().await)
}

async fn provision_mock(
    State(gateway): State<Arc<Gateway>>,
    body: std::result::Result<Json<ProvisionRequest>, JsonRejection>,
) -> Response {
    let result = async {
        let Json(request) = body.map_err(|e| Error::validation(e.body_text()))?;
        gateway.provision_mock(&request.name).await
    }
    .await;
    respond(StatusCode::CREATED, result)
}

/// Origin of the page that sent the request, from `Origin` or `Referer`
fn request_origin(headers: &HeaderMap) -> Option<&str> {
    [header::ORIGIN, header::REFERER]
        .iter()
        .filter_map(|name| headers.get(name))
        .filter_map(|value| value.to_str().ok())
        .find(|value| !value.is_empty() && *value != "null")
}
