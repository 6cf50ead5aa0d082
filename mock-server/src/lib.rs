use axum::{
    body::Bytes,
    extract::RawQuery,
    http::{header, HeaderMap, HeaderName, Method, StatusCode},
    response::{AppendHeaders, IntoResponse},
    routing::{any, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

pub const MULTILINE_BODY: &str = "  first line  \n\tsecond   line\r\n\nthird\n";

/// Size of the `/large` body, past ureq's default 10 MiB read limit.
pub const LARGE_BODY_LEN: usize = 11 * 1024 * 1024;

/// What `/inspect` saw of the incoming request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Inspection {
    pub method: String,
    pub content_type: Option<String>,
    pub user_agent: Option<String>,
    pub query: Option<String>,
    pub body: String,
    pub body_len: usize,
}

pub fn app() -> Router {
    Router::new()
        .route("/echo", any(echo))
        .route("/inspect", any(inspect))
        .route("/resource", get(resource))
        .route("/invalid-json", get(invalid_json))
        .route("/array", get(array))
        .route("/multiline", get(multiline))
        .route("/multi-header", get(multi_header))
        .route("/large", get(large))
        .route("/server-error", any(server_error))
        .fallback(not_found)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    log::info!("mock server listening on {}", listener.local_addr()?);
    axum::serve(listener, app()).await
}

/// Reply with the request body, labelled as JSON.
async fn echo(body: Bytes) -> impl IntoResponse {
    let body = if body.is_empty() {
        Bytes::from_static(b"{}")
    } else {
        body
    };
    ([(header::CONTENT_TYPE, "application/json")], body)
}

async fn inspect(
    method: Method,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> Json<Inspection> {
    let header_str = |name: HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    Json(Inspection {
        method: method.to_string(),
        content_type: header_str(header::CONTENT_TYPE),
        user_agent: header_str(header::USER_AGENT),
        query,
        body: String::from_utf8_lossy(&body).into_owned(),
        body_len: body.len(),
    })
}

async fn resource() -> Json<serde_json::Value> {
    Json(serde_json::json!({"id": 1, "name": "stable", "tags": ["a", "b"]}))
}

async fn invalid_json() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/json")], "{invalid json")
}

async fn array() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/json")], "[1,2,3]")
}

async fn multiline() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], MULTILINE_BODY)
}

async fn multi_header() -> impl IntoResponse {
    (
        AppendHeaders([
            (HeaderName::from_static("x-multi"), "first"),
            (HeaderName::from_static("x-multi"), "second"),
        ]),
        Json(serde_json::json!({"ok": true})),
    )
}

async fn large() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain")],
        "a".repeat(LARGE_BODY_LEN),
    )
}

async fn server_error() -> impl IntoResponse {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({"error": "boom"})),
    )
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        [(header::CONTENT_TYPE, "text/plain")],
        "not found",
    )
}
