// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test harness for end-to-end client tests.
//!
//! Runs stand-ins for the API and admin services on loopback ports, each on
//! a background tokio runtime, so the blocking client can be exercised over
//! real TCP from ordinary `#[test]` functions.

use std::collections::BTreeMap;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get};
use axum::{Json, Router};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

use e2e_client::{ClientConfig, TestClient};

/// A widget as stored by the stub API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Widget {
    pub id: u32,
    pub name: String,
}

/// What the `/echo` routes saw on the way in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Echo {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub content_type: Option<String>,
    pub authorization: Option<String>,
    pub body: String,
}

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

type Widgets = Arc<Mutex<BTreeMap<u32, Widget>>>;

async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Json<Echo> {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_owned);
    Json(Echo {
        method: method.to_string(),
        path: uri.path().to_owned(),
        query: uri.query().map(str::to_owned),
        content_type: header("content-type"),
        authorization: header("authorization"),
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

fn not_found(id: u32) -> Response {
    (StatusCode::NOT_FOUND, format!("widget {id} not found")).into_response()
}

async fn list_widgets(State(widgets): State<Widgets>) -> Response {
    match widgets.lock() {
        Ok(w) => Json(w.values().cloned().collect::<Vec<_>>()).into_response(),
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

async fn get_widget(State(widgets): State<Widgets>, Path(id): Path<u32>) -> Response {
    match widgets.lock() {
        Ok(w) => match w.get(&id) {
            Some(widget) => Json(widget.clone()).into_response(),
            None => not_found(id),
        },
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

async fn put_widget(
    State(widgets): State<Widgets>,
    Path(id): Path<u32>,
    Json(mut widget): Json<Widget>,
) -> Response {
    widget.id = id;
    match widgets.lock() {
        Ok(mut w) => {
            w.insert(id, widget.clone());
            Json(widget).into_response()
        }
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

async fn create_widget(State(widgets): State<Widgets>, Json(widget): Json<Widget>) -> Response {
    match widgets.lock() {
        Ok(mut w) => {
            if w.contains_key(&widget.id) {
                return (StatusCode::CONFLICT, Json(json!({ "error": "widget exists" })))
                    .into_response();
            }
            w.insert(widget.id, widget.clone());
            (StatusCode::CREATED, Json(widget)).into_response()
        }
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

async fn delete_widget(State(widgets): State<Widgets>, Path(id): Path<u32>) -> Response {
    match widgets.lock() {
        Ok(mut w) => match w.remove(&id) {
            Some(_) => Json(json!({ "deleted": id })).into_response(),
            None => not_found(id),
        },
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

async fn plain_text() -> &'static str {
    "this is not json"
}

async fn empty_ok() -> StatusCode {
    StatusCode::OK
}

/// Router standing in for the API service.
pub fn api_router() -> Router {
    let widgets: Widgets = Arc::new(Mutex::new(BTreeMap::new()));
    Router::new()
        .route("/echo", any(echo))
        .route("/echo/{*rest}", any(echo))
        .route("/plain", get(plain_text))
        .route("/empty", any(empty_ok))
        .route("/widgets", get(list_widgets).post(create_widget))
        .route("/widgets/{id}", get(get_widget).put(put_widget).delete(delete_widget))
        .with_state(widgets)
        .layer(TraceLayer::new_for_http())
}

async fn admin_health() -> Json<Value> {
    Json(json!({ "status": "running", "service": "admin" }))
}

async fn admin_forbidden() -> Response {
    (StatusCode::FORBIDDEN, "admin only").into_response()
}

/// Router standing in for the admin service.
pub fn admin_router() -> Router {
    Router::new()
        .route("/health", get(admin_health))
        .route("/forbidden", any(admin_forbidden))
        .route("/echo", any(echo))
        .layer(TraceLayer::new_for_http())
}

/// Stub API and admin services, stopped on drop.
pub struct StubServices {
    api_port: u16,
    admin_port: u16,
    shutdown: CancellationToken,
    runtime: Option<tokio::runtime::Runtime>,
}

impl StubServices {
    /// Bind both services to free loopback ports and start serving.
    pub fn start() -> anyhow::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()?;
        let shutdown = CancellationToken::new();

        let api_port = runtime.block_on(serve(api_router(), shutdown.clone()))?;
        let admin_port = runtime.block_on(serve(admin_router(), shutdown.clone()))?;
        tracing::debug!(api_port, admin_port, "stub services listening");

        Ok(Self { api_port, admin_port, shutdown, runtime: Some(runtime) })
    }

    pub fn api_port(&self) -> u16 {
        self.api_port
    }

    pub fn admin_port(&self) -> u16 {
        self.admin_port
    }

    pub fn api_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.api_port)
    }

    pub fn admin_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.admin_port)
    }

    /// Client configuration pointing at these services.
    pub fn config(&self) -> ClientConfig {
        ClientConfig {
            api_url: self.api_url(),
            admin_url: self.admin_url(),
            ..ClientConfig::default()
        }
    }

    /// A client for these services with no credentials.
    pub fn client(&self) -> anyhow::Result<TestClient> {
        Ok(TestClient::new(self.config())?)
    }
}

async fn serve(router: Router, shutdown: CancellationToken) -> anyhow::Result<u16> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();
    tokio::spawn(async move {
        let server = axum::serve(listener, router).with_graceful_shutdown(shutdown.cancelled_owned());
        if let Err(e) = server.await {
            tracing::warn!(port, err = %e, "stub service stopped");
        }
    });
    Ok(port)
}

impl Drop for StubServices {
    fn drop(&mut self) {
        self.shutdown.cancel();
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_timeout(SHUTDOWN_TIMEOUT);
        }
    }
}

/// In-memory sink for formatted tracing output.
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// A plain-text fmt subscriber writing here, filtered by `directives`.
    pub fn subscriber(&self, directives: &str) -> impl tracing::Subscriber + Send + Sync {
        tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_ansi(false)
            .with_env_filter(EnvFilter::new(directives))
            .finish()
    }

    pub fn contents(&self) -> String {
        self.0.lock().map(|buf| String::from_utf8_lossy(&buf).into_owned()).unwrap_or_default()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.0.lock() {
            Ok(mut sink) => {
                sink.extend_from_slice(buf);
                Ok(buf.len())
            }
            Err(_) => Err(io::Error::other("log capture poisoned")),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = LogCapture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
