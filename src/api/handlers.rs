//! HTTP API handlers.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use axum::body::Bytes;
use axum::extract::{Request, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::info;

use crate::config::{Config, ResponseKind};
use crate::counter::{render_greeting, HitCounter};
use crate::error::{AppError, Result};
use crate::metrics;
use crate::store::StoreConnector;

/// Log target for access log lines.
pub const ACCESS_TARGET: &str = "access";

/// What the endpoint answers with.
#[derive(Debug, Clone)]
pub enum ResponseMode {
    /// Record a hit and greet.
    Counter,
    /// Serve a local text file verbatim, re-read per request.
    MessageFile(PathBuf),
}

/// Application state shared with handlers.
#[derive(Debug, Clone)]
pub struct AppState<C> {
    /// Hit counter.
    pub counter: Arc<HitCounter<C>>,
    /// Response strategy.
    pub response: ResponseMode,
}

impl<C: StoreConnector> AppState<C> {
    /// Create new app state.
    pub fn new(counter: HitCounter<C>, response: ResponseMode) -> Self {
        Self {
            counter: Arc::new(counter),
            response,
        }
    }

    /// Build state from application configuration.
    pub fn from_config(config: &Config, connector: C) -> Self {
        let counter = HitCounter::new(
            connector,
            config.settings_source(),
            config.counter_key.clone(),
            config.counter_mode,
        );

        let response = match config.response_mode {
            ResponseKind::Counter => ResponseMode::Counter,
            ResponseKind::MessageFile => ResponseMode::MessageFile(config.message_file.clone()),
        };

        Self::new(counter, response)
    }
}

/// Handles every request regardless of method or path.
pub async fn serve_hit<C: StoreConnector>(State(state): State<AppState<C>>) -> Result<Response> {
    let body = match &state.response {
        ResponseMode::Counter => {
            let count = state.counter.record_hit().await?;
            Bytes::from(render_greeting(count))
        }
        ResponseMode::MessageFile(path) => {
            let contents =
                tokio::fs::read(path)
                    .await
                    .map_err(|source| AppError::MessageFile {
                        path: path.clone(),
                        source,
                    })?;
            Bytes::from(contents)
        }
    };

    Ok(plain_text(body))
}

/// `200 OK` plaintext response with an exact `Content-Length`.
pub fn plain_text(body: Bytes) -> Response {
    let length = HeaderValue::from(body.len());
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("text/plain")),
            (header::CONTENT_LENGTH, length),
        ],
        body,
    )
        .into_response()
}

/// Access log middleware: one line per request under the `access` target.
pub async fn access_log(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let version = request.version();

    let response = next.run(request).await;

    let status = response.status();
    let length = response
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();

    info!(
        target: ACCESS_TARGET,
        "\"{} {} {:?}\" {} {} {:.1}ms",
        method,
        path,
        version,
        status.as_u16(),
        length,
        start.elapsed().as_secs_f64() * 1000.0
    );
    metrics::record_http_latency(start, method.as_str(), status.as_u16());

    response
}
