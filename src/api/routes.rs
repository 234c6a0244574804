//! HTTP API route definitions.

use std::time::Duration;

use axum::http::{HeaderName, HeaderValue};
use axum::{middleware, Router};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use super::handlers::{access_log, serve_hit, AppState};
use crate::launch::LaunchConfig;
use crate::store::StoreConnector;

/// Server-level settings applied as layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouterOptions {
    /// Per-request deadline.
    pub timeout: Duration,
    /// Keep-alive idle timeout advertised to clients.
    pub keepalive: Duration,
}

impl From<&LaunchConfig> for RouterOptions {
    fn from(launch: &LaunchConfig) -> Self {
        Self {
            timeout: launch.timeout_duration(),
            keepalive: launch.keepalive_duration(),
        }
    }
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self::from(&LaunchConfig::default())
    }
}

/// Create the API router. There is no routing table: every method and path
/// reaches the same handler.
pub fn create_router<C: StoreConnector>(state: AppState<C>, options: RouterOptions) -> Router {
    let keep_alive = HeaderValue::try_from(format!("timeout={}", options.keepalive.as_secs()))
        .unwrap_or_else(|_| HeaderValue::from_static("timeout=5"));

    Router::new()
        .fallback(serve_hit::<C>)
        .with_state(state)
        .layer(TimeoutLayer::new(options.timeout))
        .layer(SetResponseHeaderLayer::if_not_present(
            HeaderName::from_static("keep-alive"),
            keep_alive,
        ))
        .layer(middleware::from_fn(access_log))
        .layer(TraceLayer::new_for_http())
}
