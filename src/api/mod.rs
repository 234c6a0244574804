//! HTTP surface: one implicit endpoint plus access logging.

pub mod handlers;
pub mod routes;

pub use handlers::{AppState, ResponseMode};
pub use routes::{create_router, RouterOptions};
