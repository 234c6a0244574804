//! Hit counter web service and static inventory responder.
//!
//! Two independent tools share this crate:
//!
//! - a web service that answers every request by bumping a counter in an
//!   external key-value store and reporting the new value;
//! - an inventory responder that prints fixed host and group data in the
//!   dynamic-inventory JSON format.
//!
//! ```text
//! GET /anything
//!   -> resolve store settings (implicit | inline | json file)
//!   -> connect (one connection per request)
//!   -> INCR hit_count
//!   <- 200 "Hello World, this website has been visited 7 times"
//! ```
//!
//! # Modules
//!
//! - [`config`]: Application configuration from environment
//! - [`launch`]: Worker count, bind address, timeouts and log sinks
//! - [`error`]: Unified error types
//! - [`settings`]: Store connection settings strategies
//! - [`store`]: Redis and in-memory counter stores
//! - [`counter`]: The hit-counter request path
//! - [`api`]: HTTP surface
//! - [`inventory`]: Static inventory data and JSON output
//! - [`logging`]: Tracing subscriber setup
//! - [`metrics`]: Prometheus metrics
//! - [`utils`]: Utility functions

pub mod api;
pub mod config;
pub mod counter;
pub mod error;
pub mod inventory;
pub mod launch;
pub mod logging;
pub mod metrics;
pub mod settings;
pub mod store;
pub mod utils;

pub use config::Config;
pub use error::{AppError, Result};
pub use launch::LaunchConfig;
