//! Key-value store access for the hit counter.
//!
//! This module handles:
//! - The store traits used by the request path
//! - The Redis-backed store
//! - An in-memory store for testing

pub mod memory;
pub mod redis;

use std::future::Future;

use crate::error::Result;
use crate::settings::StoreSettings;

pub use self::memory::{MemoryConnector, MemoryStore};
pub use self::redis::{RedisConnector, RedisStore};

/// One open connection to a key-value store.
pub trait CounterStore: Send {
    /// Whether `key` is present.
    fn exists(&mut self, key: &str) -> impl Future<Output = Result<bool>> + Send;

    /// Raw value under `key`.
    fn get(&mut self, key: &str) -> impl Future<Output = Result<Option<String>>> + Send;

    /// Overwrite `key` with an integer.
    fn set(&mut self, key: &str, value: i64) -> impl Future<Output = Result<()>> + Send;

    /// Atomically add `by` to `key` (absent counts as 0) and return the result.
    fn incr(&mut self, key: &str, by: i64) -> impl Future<Output = Result<i64>> + Send;
}

/// Opens store connections. Called once per request; nothing is pooled.
pub trait StoreConnector: Clone + Send + Sync + 'static {
    /// Connection type produced.
    type Store: CounterStore;

    /// Open a fresh connection with the given settings.
    fn connect(&self, settings: &StoreSettings)
        -> impl Future<Output = Result<Self::Store>> + Send;
}
