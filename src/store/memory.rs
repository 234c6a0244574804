//! In-memory counter store for unit testing.
//!
//! Connections made by one [`MemoryConnector`] share the same map, so it
//! behaves like a single external store without making network requests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::error::{AppError, Result};
use crate::settings::StoreSettings;

use super::{CounterStore, StoreConnector};

/// Shared state behind every connection of a connector.
#[derive(Debug, Default)]
struct Shared {
    data: Mutex<HashMap<String, String>>,
    fail_connect: AtomicBool,
    connections: AtomicU64,
    last_settings: Mutex<Option<StoreSettings>>,
}

/// Connector handing out connections to one in-process map.
#[derive(Debug, Clone, Default)]
pub struct MemoryConnector {
    shared: Arc<Shared>,
    /// Simulated latency per command.
    latency: Duration,
}

impl MemoryConnector {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store whose commands each take `latency`.
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            shared: Arc::default(),
            latency,
        }
    }

    /// Seed a raw value.
    pub fn insert(&self, key: &str, value: &str) {
        lock(&self.shared.data).insert(key.to_string(), value.to_string());
    }

    /// Raw value under `key`.
    pub fn value(&self, key: &str) -> Option<String> {
        lock(&self.shared.data).get(key).cloned()
    }

    /// Make subsequent connects fail (or succeed again).
    pub fn set_fail_connect(&self, fail: bool) {
        self.shared.fail_connect.store(fail, Ordering::SeqCst);
    }

    /// Number of connections opened so far.
    pub fn connections(&self) -> u64 {
        self.shared.connections.load(Ordering::SeqCst)
    }

    /// Settings passed to the most recent connect.
    pub fn last_settings(&self) -> Option<StoreSettings> {
        lock(&self.shared.last_settings).clone()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl StoreConnector for MemoryConnector {
    type Store = MemoryStore;

    async fn connect(&self, settings: &StoreSettings) -> Result<MemoryStore> {
        *lock(&self.shared.last_settings) = Some(settings.clone());

        if self.shared.fail_connect.load(Ordering::SeqCst) {
            return Err(AppError::StoreUnavailable(format!(
                "connection to {} refused",
                settings
            )));
        }

        self.shared.connections.fetch_add(1, Ordering::SeqCst);
        Ok(MemoryStore {
            shared: Arc::clone(&self.shared),
            latency: self.latency,
        })
    }
}

/// One connection to the in-memory store.
#[derive(Debug)]
pub struct MemoryStore {
    shared: Arc<Shared>,
    latency: Duration,
}

impl MemoryStore {
    async fn pause(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

impl CounterStore for MemoryStore {
    async fn exists(&mut self, key: &str) -> Result<bool> {
        self.pause().await;
        Ok(lock(&self.shared.data).contains_key(key))
    }

    async fn get(&mut self, key: &str) -> Result<Option<String>> {
        self.pause().await;
        Ok(lock(&self.shared.data).get(key).cloned())
    }

    async fn set(&mut self, key: &str, value: i64) -> Result<()> {
        self.pause().await;
        lock(&self.shared.data).insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn incr(&mut self, key: &str, by: i64) -> Result<i64> {
        self.pause().await;
        let mut data = lock(&self.shared.data);
        let current = match data.get(key) {
            Some(raw) => raw.parse::<i64>().map_err(|_| AppError::CorruptCounter {
                key: key.to_string(),
                value: raw.clone(),
            })?,
            None => 0,
        };
        let next = current
            .checked_add(by)
            .ok_or_else(|| AppError::CounterOverflow {
                key: key.to_string(),
            })?;
        data.insert(key.to_string(), next.to_string());
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connections_share_data() {
        let connector = MemoryConnector::new();
        let settings = StoreSettings::default();

        let mut first = connector.connect(&settings).await.unwrap();
        first.set("k", 41).await.unwrap();

        let mut second = connector.connect(&settings).await.unwrap();
        assert_eq!(second.incr("k", 1).await.unwrap(), 42);
        assert_eq!(connector.value("k").as_deref(), Some("42"));
        assert_eq!(connector.connections(), 2);
    }

    #[tokio::test]
    async fn incr_on_absent_key_starts_from_zero() {
        let connector = MemoryConnector::new();
        let mut store = connector.connect(&StoreSettings::default()).await.unwrap();

        assert!(!store.exists("fresh").await.unwrap());
        assert_eq!(store.incr("fresh", 1).await.unwrap(), 1);
        assert!(store.exists("fresh").await.unwrap());
    }

    #[tokio::test]
    async fn incr_rejects_non_integer_values() {
        let connector = MemoryConnector::new();
        connector.insert("k", "lots");
        let mut store = connector.connect(&StoreSettings::default()).await.unwrap();

        let err = store.incr("k", 1).await.unwrap_err();
        assert!(matches!(err, AppError::CorruptCounter { .. }));
    }

    #[tokio::test]
    async fn incr_past_maximum_is_rejected() {
        let connector = MemoryConnector::new();
        connector.insert("k", &i64::MAX.to_string());
        let mut store = connector.connect(&StoreSettings::default()).await.unwrap();

        let err = store.incr("k", 1).await.unwrap_err();
        assert!(matches!(err, AppError::CounterOverflow { .. }));
        assert_eq!(connector.value("k"), Some(i64::MAX.to_string()));
    }

    #[tokio::test]
    async fn connect_failure_is_reported() {
        let connector = MemoryConnector::new();
        connector.set_fail_connect(true);

        let err = connector.connect(&StoreSettings::default()).await.unwrap_err();
        assert!(matches!(err, AppError::StoreUnavailable(_)));
        assert_eq!(connector.connections(), 0);
        assert!(connector.last_settings().is_some());
    }
}
