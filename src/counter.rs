//! The hit-counter request path.
//!
//! Every hit resolves store settings through the configured
//! [`SettingsSource`], opens a fresh store connection and bumps one integer
//! key. Two increment strategies exist:
//!
//! ```text
//! Atomic:        INCR hit_count                       absent -> 1
//! CheckThenSet:  EXISTS / GET / SET hit_count         absent -> 1 + 1 = 2
//! ```
//!
//! `CheckThenSet` reproduces the classic example step by step, including its
//! race: two concurrent hits can read the same value and one update is lost.
//! `Atomic` is the default.

use serde::Deserialize;
use strum::{Display, EnumString};
use tracing::{debug, info, instrument};

use crate::error::{AppError, Result};
use crate::metrics;
use crate::settings::SettingsSource;
use crate::store::{CounterStore, StoreConnector};

/// Base value `CheckThenSet` assumes for an absent key before adding one.
pub const ABSENT_BASE: i64 = 1;

/// How a hit is written to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Display, EnumString, Default)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CounterMode {
    /// One atomic increment.
    #[default]
    Atomic,
    /// Existence check, read, add one, write back. Not atomic.
    CheckThenSet,
}

/// Greeting returned for a hit.
pub fn render_greeting(count: i64) -> String {
    format!("Hello World, this website has been visited {} times", count)
}

/// Counts hits in an external key-value store.
#[derive(Debug, Clone)]
pub struct HitCounter<C> {
    connector: C,
    source: SettingsSource,
    key: String,
    mode: CounterMode,
}

impl<C: StoreConnector> HitCounter<C> {
    /// Create a counter over `key`.
    pub fn new(connector: C, source: SettingsSource, key: impl Into<String>, mode: CounterMode) -> Self {
        Self {
            connector,
            source,
            key: key.into(),
            mode,
        }
    }

    /// Record one hit and return the new count.
    #[instrument(level = "debug", skip(self), fields(key = %self.key, mode = %self.mode))]
    pub async fn record_hit(&self) -> Result<i64> {
        let settings = self.source.resolve().await?;
        let mut store = self.connector.connect(&settings).await?;

        let count = match self.mode {
            CounterMode::Atomic => store.incr(&self.key, 1).await?,
            CounterMode::CheckThenSet => check_then_set(&mut store, &self.key).await?,
        };

        metrics::inc_hits();
        debug!(count, "Recorded hit");
        Ok(count)
    }
}

async fn check_then_set<S: CounterStore>(store: &mut S, key: &str) -> Result<i64> {
    let current = if store.exists(key).await? {
        match store.get(key).await? {
            Some(raw) => parse_count(key, &raw)?,
            // Expired or deleted between the two calls.
            None => ABSENT_BASE,
        }
    } else {
        info!(key, "Counter absent, starting fresh");
        ABSENT_BASE
    };

    let next = current
        .checked_add(1)
        .ok_or_else(|| AppError::CounterOverflow {
            key: key.to_string(),
        })?;
    store.set(key, next).await?;
    Ok(next)
}

fn parse_count(key: &str, raw: &str) -> Result<i64> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .filter(|n| *n >= 0)
        .ok_or_else(|| AppError::CorruptCounter {
            key: key.to_string(),
            value: raw.to_string(),
        })
}
