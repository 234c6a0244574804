//! Redis-backed counter store.

use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use tracing::{debug, instrument};

use crate::error::Result;
use crate::metrics;
use crate::settings::StoreSettings;

use super::{CounterStore, StoreConnector};

/// Connects to Redis with the settings resolved for each request.
#[derive(Debug, Clone, Default)]
pub struct RedisConnector;

impl RedisConnector {
    /// Create a new connector.
    pub fn new() -> Self {
        Self
    }
}

impl StoreConnector for RedisConnector {
    type Store = RedisStore;

    #[instrument(level = "debug", skip(self), fields(store = %settings))]
    async fn connect(&self, settings: &StoreSettings) -> Result<RedisStore> {
        let _timer = metrics::timer_store_connect();
        let url = settings.connection_url()?;
        let client = redis::Client::open(url.as_str())?;
        let conn = client.get_multiplexed_async_connection().await?;
        debug!("Connected to store");
        Ok(RedisStore { conn })
    }
}

/// Open Redis connection.
pub struct RedisStore {
    conn: MultiplexedConnection,
}

impl CounterStore for RedisStore {
    async fn exists(&mut self, key: &str) -> Result<bool> {
        let _timer = metrics::timer_store_command();
        let present: bool = self.conn.exists(key).await?;
        Ok(present)
    }

    async fn get(&mut self, key: &str) -> Result<Option<String>> {
        let _timer = metrics::timer_store_command();
        let value: Option<String> = self.conn.get(key).await?;
        Ok(value)
    }

    async fn set(&mut self, key: &str, value: i64) -> Result<()> {
        let _timer = metrics::timer_store_command();
        let () = self.conn.set(key, value).await?;
        Ok(())
    }

    async fn incr(&mut self, key: &str, by: i64) -> Result<i64> {
        let _timer = metrics::timer_store_command();
        let value: i64 = self.conn.incr(key, by).await?;
        Ok(value)
    }
}
