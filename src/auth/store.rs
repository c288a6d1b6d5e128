use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use super::clock::{Clock, SystemClock};
use super::error::{AuthError, StoreError};
use crate::config::RedisConfig;

/// Single-slot-per-principal record of the currently valid token.
///
/// Implementations must make each call atomic for its key. No cross-key or
/// multi-call transactions are required.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Write or overwrite the principal's active token, expiring after `ttl`
    async fn put(&self, user_id: i64, token: &str, ttl: Duration) -> Result<(), StoreError>;

    async fn get(&self, user_id: i64) -> Result<Option<String>, StoreError>;

    /// Remove the principal's active token. Missing records are not an error.
    async fn delete(&self, user_id: i64) -> Result<(), StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;

    async fn close(&self) {}
}

/// Redis-backed store using `SET key value EX ttl`, `GET key` and `DEL key`.
#[derive(Clone)]
pub struct RedisTokenStore {
    conn: ConnectionManager,
    timeout: Duration,
    key_prefix: String,
}

impl RedisTokenStore {
    /// Open the client and verify the server answers within the configured timeout.
    pub async fn connect(config: &RedisConfig) -> Result<Self, AuthError> {
        let client = redis::Client::open(config.url.as_str())
            .map_err(|e| AuthError::ConfigUnavailable(format!("invalid redis url: {e}")))?;
        let timeout = Duration::from_secs(config.timeout_secs);

        let conn = tokio::time::timeout(timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| StoreError::Timeout(timeout))?
            .map_err(StoreError::from)?;

        let store = Self {
            conn,
            timeout,
            key_prefix: config.key_prefix.clone(),
        };
        store.ping().await?;

        tracing::info!("Connected to token store");
        Ok(store)
    }

    fn key(&self, user_id: i64) -> String {
        token_key(&self.key_prefix, user_id)
    }

    async fn timed<T, F>(&self, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = redis::RedisResult<T>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result.map_err(StoreError::from),
            Err(_) => Err(StoreError::Timeout(self.timeout)),
        }
    }
}

/// Key under which a principal's active token lives
pub fn token_key(prefix: &str, user_id: i64) -> String {
    format!("{prefix}:{user_id}")
}

#[async_trait]
impl TokenStore for RedisTokenStore {
    async fn put(&self, user_id: i64, token: &str, ttl: Duration) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let key = self.key(user_id);
        // Redis rejects EX 0
        let seconds = ttl.as_secs().max(1);
        self.timed(conn.set_ex::<_, _, ()>(key, token, seconds)).await
    }

    async fn get(&self, user_id: i64) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn.clone();
        let key = self.key(user_id);
        self.timed(conn.get::<_, Option<String>>(key)).await
    }

    async fn delete(&self, user_id: i64) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let key = self.key(user_id);
        self.timed(conn.del::<_, ()>(key)).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        self.timed(async move { redis::cmd("PING").query_async::<_, String>(&mut conn).await })
            .await
            .map(|_| ())
    }

    async fn close(&self) {
        tracing::info!("Closed token store connection");
    }
}

/// In-process store with lazy TTL expiry, driven by the supplied clock.
pub struct MemoryTokenStore {
    entries: RwLock<HashMap<i64, (String, DateTime<Utc>)>>,
    clock: Arc<dyn Clock>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
        }
    }

    pub async fn len(&self) -> usize {
        let now = self.clock.now();
        self.entries
            .read()
            .await
            .values()
            .filter(|(_, expires)| *expires > now)
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for MemoryTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn put(&self, user_id: i64, token: &str, ttl: Duration) -> Result<(), StoreError> {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
        let expires = self
            .clock
            .now()
            .checked_add_signed(ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.entries
            .write()
            .await
            .insert(user_id, (token.to_string(), expires));
        Ok(())
    }

    async fn get(&self, user_id: i64) -> Result<Option<String>, StoreError> {
        let now = self.clock.now();
        let entries = self.entries.read().await;
        Ok(entries
            .get(&user_id)
            .filter(|(_, expires)| *expires > now)
            .map(|(token, _)| token.clone()))
    }

    async fn delete(&self, user_id: i64) -> Result<(), StoreError> {
        self.entries.write().await.remove(&user_id);
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
