use std::fmt::Display;

use redis::{AsyncCommands, Client};
use serde::{de::DeserializeOwned, Serialize};
use tokio::{sync::mpsc, task::JoinHandle};

use crate::error::{AppError, AppResult};

/// Redis keys used by the service
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Login session token
    Session(String),
    /// Session tokens issued to one user
    UserSessions(i32),
    MovieDetail(i32),
    PersonDetail(i32),
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::Session(token) => write!(f, "session:{}", token),
            CacheKey::UserSessions(user_id) => write!(f, "user_sessions:{}", user_id),
            CacheKey::MovieDetail(id) => write!(f, "movie:{}", id),
            CacheKey::PersonDetail(id) => write!(f, "person:{}", id),
        }
    }
}

/// Opens a Redis client; no connection is made until the first command
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    Ok(Client::open(redis_url)?)
}

/// Serialized entry queued for the background writer
struct PendingWrite {
    key: String,
    json: String,
    ttl: u64,
}

fn to_json<T: Serialize>(value: &T) -> AppResult<String> {
    serde_json::to_string(value)
        .map_err(|e| AppError::Internal(format!("Cache serialization error: {}", e)))
}

async fn store(client: &Client, key: String, json: String, ttl: u64) -> AppResult<()> {
    let mut conn = client.get_multiplexed_async_connection().await?;
    let _: () = conn.set_ex(key, json, ttl).await?;
    Ok(())
}

/// JSON values in Redis: sessions are written synchronously, detail pages
/// through a background writer
#[derive(Clone)]
pub struct Cache {
    client: Client,
    writes: mpsc::UnboundedSender<PendingWrite>,
}

/// Owner of the background writer task
pub struct CacheWriterHandle {
    stop: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl CacheWriterHandle {
    /// Signals the writer and waits until every queued write has been applied
    pub async fn shutdown(self) {
        if self.stop.send(()).await.is_err() {
            tracing::warn!("Cache writer already stopped");
        }
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Cache writer task failed");
        }
    }
}

impl Cache {
    /// Wraps `client` and spawns the background writer on the current runtime
    pub fn new(client: Client) -> (Self, CacheWriterHandle) {
        let (writes, queue) = mpsc::unbounded_channel();
        let (stop, stop_rx) = mpsc::channel(1);

        let task = tokio::spawn(run_writer(client.clone(), queue, stop_rx));

        (Self { client, writes }, CacheWriterHandle { stop, task })
    }

    /// Deserialized value under `key`, `None` on a miss
    pub async fn get_from_cache<T: DeserializeOwned>(
        &self,
        key: &CacheKey,
    ) -> AppResult<Option<T>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let raw: Option<String> = conn.get(key.to_string()).await?;

        raw.map(|json| {
            serde_json::from_str(&json).map_err(|e| {
                AppError::Internal(format!("Cache deserialization error for {}: {}", key, e))
            })
        })
        .transpose()
    }

    /// Stores a value and waits for Redis to acknowledge it
    ///
    /// Used for sessions, which must be readable by the very next request.
    pub async fn set<T: Serialize>(&self, key: &CacheKey, value: &T, ttl: u64) -> AppResult<()> {
        store(&self.client, key.to_string(), to_json(value)?, ttl).await
    }

    pub async fn delete(&self, key: &CacheKey) -> AppResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: () = conn.del(key.to_string()).await?;
        Ok(())
    }

    /// Adds `member` to the set under `key` and resets the set's expiry
    pub async fn add_to_set(&self, key: &CacheKey, member: &str, ttl: u64) -> AppResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = key.to_string();
        let _: () = redis::pipe()
            .sadd(&key, member)
            .ignore()
            .expire(&key, i64::try_from(ttl).unwrap_or(i64::MAX))
            .ignore()
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    /// Removes the set under `key` and returns its members
    pub async fn take_set(&self, key: &CacheKey) -> AppResult<Vec<String>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = key.to_string();
        let (members, _): (Vec<String>, i64) = redis::pipe()
            .atomic()
            .smembers(&key)
            .del(&key)
            .query_async(&mut conn)
            .await?;
        Ok(members)
    }

    /// Queues a write for the background writer and returns immediately
    pub fn set_in_background<T: Serialize>(&self, key: &CacheKey, value: &T, ttl: u64) {
        let json = match to_json(value) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(error = %e, key = %key, "Skipping cache write");
                return;
            }
        };

        let write = PendingWrite {
            key: key.to_string(),
            json,
            ttl,
        };
        if self.writes.send(write).is_err() {
            tracing::warn!(key = %key, "Cache writer stopped, dropping write");
        }
    }
}

async fn run_writer(
    client: Client,
    mut queue: mpsc::UnboundedReceiver<PendingWrite>,
    mut stop: mpsc::Receiver<()>,
) {
    tracing::debug!("Cache writer started");

    loop {
        tokio::select! {
            Some(write) = queue.recv() => apply(&client, write).await,
            _ = stop.recv() => break,
        }
    }

    queue.close();
    let mut flushed = 0usize;
    while let Some(write) = queue.recv().await {
        apply(&client, write).await;
        flushed += 1;
    }
    tracing::info!(flushed, "Cache writer stopped");
}

async fn apply(client: &Client, write: PendingWrite) {
    let key = write.key.clone();
    if let Err(e) = store(client, write.key, write.json, write.ttl).await {
        tracing::error!(error = %e, key = %key, "Background cache write failed");
    }
}
