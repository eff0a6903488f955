//! Valkey/Redis-backed session cache for multi-instance deployments.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use redis::FromRedisValue;
use tokio::sync::Mutex;

use crate::observability::SessionEvent;

use super::cache::SessionCache;

#[derive(Debug)]
pub struct ValkeySessionCache {
    client: redis::Client,
    key_prefix: String,
    connection: Arc<Mutex<Option<redis::aio::MultiplexedConnection>>>,
}

impl ValkeySessionCache {
    /// # Errors
    /// Fails on a malformed URL; the connection itself is opened lazily.
    pub fn new(url: &str, key_prefix: &str) -> Result<Self> {
        let client = redis::Client::open(url)
            .with_context(|| format!("invalid valkey url for session cache: {url}"))?;
        Ok(Self {
            client,
            key_prefix: key_prefix.to_string(),
            connection: Arc::new(Mutex::new(None)),
        })
    }

    #[must_use]
    pub fn key_prefix(&self) -> &str {
        &self.key_prefix
    }

    fn session_key(&self, key: &str) -> String {
        format!("{}:{key}", self.key_prefix)
    }

    async fn ensure_connection(
        &self,
        connection: &mut Option<redis::aio::MultiplexedConnection>,
    ) -> Result<()> {
        if connection.is_some() {
            return Ok(());
        }
        *connection = Some(
            self.client
                .get_multiplexed_async_connection()
                .await
                .context("failed to open valkey connection for session cache")?,
        );
        tracing::debug!(
            event = SessionEvent::SessionValkeyConnected.as_str(),
            key_prefix = %self.key_prefix,
            "valkey session cache connected"
        );
        Ok(())
    }

    /// Run a command, reconnecting once on failure.
    async fn run_command<T, F>(&self, operation: &'static str, build: F) -> Result<T>
    where
        T: FromRedisValue + Send,
        F: Fn() -> redis::Cmd,
    {
        let mut last_err: Option<anyhow::Error> = None;
        for attempt in 0..2 {
            let mut conn_guard = self.connection.lock().await;
            self.ensure_connection(&mut conn_guard).await?;
            let conn = conn_guard
                .as_mut()
                .ok_or_else(|| anyhow::anyhow!("valkey session cache connection unavailable"))?;
            let result: redis::RedisResult<T> = build().query_async(conn).await;
            match result {
                Ok(value) => {
                    if attempt > 0 {
                        tracing::debug!(
                            event = SessionEvent::SessionValkeyCommandRetrySucceeded.as_str(),
                            operation,
                            attempt = attempt + 1,
                            "valkey command succeeded after retry"
                        );
                    }
                    return Ok(value);
                }
                Err(err) => {
                    tracing::warn!(
                        event = SessionEvent::SessionValkeyCommandRetryFailed.as_str(),
                        operation,
                        attempt = attempt + 1,
                        error = %err,
                        "valkey command attempt failed; reconnecting"
                    );
                    *conn_guard = None;
                    last_err = Some(anyhow::anyhow!(err).context("valkey session command failed"));
                }
            }
        }
        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("valkey command failed for unknown reason")))
    }
}

#[async_trait]
impl SessionCache for ValkeySessionCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let redis_key = self.session_key(key);
        self.run_command("session_get", || {
            let mut cmd = redis::cmd("GET");
            cmd.arg(&redis_key);
            cmd
        })
        .await
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()> {
        let redis_key = self.session_key(key);
        let ttl_secs = ttl.as_secs().max(1);
        self.run_command::<(), _>("session_set", || {
            let mut cmd = redis::cmd("SET");
            cmd.arg(&redis_key).arg(value.as_slice()).arg("EX").arg(ttl_secs);
            cmd
        })
        .await
    }

    fn backend_name(&self) -> &'static str {
        "valkey"
    }
}
