//! Byte-level TTL cache behind the session store.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;

/// Key/value store with per-entry expiry. A miss is `Ok(None)`, never an error.
#[async_trait]
pub trait SessionCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()>;

    /// Backend label for logs.
    fn backend_name(&self) -> &'static str;
}

/// In-process cache; expired entries are dropped on read and swept on every write.
#[derive(Default)]
pub struct MemorySessionCache {
    inner: RwLock<HashMap<String, (Instant, Vec<u8>)>>,
}

impl MemorySessionCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries currently held, expired or not.
    pub async fn entry_count(&self) -> usize {
        self.inner.read().await.len()
    }
}

#[async_trait]
impl SessionCache for MemorySessionCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        {
            let guard = self.inner.read().await;
            match guard.get(key) {
                None => return Ok(None),
                Some((expires_at, value)) if *expires_at > Instant::now() => {
                    return Ok(Some(value.clone()));
                }
                Some(_) => {}
            }
        }
        let mut guard = self.inner.write().await;
        if guard
            .get(key)
            .is_some_and(|(expires_at, _)| *expires_at <= Instant::now())
        {
            guard.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()> {
        let now = Instant::now();
        let mut guard = self.inner.write().await;
        guard.retain(|_, (expires_at, _)| *expires_at > now);
        guard.insert(key.to_string(), (now + ttl, value));
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
