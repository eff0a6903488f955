//! Per-dialogue serialization: events of one (user, line) run one at a time.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::observability::SessionEvent;

type GateMap = Arc<StdMutex<HashMap<String, Arc<GateEntry>>>>;

/// Keyed async lock. Entries live only while someone holds or awaits them.
#[derive(Clone, Default)]
pub struct SessionGate {
    inner: GateMap,
}

#[derive(Default)]
struct GateEntry {
    lock: Arc<Mutex<()>>,
    /// Holders plus waiters.
    permits: AtomicUsize,
}

/// Held for the duration of one event; dropping it admits the next waiter.
pub struct SessionGuard {
    _lock_guard: OwnedMutexGuard<()>,
    _permit: SessionPermit,
}

struct SessionPermit {
    session_key: String,
    inner: GateMap,
    entry: Arc<GateEntry>,
}

impl SessionGate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other event of `session_key` is in progress.
    pub async fn acquire(&self, session_key: &str) -> SessionGuard {
        let entry = {
            let mut guard = self
                .inner
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            let entry = guard
                .entry(session_key.to_string())
                .or_insert_with(|| Arc::new(GateEntry::default()))
                .clone();
            // Counted under the map lock so a concurrent release cannot evict it.
            entry.permits.fetch_add(1, Ordering::AcqRel);
            entry
        };

        // Registered before awaiting so a cancelled wait still releases the entry.
        let permit = SessionPermit {
            session_key: session_key.to_string(),
            inner: Arc::clone(&self.inner),
            entry: Arc::clone(&entry),
        };
        let lock_guard = Arc::clone(&entry.lock).lock_owned().await;
        tracing::trace!(
            event = SessionEvent::SessionGateAcquired.as_str(),
            session_key,
            "session gate acquired"
        );
        SessionGuard {
            _lock_guard: lock_guard,
            _permit: permit,
        }
    }

    #[doc(hidden)]
    #[must_use]
    pub fn active_sessions(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }
}

impl Drop for SessionPermit {
    fn drop(&mut self) {
        let previous = self.entry.permits.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(previous > 0, "session gate permit underflow");
        if previous != 1 {
            return;
        }
        let mut map = self
            .inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let should_remove = map
            .get(&self.session_key)
            .is_some_and(|current| Arc::ptr_eq(current, &self.entry))
            && self.entry.permits.load(Ordering::Acquire) == 0;
        if should_remove {
            map.remove(&self.session_key);
        }
    }
}
