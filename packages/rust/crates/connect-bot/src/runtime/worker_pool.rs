use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;

use crate::dispatcher::Dispatcher;
use crate::event::InboundMessage;

use super::session_gate::SessionGate;

/// Bound on concurrently handled events, shared with the health endpoint.
#[derive(Clone)]
pub struct InFlightLimit {
    semaphore: Arc<Semaphore>,
    max: usize,
}

impl InFlightLimit {
    #[must_use]
    pub fn new(max: usize) -> Self {
        let max = max.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(max)),
            max,
        }
    }

    #[must_use]
    pub fn max(&self) -> usize {
        self.max
    }

    /// Events currently being handled.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.max.saturating_sub(self.semaphore.available_permits())
    }
}

/// Drain the inbound queue into at most `limit.max()` concurrent workers.
///
/// Each worker holds the session gate of its dialogue, so one subscriber's events
/// never interleave. The task ends once the queue is closed and every
/// worker has finished.
pub fn spawn_dispatcher(
    dispatcher: Arc<Dispatcher>,
    mut rx: mpsc::Receiver<InboundMessage>,
    limit: InFlightLimit,
    session_gate: SessionGate,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut workers = JoinSet::new();

        while let Some(msg) = rx.recv().await {
            let Ok(permit) = Arc::clone(&limit.semaphore).acquire_owned().await else {
                break;
            };
            let worker_dispatcher = Arc::clone(&dispatcher);
            let worker_gate = session_gate.clone();
            workers.spawn(async move {
                let _permit = permit;
                let session_key = msg.session_key();
                let wait_started = Instant::now();
                let _session_guard = worker_gate.acquire(&session_key).await;
                let wait_ms = wait_started.elapsed().as_millis();
                if wait_ms >= 50 {
                    tracing::debug!(
                        session_key = %session_key,
                        wait_ms,
                        "worker waited for session gate"
                    );
                }
                if let Err(error) = worker_dispatcher.handle(&msg).await {
                    tracing::error!(
                        session_key = %session_key,
                        message_id = %msg.message_id,
                        error = %error,
                        "failed to persist dialogue state"
                    );
                }
            });

            while let Some(result) = workers.try_join_next() {
                if let Err(error) = result {
                    tracing::error!("dialogue worker crashed: {error}");
                }
            }
        }

        while let Some(result) = workers.join_next().await {
            if let Err(error) = result {
                tracing::error!("dialogue worker crashed: {error}");
            }
        }
    })
}
