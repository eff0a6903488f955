//! Session store: (user, line) → dialogue session over a TTL byte cache.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use connect_menu::Button;

use crate::connect::{ContactCenter, Peer, Subscriber};
use crate::error::DialogueError;
use crate::event::session_key;
use crate::observability::SessionEvent;

use super::cache::SessionCache;
use super::model::{Session, TicketPart, WizardStep};

/// Typed get/set/mutate wrapper over a [`SessionCache`].
///
/// Every mutation writes the whole session; there are no partial updates.
pub struct SessionStore {
    cache: Arc<dyn SessionCache>,
    ttl: Duration,
    contact_center: Arc<dyn ContactCenter>,
}

impl SessionStore {
    pub fn new(
        cache: Arc<dyn SessionCache>,
        ttl: Duration,
        contact_center: Arc<dyn ContactCenter>,
    ) -> Self {
        tracing::info!(
            event = SessionEvent::SessionBackendEnabled.as_str(),
            backend = cache.backend_name(),
            ttl_secs = ttl.as_secs(),
            "session store backend enabled"
        );
        Self {
            cache,
            ttl,
            contact_center,
        }
    }

    #[must_use]
    pub fn backend_name(&self) -> &'static str {
        self.cache.backend_name()
    }

    /// Cached session of `peer`, or a fresh GREETINGS session with the subscriber profile.
    ///
    /// A fresh session is not persisted here; the first mutation writes it. Cache read
    /// failures and undecodable payloads are logged and read as a miss.
    pub async fn get(&self, peer: &Peer) -> Session {
        let key = session_key(peer.user_id, peer.line_id);
        let cached = match self.cache.get(&key).await {
            Ok(cached) => cached,
            Err(error) => {
                tracing::warn!(
                    event = SessionEvent::SessionCacheMiss.as_str(),
                    session_key = %key,
                    error = %error,
                    "session cache read failed; starting a new session"
                );
                None
            }
        };
        if let Some(bytes) = cached {
            match serde_json::from_slice::<Session>(&bytes) {
                Ok(session) => {
                    tracing::debug!(
                        event = SessionEvent::SessionLoaded.as_str(),
                        session_key = %key,
                        state = %session.current_state,
                        history_len = session.history_state.len(),
                        "session loaded"
                    );
                    return session;
                }
                Err(error) => {
                    tracing::warn!(
                        event = SessionEvent::SessionDecodeFailed.as_str(),
                        session_key = %key,
                        error = %error,
                        "cached session payload is invalid; starting a new session"
                    );
                }
            }
        } else {
            tracing::debug!(
                event = SessionEvent::SessionCacheMiss.as_str(),
                session_key = %key,
                "no cached session"
            );
        }

        let user = match self.contact_center.subscriber(peer).await {
            Ok(user) => user,
            Err(error) => {
                tracing::warn!(
                    session_key = %key,
                    error = %error,
                    "subscriber profile unavailable; continuing with an empty profile"
                );
                Subscriber {
                    user_id: peer.user_id,
                    ..Subscriber::default()
                }
            }
        };
        Session::new(user)
    }

    /// Serialize and write the whole session with the configured TTL.
    ///
    /// # Errors
    /// Fails when the cache backend rejects the write.
    pub async fn set(&self, peer: &Peer, session: &Session) -> Result<()> {
        let key = session_key(peer.user_id, peer.line_id);
        let payload = serde_json::to_vec(session).context("failed to encode session")?;
        let bytes = payload.len();
        self.cache
            .set(&key, payload, self.ttl)
            .await
            .with_context(|| format!("session write failed for session_key={key}"))?;
        tracing::debug!(
            event = SessionEvent::SessionSaved.as_str(),
            session_key = %key,
            backend = self.cache.backend_name(),
            bytes,
            state = %session.current_state,
            "session saved"
        );
        Ok(())
    }

    /// # Errors
    /// Fails when the write fails.
    pub async fn mutate_vars(
        &self,
        peer: &Peer,
        session: &mut Session,
        name: &str,
        value: &str,
    ) -> Result<()> {
        session.vars.insert(name.to_string(), value.to_string());
        self.set(peer, session).await
    }

    /// # Errors
    /// Rejects an incomplete value for `step`, or fails when the write fails.
    pub async fn mutate_ticket_field(
        &self,
        peer: &Peer,
        session: &mut Session,
        step: WizardStep,
        part: TicketPart,
    ) -> Result<(), DialogueError> {
        session.ticket.set_field(step, part)?;
        self.set(peer, session).await?;
        Ok(())
    }

    /// # Errors
    /// Fails when the write fails.
    pub async fn mutate_saved_button(
        &self,
        peer: &Peer,
        session: &mut Session,
        button: Option<Button>,
    ) -> Result<()> {
        session.saved_button = button;
        self.set(peer, session).await
    }

    /// Move the session to `to`, recording history.
    ///
    /// Returns `false` without writing anything when `to` is already current.
    ///
    /// # Errors
    /// Fails when the write fails.
    pub async fn change_state(&self, peer: &Peer, session: &mut Session, to: &str) -> Result<bool> {
        if session.current_state == to {
            return Ok(false);
        }
        let from = std::mem::replace(&mut session.current_state, to.to_string());
        session.history_append(to);
        tracing::debug!(
            event = SessionEvent::SessionStateChanged.as_str(),
            from = %from,
            to,
            history_len = session.history_state.len(),
            "session state changed"
        );
        session.previous_state = from;
        self.set(peer, session).await?;
        Ok(true)
    }
}
