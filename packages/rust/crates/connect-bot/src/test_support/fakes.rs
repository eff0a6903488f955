use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use connect_menu::Keyboard;
use uuid::Uuid;

use crate::connect::{
    CatalogEntry, ContactCenter, KbResponse, KnowledgeBase, NewTicket, OutboundFile,
    OutboundSender, Peer, Subscriber,
};
use crate::session::{MemorySessionCache, SessionCache};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One delivered outbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
    Text {
        text: String,
        keyboard: Option<Keyboard>,
    },
    File {
        file_name: String,
        caption: String,
        is_image: bool,
        keyboard: Option<Keyboard>,
    },
}

/// Sender that records every message in order.
#[derive(Default)]
pub struct RecordingSender {
    sent: Mutex<Vec<Sent>>,
}

impl RecordingSender {
    pub fn sent(&self) -> Vec<Sent> {
        lock(&self.sent).clone()
    }

    /// Texts of text messages, in order.
    pub fn texts(&self) -> Vec<String> {
        lock(&self.sent)
            .iter()
            .filter_map(|sent| match sent {
                Sent::Text { text, .. } => Some(text.clone()),
                Sent::File { .. } => None,
            })
            .collect()
    }

    /// Keyboard attached to the most recent message, if any.
    pub fn last_keyboard(&self) -> Option<Keyboard> {
        lock(&self.sent).last().and_then(|sent| match sent {
            Sent::Text { keyboard, .. } | Sent::File { keyboard, .. } => keyboard.clone(),
        })
    }

    pub fn clear(&self) {
        lock(&self.sent).clear();
    }
}

#[async_trait]
impl OutboundSender for RecordingSender {
    async fn send_text(&self, _peer: &Peer, text: &str, keyboard: Option<&Keyboard>) -> Result<()> {
        lock(&self.sent).push(Sent::Text {
            text: text.to_string(),
            keyboard: keyboard.cloned(),
        });
        Ok(())
    }

    async fn send_file(
        &self,
        _peer: &Peer,
        file: &OutboundFile,
        keyboard: Option<&Keyboard>,
    ) -> Result<()> {
        lock(&self.sent).push(Sent::File {
            file_name: file.file_name.clone(),
            caption: file.caption.clone(),
            is_image: file.is_image,
            keyboard: keyboard.cloned(),
        });
        Ok(())
    }
}

/// Contact-center call observed by [`FakeContactCenter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContactCall {
    Start,
    RerouteTreatment,
    CloseTreatment,
    AppointSpecialist(Uuid),
    Reroute(Uuid),
    CreateTicket(NewTicket),
}

/// Scripted contact center.
#[derive(Default)]
pub struct FakeContactCenter {
    subscriber: Subscriber,
    available_specialists: Vec<Uuid>,
    subscriptions: HashMap<Uuid, Vec<Uuid>>,
    executors: Vec<CatalogEntry>,
    services: Vec<CatalogEntry>,
    service_types: HashMap<Uuid, Vec<CatalogEntry>>,
    ticket_id: Uuid,
    ticket_visible_after: usize,
    ticket_lookups: AtomicUsize,
    calls: Mutex<Vec<ContactCall>>,
}

impl FakeContactCenter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            ticket_id: Uuid::new_v4(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_subscriber(mut self, subscriber: Subscriber) -> Self {
        self.subscriber = subscriber;
        self
    }

    #[must_use]
    pub fn with_available_specialists(mut self, ids: Vec<Uuid>) -> Self {
        self.available_specialists = ids;
        self
    }

    #[must_use]
    pub fn with_subscription(mut self, line_id: Uuid) -> Self {
        self.subscriptions.insert(line_id, vec![Uuid::new_v4()]);
        self
    }

    #[must_use]
    pub fn with_executors(mut self, entries: Vec<CatalogEntry>) -> Self {
        self.executors = entries;
        self
    }

    #[must_use]
    pub fn with_services(mut self, entries: Vec<CatalogEntry>) -> Self {
        self.services = entries;
        self
    }

    #[must_use]
    pub fn with_service_types(mut self, service_id: Uuid, entries: Vec<CatalogEntry>) -> Self {
        self.service_types.insert(service_id, entries);
        self
    }

    /// Ticket lookups report the ticket only from the `n`-th attempt on (1-based).
    #[must_use]
    pub fn with_ticket_visible_after(mut self, n: usize) -> Self {
        self.ticket_visible_after = n;
        self
    }

    #[must_use]
    pub fn ticket_id(&self) -> Uuid {
        self.ticket_id
    }

    pub fn calls(&self) -> Vec<ContactCall> {
        lock(&self.calls).clone()
    }

    pub fn ticket_lookups(&self) -> usize {
        self.ticket_lookups.load(Ordering::SeqCst)
    }

    fn record(&self, call: ContactCall) {
        lock(&self.calls).push(call);
    }
}

#[async_trait]
impl ContactCenter for FakeContactCenter {
    async fn start(&self, _peer: &Peer) -> Result<()> {
        self.record(ContactCall::Start);
        Ok(())
    }

    async fn reroute_treatment(&self, _peer: &Peer) -> Result<()> {
        self.record(ContactCall::RerouteTreatment);
        Ok(())
    }

    async fn close_treatment(&self, _peer: &Peer) -> Result<()> {
        self.record(ContactCall::CloseTreatment);
        Ok(())
    }

    async fn specialist_available(&self, _peer: &Peer, specialist_id: Uuid) -> Result<bool> {
        Ok(self.available_specialists.contains(&specialist_id))
    }

    async fn specialists_available(&self, _peer: &Peer) -> Result<Vec<Uuid>> {
        Ok(self.available_specialists.clone())
    }

    async fn appoint_specialist(&self, _peer: &Peer, specialist_id: Uuid) -> Result<()> {
        self.record(ContactCall::AppointSpecialist(specialist_id));
        Ok(())
    }

    async fn subscriptions(&self, _peer: &Peer, line_id: Uuid) -> Result<Vec<Uuid>> {
        Ok(self.subscriptions.get(&line_id).cloned().unwrap_or_default())
    }

    async fn reroute(&self, _peer: &Peer, line_id: Uuid) -> Result<()> {
        self.record(ContactCall::Reroute(line_id));
        Ok(())
    }

    async fn subscriber(&self, peer: &Peer) -> Result<Subscriber> {
        Ok(Subscriber {
            user_id: peer.user_id,
            ..self.subscriber.clone()
        })
    }

    async fn ticket_executors(&self, _peer: &Peer) -> Result<Vec<CatalogEntry>> {
        Ok(self.executors.clone())
    }

    async fn ticket_services(&self, _peer: &Peer) -> Result<Vec<CatalogEntry>> {
        Ok(self.services.clone())
    }

    async fn ticket_service_types(
        &self,
        _peer: &Peer,
        service_id: Uuid,
    ) -> Result<Vec<CatalogEntry>> {
        Ok(self
            .service_types
            .get(&service_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn create_ticket(&self, _peer: &Peer, ticket: &NewTicket) -> Result<Uuid> {
        self.record(ContactCall::CreateTicket(ticket.clone()));
        Ok(self.ticket_id)
    }

    async fn ticket_exists(&self, _peer: &Peer, ticket_id: Uuid) -> Result<bool> {
        let attempt = self.ticket_lookups.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(ticket_id == self.ticket_id && attempt >= self.ticket_visible_after)
    }
}

/// Knowledge base returning one scripted response, or failing when none is set.
#[derive(Default)]
pub struct FakeKnowledgeBase {
    response: Option<KbResponse>,
    selected: Mutex<Vec<(Uuid, Uuid)>>,
}

impl FakeKnowledgeBase {
    #[must_use]
    pub fn answering(response: KbResponse) -> Self {
        Self {
            response: Some(response),
            selected: Mutex::default(),
        }
    }

    #[must_use]
    pub fn failing() -> Self {
        Self::default()
    }

    /// `(request_id, result_id)` acknowledgements received so far.
    pub fn selected(&self) -> Vec<(Uuid, Uuid)> {
        lock(&self.selected).clone()
    }
}

#[async_trait]
impl KnowledgeBase for FakeKnowledgeBase {
    async fn query(&self, _peer: &Peer) -> Result<KbResponse> {
        self.response
            .clone()
            .ok_or_else(|| anyhow!("knowledge base unavailable"))
    }

    async fn selected(&self, request_id: Uuid, result_id: Uuid) -> Result<()> {
        lock(&self.selected).push((request_id, result_id));
        Ok(())
    }
}

/// Memory cache that counts reads and writes.
#[derive(Default)]
pub struct CountingCache {
    inner: MemorySessionCache,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl CountingCache {
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionCache for CountingCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.set(key, value, ttl).await
    }

    fn backend_name(&self) -> &'static str {
        "counting"
    }
}
