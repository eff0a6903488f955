//! In-memory collaborators and a dispatcher harness for integration tests.

mod fakes;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use uuid::Uuid;

pub use fakes::{
    ContactCall, CountingCache, FakeContactCenter, FakeKnowledgeBase, RecordingSender, Sent,
};

use crate::config::Pacing;
use crate::connect::Peer;
use crate::dispatcher::{Collaborators, Dispatcher};
use crate::event::{InboundMessage, MessageData, MessageType};
use crate::session::{Session, SessionStore};

#[must_use]
pub fn new_peer() -> Peer {
    Peer {
        line_id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
    }
}

/// Event of `message_type` from the subscriber of `peer`.
#[must_use]
pub fn event(peer: &Peer, message_type: MessageType, text: &str) -> InboundMessage {
    InboundMessage {
        line_id: peer.line_id,
        user_id: peer.user_id,
        message_id: Uuid::new_v4(),
        message_type,
        author_id: Some(peer.user_id),
        message_time: String::new(),
        text: text.to_string(),
        data: MessageData::default(),
    }
}

/// Dispatcher over fakes with zero pacing, talking to one peer.
pub struct Harness {
    pub dispatcher: Dispatcher,
    pub sender: Arc<RecordingSender>,
    pub contact_center: Arc<FakeContactCenter>,
    pub knowledge_base: Arc<FakeKnowledgeBase>,
    pub cache: Arc<CountingCache>,
    pub peer: Peer,
}

impl Harness {
    /// # Errors
    /// Invalid menu YAML.
    pub fn new(
        menu_yaml: &str,
        contact_center: FakeContactCenter,
        knowledge_base: FakeKnowledgeBase,
    ) -> Result<Self> {
        Self::with_files_dir(
            menu_yaml,
            contact_center,
            knowledge_base,
            PathBuf::from("files"),
        )
    }

    /// # Errors
    /// Invalid menu YAML.
    pub fn with_files_dir(
        menu_yaml: &str,
        contact_center: FakeContactCenter,
        knowledge_base: FakeKnowledgeBase,
        files_dir: PathBuf,
    ) -> Result<Self> {
        let menu = connect_menu::parse_menu_config(menu_yaml)?;
        let sender = Arc::new(RecordingSender::default());
        let contact_center = Arc::new(contact_center);
        let knowledge_base = Arc::new(knowledge_base);
        let cache = Arc::new(CountingCache::default());
        let store = SessionStore::new(
            cache.clone(),
            Duration::from_secs(60),
            contact_center.clone(),
        );
        let dispatcher = Dispatcher::new(
            Arc::new(menu),
            store,
            Collaborators {
                contact_center: contact_center.clone(),
                knowledge_base: knowledge_base.clone(),
                sender: sender.clone(),
            },
            files_dir,
            Pacing::immediate(),
        );
        Ok(Self {
            dispatcher,
            sender,
            contact_center,
            knowledge_base,
            cache,
            peer: new_peer(),
        })
    }

    /// Deliver a text message and return the resulting state.
    ///
    /// # Errors
    /// Session write failures.
    pub async fn text(&self, text: &str) -> Result<String> {
        self.dispatcher
            .handle(&event(&self.peer, MessageType::Text, text))
            .await
    }

    /// # Errors
    /// Session write failures.
    pub async fn deliver(&self, message_type: MessageType) -> Result<String> {
        self.dispatcher
            .handle(&event(&self.peer, message_type, ""))
            .await
    }

    /// Current stored session (fresh when nothing was written yet).
    pub async fn session(&self) -> Session {
        self.dispatcher.store().get(&self.peer).await
    }
}
