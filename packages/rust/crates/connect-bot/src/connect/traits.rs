use anyhow::Result;
use async_trait::async_trait;
use connect_menu::Keyboard;
use uuid::Uuid;

use super::types::{CatalogEntry, KbResponse, NewTicket, OutboundFile, Peer, Subscriber};

/// Treatment routing, specialists, subscriptions and the ticket service.
#[async_trait]
pub trait ContactCenter: Send + Sync {
    /// Hand the treatment back to the bot from the start.
    async fn start(&self, peer: &Peer) -> Result<()>;

    /// Put the treatment into the specialist queue.
    async fn reroute_treatment(&self, peer: &Peer) -> Result<()>;

    async fn close_treatment(&self, peer: &Peer) -> Result<()>;

    async fn specialist_available(&self, peer: &Peer, specialist_id: Uuid) -> Result<bool>;

    /// Ids of specialists currently free on the peer's line.
    async fn specialists_available(&self, peer: &Peer) -> Result<Vec<Uuid>>;

    async fn appoint_specialist(&self, peer: &Peer, specialist_id: Uuid) -> Result<()>;

    /// Subscriptions of the peer to `line_id`; empty when the line is not permitted.
    async fn subscriptions(&self, peer: &Peer, line_id: Uuid) -> Result<Vec<Uuid>>;

    /// Move the treatment to another line.
    async fn reroute(&self, peer: &Peer, line_id: Uuid) -> Result<()>;

    async fn subscriber(&self, peer: &Peer) -> Result<Subscriber>;

    async fn ticket_executors(&self, peer: &Peer) -> Result<Vec<CatalogEntry>>;

    async fn ticket_services(&self, peer: &Peer) -> Result<Vec<CatalogEntry>>;

    /// Service types compatible with `service_id`.
    async fn ticket_service_types(&self, peer: &Peer, service_id: Uuid)
    -> Result<Vec<CatalogEntry>>;

    /// Submit a ticket; returns its id.
    async fn create_ticket(&self, peer: &Peer, ticket: &NewTicket) -> Result<Uuid>;

    /// Whether the ticket is already visible upstream.
    async fn ticket_exists(&self, peer: &Peer, ticket_id: Uuid) -> Result<bool>;
}

/// Free-text answer lookup.
#[async_trait]
pub trait KnowledgeBase: Send + Sync {
    /// Ranked candidates for the peer's latest question.
    async fn query(&self, peer: &Peer) -> Result<KbResponse>;

    /// Report which candidate was shown.
    async fn selected(&self, request_id: Uuid, result_id: Uuid) -> Result<()>;
}

/// Messages towards the subscriber.
#[async_trait]
pub trait OutboundSender: Send + Sync {
    async fn send_text(&self, peer: &Peer, text: &str, keyboard: Option<&Keyboard>) -> Result<()>;

    async fn send_file(
        &self,
        peer: &Peer,
        file: &OutboundFile,
        keyboard: Option<&Keyboard>,
    ) -> Result<()>;
}
