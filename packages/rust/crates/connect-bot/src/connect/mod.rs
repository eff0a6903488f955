//! Contact-center collaborators: traits, wire types and the HTTP client.

mod client;
mod traits;
mod types;

pub use client::ConnectClient;
pub use traits::{ContactCenter, KnowledgeBase, OutboundSender};
pub use types::{
    CatalogEntry, KB_SOURCE_GOODBYES, KbAnswer, KbResponse, NewTicket, OutboundFile, Peer,
    Subscriber,
};
