//! Dialogue sessions: model, history stack, TTL caches and the typed store.

mod cache;
mod history;
mod model;
mod store;
mod valkey;

pub use cache::{MemorySessionCache, SessionCache};
pub use model::{Session, Ticket, TicketPart, VAR_FOR_GOTO, VAR_FOR_SAVE, WizardStep};
pub use store::SessionStore;
pub use valkey::ValkeySessionCache;
