//! Menu-driven text bot for a contact-center platform.
//!
//! - Inbound webhook events are acknowledged immediately and handled by a worker pool,
//!   one event per dialogue at a time.
//! - The dispatcher turns an event plus the cached session into outbound messages,
//!   specialist hand-offs or ticket wizard steps, and the next dialogue state.
//! - Sessions live in a TTL cache (memory or Valkey) and may be lost on eviction.

#![allow(missing_docs)]

mod config;
mod connect;
mod dispatcher;
mod error;
mod event;
mod observability;
mod runtime;
mod session;
mod template;
#[doc(hidden)]
pub mod test_support;

pub use config::{
    BotConfig, ConnectConfig, ConnectSettings, DEFAULT_BIND, DEFAULT_SESSION_KEY_PREFIX,
    DEFAULT_WEBHOOK_PATH, MenuSettings, Pacing, PacingSettings, RuntimeSettings, ServerSettings,
    SessionConfig, SessionSettings, load_runtime_settings, load_runtime_settings_from_paths,
    normalize_webhook_path, runtime_settings_paths, set_config_home_override,
};
pub use connect::{
    CatalogEntry, ConnectClient, ContactCenter, KB_SOURCE_GOODBYES, KbAnswer, KbResponse,
    KnowledgeBase, NewTicket, OutboundFile, OutboundSender, Peer, Subscriber,
};
pub use dispatcher::{
    Collaborators, Dispatcher, MAX_AUTO_TRIGGER_DEPTH, is_image_file, split_command,
};
pub use error::DialogueError;
pub use event::{InboundMessage, MessageData, MessageType, session_key};
pub use runtime::{
    HealthResponse, InFlightLimit, IngressApp, SessionGate, SessionGuard, build_ingress_app,
    build_session_cache, run_server, spawn_dispatcher,
};
pub use session::{
    MemorySessionCache, Session, SessionCache, SessionStore, Ticket, TicketPart,
    VAR_FOR_GOTO, VAR_FOR_SAVE, ValkeySessionCache, WizardStep,
};
pub use template::fill;
