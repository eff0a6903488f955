//! Dialogue dispatcher: inbound event + session → side effects + next state.

mod button;
mod exec;
mod files;
mod process;
mod qna;
mod render;
mod wizard;

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;

use connect_menu::MenuConfig;

use crate::config::Pacing;
use crate::connect::{ContactCenter, KnowledgeBase, OutboundSender};
use crate::session::SessionStore;

pub use exec::split_command;
pub use files::is_image_file;

use files::FileResolver;

/// Chained `do_button` triggers allowed before the chain is treated as a cycle.
pub const MAX_AUTO_TRIGGER_DEPTH: usize = 8;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// External services the dispatcher talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub contact_center: Arc<dyn ContactCenter>,
    pub knowledge_base: Arc<dyn KnowledgeBase>,
    pub sender: Arc<dyn OutboundSender>,
}

/// Top-level dialogue state machine, shared by all workers.
pub struct Dispatcher {
    menu: Arc<MenuConfig>,
    store: SessionStore,
    contact_center: Arc<dyn ContactCenter>,
    knowledge_base: Arc<dyn KnowledgeBase>,
    sender: Arc<dyn OutboundSender>,
    files: FileResolver,
    pacing: Pacing,
}

impl Dispatcher {
    pub fn new(
        menu: Arc<MenuConfig>,
        store: SessionStore,
        collaborators: Collaborators,
        files_dir: impl Into<PathBuf>,
        pacing: Pacing,
    ) -> Self {
        Self {
            menu,
            store,
            contact_center: collaborators.contact_center,
            knowledge_base: collaborators.knowledge_base,
            sender: collaborators.sender,
            files: FileResolver::new(files_dir.into()),
            pacing,
        }
    }

    #[must_use]
    pub fn menu(&self) -> &MenuConfig {
        &self.menu
    }

    #[must_use]
    pub fn store(&self) -> &SessionStore {
        &self.store
    }
}
