//! Recoverable dialogue failures.
//!
//! Every variant ends in the same recovery path: an apology, wizard data cleared,
//! FINAL rendered. Only the text of the apology differs.

use thiserror::Error;
use uuid::Uuid;

const SPECIALIST_UNAVAILABLE_MESSAGE: &str = "The selected specialist is not available.";
const NO_SPECIALISTS_MESSAGE: &str = "Specialists in this area are not available.";
const LINE_UNAVAILABLE_MESSAGE: &str = "The selected line is not available.";

#[derive(Debug, Error)]
pub enum DialogueError {
    #[error("specialist {0} is not available")]
    SpecialistUnavailable(Uuid),

    #[error("none of the listed specialists is available")]
    NoSpecialistsAvailable,

    #[error("line {0} is not permitted for this subscriber")]
    LineUnavailable(Uuid),

    #[error("template rendering failed: {0}")]
    Template(#[from] minijinja::Error),

    /// Server command failed to parse, spawn or exit cleanly.
    #[error("command failed: {0}")]
    Command(String),

    /// Menu or wizard configuration does not match the running state.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("missing {field} for ticket field `{step}`")]
    InvalidTicketValue {
        step: &'static str,
        field: &'static str,
    },

    #[error("auto-trigger chain exceeded {0} buttons")]
    TriggerDepthExceeded(usize),

    #[error(transparent)]
    Collaborator(#[from] anyhow::Error),
}

impl DialogueError {
    /// Plain-language apology shown to the subscriber.
    ///
    /// Only command failures echo their detail.
    #[must_use]
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::SpecialistUnavailable(_) => SPECIALIST_UNAVAILABLE_MESSAGE.to_string(),
            Self::NoSpecialistsAvailable => NO_SPECIALISTS_MESSAGE.to_string(),
            Self::LineUnavailable(_) => LINE_UNAVAILABLE_MESSAGE.to_string(),
            Self::Command(detail) => format!("Error: {detail}"),
            Self::Template(_)
            | Self::Config(_)
            | Self::InvalidTicketValue { .. }
            | Self::TriggerDepthExceeded(_)
            | Self::Collaborator(_) => fallback.to_string(),
        }
    }
}
