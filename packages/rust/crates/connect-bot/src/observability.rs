//! Structured log event names, emitted as the `event` field.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SessionEvent {
    SessionBackendEnabled,
    SessionCacheMiss,
    SessionLoaded,
    SessionDecodeFailed,
    SessionSaved,
    SessionStateChanged,
    SessionValkeyConnected,
    SessionValkeyCommandRetrySucceeded,
    SessionValkeyCommandRetryFailed,
    SessionGateAcquired,
}

impl SessionEvent {
    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::SessionBackendEnabled => "session.backend.enabled",
            Self::SessionCacheMiss => "session.cache.miss",
            Self::SessionLoaded => "session.loaded",
            Self::SessionDecodeFailed => "session.decode.failed",
            Self::SessionSaved => "session.saved",
            Self::SessionStateChanged => "session.state.changed",
            Self::SessionValkeyConnected => "session.valkey.connected",
            Self::SessionValkeyCommandRetrySucceeded => "session.valkey.command.retry_succeeded",
            Self::SessionValkeyCommandRetryFailed => "session.valkey.command.retry_failed",
            Self::SessionGateAcquired => "session.gate.acquired",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DialogueEvent {
    EventReceived,
    EventDropped,
    EventProcessed,
    ButtonTriggered,
    MenuRendered,
    UnknownMenu,
    KnowledgeBaseAnswered,
    KnowledgeBaseFailed,
    RecoveredFailure,
    SendFailed,
    FileMissing,
    WizardStep,
    TicketSubmitted,
    TicketNotConfirmed,
    CommandExecuted,
}

impl DialogueEvent {
    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::EventReceived => "dialogue.event.received",
            Self::EventDropped => "dialogue.event.dropped",
            Self::EventProcessed => "dialogue.event.processed",
            Self::ButtonTriggered => "dialogue.button.triggered",
            Self::MenuRendered => "dialogue.menu.rendered",
            Self::UnknownMenu => "dialogue.menu.unknown",
            Self::KnowledgeBaseAnswered => "dialogue.kb.answered",
            Self::KnowledgeBaseFailed => "dialogue.kb.failed",
            Self::RecoveredFailure => "dialogue.failure.recovered",
            Self::SendFailed => "dialogue.send.failed",
            Self::FileMissing => "dialogue.file.missing",
            Self::WizardStep => "dialogue.wizard.step",
            Self::TicketSubmitted => "dialogue.ticket.submitted",
            Self::TicketNotConfirmed => "dialogue.ticket.not_confirmed",
            Self::CommandExecuted => "dialogue.command.executed",
        }
    }
}
