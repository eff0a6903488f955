use std::collections::HashMap;

use connect_menu::{Button, ButtonAction, TicketButton, TicketStep, states};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::connect::{NewTicket, Subscriber};
use crate::error::DialogueError;

/// Vars slot holding the name of the variable awaiting free text.
pub const VAR_FOR_SAVE: &str = "VAR_FOR_SAVE";
/// Vars slot holding the menu to open once free text is captured.
pub const VAR_FOR_GOTO: &str = "VAR_FOR_GOTO";

/// Per-(user, line) dialogue state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Visited menus, oldest first.
    #[serde(default)]
    pub history_state: Vec<String>,
    #[serde(rename = "prev_state")]
    pub previous_state: String,
    #[serde(rename = "curr_state")]
    pub current_state: String,
    #[serde(default)]
    pub user: Subscriber,
    #[serde(default)]
    pub vars: HashMap<String, String>,
    #[serde(default)]
    pub ticket: Ticket,
    /// Deferred button (after capture) or the active wizard definition.
    #[serde(default)]
    pub saved_button: Option<Button>,
}

impl Session {
    /// Fresh session for a first contact.
    #[must_use]
    pub fn new(user: Subscriber) -> Self {
        Self {
            history_state: Vec::new(),
            previous_state: states::GREETINGS.to_string(),
            current_state: states::GREETINGS.to_string(),
            user,
            vars: HashMap::new(),
            ticket: Ticket::default(),
            saved_button: None,
        }
    }

    /// Non-empty value of a vars slot.
    #[must_use]
    pub fn var(&self, name: &str) -> Option<&str> {
        self.vars
            .get(name)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    /// Wizard definition of the active ticket flow.
    #[must_use]
    pub fn ticket_button(&self) -> Option<&TicketButton> {
        match &self.saved_button.as_ref()?.action {
            ButtonAction::Ticket(ticket) => Some(ticket),
            _ => None,
        }
    }

    /// Drop capture and wizard leftovers: pending var, goto, deferred button, ticket draft.
    pub fn clear_transient(&mut self) {
        for slot in [VAR_FOR_SAVE, VAR_FOR_GOTO] {
            if let Some(value) = self.vars.get_mut(slot) {
                value.clear();
            }
        }
        self.saved_button = None;
        self.ticket = Ticket::default();
    }
}

/// Ticket wizard steps in forward order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Theme,
    Description,
    Executor,
    Service,
    ServiceType,
    Final,
}

impl WizardStep {
    pub const FIRST: Self = Self::Theme;

    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Theme => Self::Description,
            Self::Description => Self::Executor,
            Self::Executor => Self::Service,
            Self::Service => Self::ServiceType,
            Self::ServiceType | Self::Final => Self::Final,
        }
    }

    /// `None` before the first step.
    #[must_use]
    pub const fn prev(self) -> Option<Self> {
        match self {
            Self::Theme => None,
            Self::Description => Some(Self::Theme),
            Self::Executor => Some(Self::Description),
            Self::Service => Some(Self::Executor),
            Self::ServiceType => Some(Self::Service),
            Self::Final => Some(Self::ServiceType),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Theme => "theme",
            Self::Description => "description",
            Self::Executor => "executor",
            Self::Service => "service",
            Self::ServiceType => "service_type",
            Self::Final => "final",
        }
    }

    /// Steps answered by picking a catalog entry.
    #[must_use]
    pub const fn is_catalog(self) -> bool {
        matches!(self, Self::Executor | Self::Service | Self::ServiceType)
    }

    /// Prompt configuration of this step.
    #[must_use]
    pub fn config(self, ticket: &TicketButton) -> &TicketStep {
        match self {
            Self::Theme => &ticket.theme,
            Self::Description => &ticket.description,
            Self::Executor => &ticket.executor,
            Self::Service => &ticket.service,
            Self::ServiceType => &ticket.service_type,
            Self::Final => &ticket.data,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketPart {
    pub id: Uuid,
    pub name: String,
}

/// In-progress ticket draft.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ticket {
    pub channel_id: Uuid,
    pub theme: String,
    pub description: String,
    pub executor: TicketPart,
    pub service: TicketPart,
    pub service_type: TicketPart,
    /// Step currently awaiting input.
    pub step: Option<WizardStep>,
}

impl Ticket {
    /// Write one wizard field.
    ///
    /// # Errors
    /// Free-text steps need a name; catalog steps need a non-nil id and a name.
    pub fn set_field(&mut self, step: WizardStep, part: TicketPart) -> Result<(), DialogueError> {
        let missing = |field| DialogueError::InvalidTicketValue {
            step: step.as_str(),
            field,
        };
        match step {
            WizardStep::Theme | WizardStep::Description => {
                if part.name.trim().is_empty() {
                    return Err(missing("name"));
                }
                if step == WizardStep::Theme {
                    self.theme = part.name;
                } else {
                    self.description = part.name;
                }
            }
            WizardStep::Executor | WizardStep::Service | WizardStep::ServiceType => {
                if part.id.is_nil() || part.name.is_empty() {
                    return Err(missing("id and name"));
                }
                match step {
                    WizardStep::Executor => self.executor = part,
                    WizardStep::Service => self.service = part,
                    _ => self.service_type = part,
                }
            }
            WizardStep::Final => return Err(missing("value")),
        }
        Ok(())
    }

    /// Submission payload.
    #[must_use]
    pub fn to_new_ticket(&self) -> NewTicket {
        NewTicket {
            channel_id: self.channel_id,
            theme: self.theme.clone(),
            description: self.description.clone(),
            executor_id: self.executor.id,
            service_id: self.service.id,
            service_type_id: self.service_type.id,
        }
    }
}
