//! Runtime menu model produced by the loader.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::keyboard::{Keyboard, KeyboardKey, normalize_button_text};

pub(crate) const DEFAULT_ERROR_MESSAGE: &str =
    "Sorry, I did not understand you. Please use the menu buttons.";
pub(crate) const DEFAULT_FAILURE_MESSAGE: &str =
    "An error occurred while processing your request.";

/// Whole operator configuration. Loaded once, never mutated at runtime.
#[derive(Debug, Clone, Default)]
pub struct MenuConfig {
    /// Menus keyed by identifier (nested menus included).
    pub menus: HashMap<String, Menu>,
    /// Knowledge-base fallback switch.
    pub use_qna: QnaSettings,
    /// "Unknown command" reply.
    pub error_message: String,
    /// One-time greeting sent before the START menu when `first_greeting` is set.
    pub greeting_message: String,
    pub first_greeting: bool,
    /// Apology sent by the generic error recovery path.
    pub failure_message: String,
    /// Texts used by the ticket wizard keyboards.
    pub ticket_buttons: TicketButtons,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QnaSettings {
    #[serde(default)]
    pub enabled: bool,
}

/// One configured menu node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Menu {
    /// Messages rendered when the menu is opened.
    pub answer: Vec<Answer>,
    /// Buttons in keyboard order.
    pub buttons: Vec<Button>,
    /// Disables knowledge-base fallback for free text typed in this menu.
    pub qna_disable: bool,
    /// Button triggered automatically right after the menu is rendered.
    pub do_button: Option<Box<Button>>,
}

/// A text message and/or a file attachment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    #[serde(default)]
    pub chat: String,
    /// File name relative to the files directory.
    #[serde(default)]
    pub file: String,
    /// Caption sent with the file.
    #[serde(default)]
    pub file_text: String,
}

/// One user-triggerable action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Button {
    pub id: String,
    pub text: String,
    /// Messages emitted before the action fires.
    #[serde(default)]
    pub chat: Vec<Answer>,
    /// Navigates back through the history stack instead of `goto`.
    #[serde(default)]
    pub back_button: bool,
    /// Target menu for plain navigation (also used by `Exec`).
    #[serde(default)]
    pub goto: String,
    pub action: ButtonAction,
}

/// The single action a button performs.
///
/// Variants are listed in dispatch priority order: when a YAML button sets several
/// action fields, the first one in this order wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum ButtonAction {
    Close,
    Redirect,
    AppointSpecialist(Uuid),
    AppointRandomSpecialist(Vec<Uuid>),
    Reroute(Uuid),
    Exec(String),
    SaveToVar(SaveToVar),
    Ticket(Box<TicketButton>),
    NestedMenu(String),
    Goto,
}

/// Free-text capture into a session variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveToVar {
    pub var_name: String,
    /// Prompt shown instead of the WAIT_SEND menu answer.
    #[serde(default)]
    pub send_text: Option<String>,
    /// Menu opened after capture when no deferred button is set.
    #[serde(default)]
    pub goto: Option<String>,
    /// Button executed once the text is captured.
    #[serde(default)]
    pub do_button: Option<Box<Button>>,
}

/// Ticket wizard definition carried by a button.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketButton {
    pub channel_id: Uuid,
    /// Completion target; FINAL when absent.
    #[serde(default)]
    pub goto: Option<String>,
    pub theme: TicketStep,
    pub description: TicketStep,
    pub executor: TicketStep,
    pub service: TicketStep,
    pub service_type: TicketStep,
    /// Summary shown on the confirmation step.
    pub data: TicketStep,
}

/// Prompt and optional default value for one wizard step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketStep {
    #[serde(default)]
    pub text: String,
    /// Default value; when set the step is filled without prompting.
    #[serde(default)]
    pub value: Option<String>,
}

impl TicketStep {
    /// Configured default, ignoring blank values.
    #[must_use]
    pub fn default_value(&self) -> Option<&str> {
        self.value
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}

/// Keyboard texts of the ticket wizard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketButtons {
    #[serde(default = "default_confirm_text")]
    pub confirm: String,
    #[serde(default = "default_back_text")]
    pub back: String,
    #[serde(default = "default_cancel_text")]
    pub cancel: String,
    /// Reply when the submitted text matches no candidate.
    #[serde(default = "default_incorrect_value_text")]
    pub incorrect_value: String,
}

impl Default for TicketButtons {
    fn default() -> Self {
        Self {
            confirm: default_confirm_text(),
            back: default_back_text(),
            cancel: default_cancel_text(),
            incorrect_value: default_incorrect_value_text(),
        }
    }
}

fn default_confirm_text() -> String {
    "Confirm".to_string()
}

fn default_back_text() -> String {
    "Back".to_string()
}

fn default_cancel_text() -> String {
    "Cancel".to_string()
}

fn default_incorrect_value_text() -> String {
    "Incorrect value, please choose one of the suggested options.".to_string()
}

impl Button {
    /// Keyboard key rendered for this button.
    #[must_use]
    pub fn key(&self) -> KeyboardKey {
        KeyboardKey {
            id: self.id.clone(),
            text: self.text.clone(),
        }
    }
}

impl MenuConfig {
    #[must_use]
    pub fn menu(&self, id: &str) -> Option<&Menu> {
        self.menus.get(id)
    }

    /// Keyboard of a menu: one key per row in configured order.
    ///
    /// `None` when the menu is unknown or has no buttons.
    #[must_use]
    pub fn keyboard(&self, menu_id: &str) -> Option<Keyboard> {
        let menu = self.menus.get(menu_id)?;
        if menu.buttons.is_empty() {
            return None;
        }
        Some(menu.buttons.iter().map(|b| vec![b.key()]).collect())
    }

    /// Button of `menu_id` whose text matches `text` after trimming and lowercasing.
    #[must_use]
    pub fn button(&self, menu_id: &str, text: &str) -> Option<&Button> {
        let wanted = normalize_button_text(text);
        self.menus
            .get(menu_id)?
            .buttons
            .iter()
            .find(|button| normalize_button_text(&button.text) == wanted)
    }

    /// `(menu, goto)` pairs whose navigation target is not a configured menu.
    #[must_use]
    pub fn dangling_gotos(&self) -> Vec<(String, String)> {
        let mut dangling = Vec::new();
        for (menu_id, menu) in &self.menus {
            for button in &menu.buttons {
                let target = match &button.action {
                    ButtonAction::Goto if !button.back_button => button.goto.as_str(),
                    ButtonAction::NestedMenu(id) => id.as_str(),
                    _ => continue,
                };
                if !target.is_empty() && !self.menus.contains_key(target) {
                    dangling.push((menu_id.clone(), target.to_string()));
                }
            }
        }
        dangling.sort();
        dangling
    }
}
