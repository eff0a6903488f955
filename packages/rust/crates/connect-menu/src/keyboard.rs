use serde::{Deserialize, Serialize};

/// One key of a reply keyboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyboardKey {
    pub id: String,
    pub text: String,
}

/// Rows of keys.
pub type Keyboard = Vec<Vec<KeyboardKey>>;

/// Canonical form used when matching user input against button texts.
#[must_use]
pub fn normalize_button_text(text: &str) -> String {
    text.trim().to_lowercase()
}
