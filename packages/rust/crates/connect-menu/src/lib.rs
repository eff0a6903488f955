//! Operator-authored menu model for the connect text bot.
//!
//! Contract:
//! - The menu file is YAML (`menus`, `use_qna`, messages, default button templates).
//! - Buttons are declared with one field per action kind and are converted at load time
//!   into the closed [`ButtonAction`] sum type.
//! - Nested inline menus are flattened into the menu map under their own id.
//! - The loaded [`MenuConfig`] is read-only and shared by every session.

mod error;
mod keyboard;
mod loader;
mod model;
mod raw;
pub mod states;

pub use error::MenuError;
pub use keyboard::{Keyboard, KeyboardKey, normalize_button_text};
pub use loader::{load_menu_config, parse_menu_config};
pub use model::{
    Answer, Button, ButtonAction, Menu, MenuConfig, QnaSettings, SaveToVar, TicketButton,
    TicketButtons, TicketStep,
};
