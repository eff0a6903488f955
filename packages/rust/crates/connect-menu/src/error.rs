//! Error types for menu loading.
//!
//! Library crates use `thiserror` for explicit error enums.

use thiserror::Error;

/// Failures while reading or validating a menu configuration file.
#[derive(Error, Debug)]
pub enum MenuError {
    /// Menu file could not be read.
    #[error("failed to read menu file {path}: {source}")]
    Io {
        /// Path that was read.
        path: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// Menu file is not valid YAML for the expected layout.
    #[error("failed to parse menu yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A button has no text even after default templates were applied.
    #[error("button in menu `{menu}` has no text")]
    MissingButtonText {
        /// Menu holding the button.
        menu: String,
    },

    /// A nested menu id is empty or collides with an existing menu.
    #[error("nested menu id `{0}` is empty or already defined")]
    DuplicateMenu(String),

    /// A ticket wizard button carries a nil channel id.
    #[error("ticket button `{button}` in menu `{menu}` has no channel_id")]
    MissingTicketChannel {
        /// Menu holding the button.
        menu: String,
        /// Button text.
        button: String,
    },
}
