//! Config namespace: settings files and the resolved bot configuration.

mod bot;
mod settings;

pub use bot::{
    BotConfig, ConnectConfig, DEFAULT_BIND, DEFAULT_SESSION_KEY_PREFIX, DEFAULT_WEBHOOK_PATH,
    Pacing, SessionConfig, normalize_webhook_path,
};
pub use settings::{
    ConnectSettings, MenuSettings, PacingSettings, RuntimeSettings, ServerSettings,
    SessionSettings, load_runtime_settings, load_runtime_settings_from_paths,
    runtime_settings_paths, set_config_home_override,
};
