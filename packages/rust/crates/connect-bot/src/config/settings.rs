//! Runtime settings loader for connect-bot.
//!
//! Loads and merges:
//! - System defaults: `<PRJ_ROOT>/packages/conf/settings.yaml`
//! - User overrides:  `<PRJ_CONFIG_HOME>/connect-bot/settings.yaml`
//!
//! Merge precedence is user over system.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use serde::Deserialize;

const DEFAULT_SYSTEM_SETTINGS_RELATIVE_PATH: &str = "packages/conf/settings.yaml";
const DEFAULT_USER_SETTINGS_RELATIVE_PATH: &str = "connect-bot/settings.yaml";
const DEFAULT_CONFIG_HOME_RELATIVE_PATH: &str = ".config";
static CONFIG_HOME_OVERRIDE: OnceLock<PathBuf> = OnceLock::new();

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuntimeSettings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub connect: ConnectSettings,
    #[serde(default)]
    pub menu: MenuSettings,
    #[serde(default)]
    pub session: SessionSettings,
    #[serde(default)]
    pub pacing: PacingSettings,
}

/// Webhook ingress and worker pool.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerSettings {
    pub bind: Option<String>,
    pub webhook_path: Option<String>,
    pub inbound_queue_capacity: Option<usize>,
    pub max_in_flight_events: Option<usize>,
}

/// Contact-center API client.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConnectSettings {
    pub base_url: Option<String>,
    pub login: Option<String>,
    pub password: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MenuSettings {
    pub path: Option<String>,
    pub files_dir: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionSettings {
    pub ttl_secs: Option<u64>,
    pub valkey_url: Option<String>,
    pub redis_prefix: Option<String>,
}

/// Human-pacing delays and ticket polling budget.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PacingSettings {
    pub message_delay_ms: Option<u64>,
    pub greeting_delay_ms: Option<u64>,
    pub ticket_poll_retries: Option<u32>,
    pub ticket_poll_delay_ms: Option<u64>,
}

impl RuntimeSettings {
    fn merge(self, overlay: Self) -> Self {
        Self {
            server: self.server.merge(overlay.server),
            connect: self.connect.merge(overlay.connect),
            menu: self.menu.merge(overlay.menu),
            session: self.session.merge(overlay.session),
            pacing: self.pacing.merge(overlay.pacing),
        }
    }
}

impl ServerSettings {
    fn merge(self, overlay: Self) -> Self {
        Self {
            bind: overlay.bind.or(self.bind),
            webhook_path: overlay.webhook_path.or(self.webhook_path),
            inbound_queue_capacity: overlay
                .inbound_queue_capacity
                .or(self.inbound_queue_capacity),
            max_in_flight_events: overlay.max_in_flight_events.or(self.max_in_flight_events),
        }
    }
}

impl ConnectSettings {
    fn merge(self, overlay: Self) -> Self {
        Self {
            base_url: overlay.base_url.or(self.base_url),
            login: overlay.login.or(self.login),
            password: overlay.password.or(self.password),
            request_timeout_secs: overlay.request_timeout_secs.or(self.request_timeout_secs),
        }
    }
}

impl MenuSettings {
    fn merge(self, overlay: Self) -> Self {
        Self {
            path: overlay.path.or(self.path),
            files_dir: overlay.files_dir.or(self.files_dir),
        }
    }
}

impl SessionSettings {
    fn merge(self, overlay: Self) -> Self {
        Self {
            ttl_secs: overlay.ttl_secs.or(self.ttl_secs),
            valkey_url: overlay.valkey_url.or(self.valkey_url),
            redis_prefix: overlay.redis_prefix.or(self.redis_prefix),
        }
    }
}

impl PacingSettings {
    fn merge(self, overlay: Self) -> Self {
        Self {
            message_delay_ms: overlay.message_delay_ms.or(self.message_delay_ms),
            greeting_delay_ms: overlay.greeting_delay_ms.or(self.greeting_delay_ms),
            ticket_poll_retries: overlay.ticket_poll_retries.or(self.ticket_poll_retries),
            ticket_poll_delay_ms: overlay.ticket_poll_delay_ms.or(self.ticket_poll_delay_ms),
        }
    }
}

/// Load merged runtime settings (user overrides system).
pub fn load_runtime_settings() -> RuntimeSettings {
    let (system_path, user_path) = runtime_settings_paths();
    load_runtime_settings_from_paths(&system_path, &user_path)
}

#[doc(hidden)]
pub fn runtime_settings_paths() -> (PathBuf, PathBuf) {
    let root = project_root();
    let system_path = root.join(DEFAULT_SYSTEM_SETTINGS_RELATIVE_PATH);
    let user_path = resolve_config_home(&root).join(DEFAULT_USER_SETTINGS_RELATIVE_PATH);
    (system_path, user_path)
}

#[doc(hidden)]
pub fn load_runtime_settings_from_paths(system: &Path, user: &Path) -> RuntimeSettings {
    load_one(system).merge(load_one(user))
}

fn load_one(path: &Path) -> RuntimeSettings {
    if !path.exists() {
        return RuntimeSettings::default();
    }
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(error) => {
            tracing::warn!(
                path = %path.display(),
                error = %error,
                "failed to read settings file; ignoring"
            );
            return RuntimeSettings::default();
        }
    };
    match serde_yaml::from_str::<RuntimeSettings>(&raw) {
        Ok(value) => value,
        Err(error) => {
            tracing::warn!(
                path = %path.display(),
                error = %error,
                "failed to parse settings yaml; ignoring file"
            );
            RuntimeSettings::default()
        }
    }
}

fn project_root() -> PathBuf {
    std::env::var("PRJ_ROOT")
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map_or_else(
            || std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            PathBuf::from,
        )
}

/// Set config-home override (used by CLI `--conf`).
///
/// The path can be absolute, or relative to `PRJ_ROOT`/cwd.
pub fn set_config_home_override(path: impl Into<PathBuf>) {
    let path = path.into();
    if path.as_os_str().is_empty() {
        return;
    }
    if CONFIG_HOME_OVERRIDE.set(path.clone()).is_err()
        && let Some(current) = CONFIG_HOME_OVERRIDE.get()
        && current != &path
    {
        tracing::warn!(
            current = %current.display(),
            ignored = %path.display(),
            "config home override already set; ignoring subsequent value"
        );
    }
}

fn resolve_config_home(project_root: &Path) -> PathBuf {
    if let Some(path) = CONFIG_HOME_OVERRIDE.get() {
        return absolutize(project_root, path.clone());
    }
    let configured = std::env::var("PRJ_CONFIG_HOME")
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_CONFIG_HOME_RELATIVE_PATH.to_string());
    absolutize(project_root, PathBuf::from(configured))
}

fn absolutize(project_root: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        project_root.join(path)
    }
}
