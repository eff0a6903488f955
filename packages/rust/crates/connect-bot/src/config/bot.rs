//! Resolved runtime configuration: settings files, environment overrides and defaults.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Result, bail};

use super::settings::RuntimeSettings;

pub const DEFAULT_BIND: &str = "0.0.0.0:8080";
pub const DEFAULT_WEBHOOK_PATH: &str = "/bot";
pub const DEFAULT_SESSION_KEY_PREFIX: &str = "connect-bot:session";
const DEFAULT_INBOUND_QUEUE_CAPACITY: usize = 1024;
const DEFAULT_MAX_IN_FLIGHT_EVENTS: usize = 64;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_SESSION_TTL_SECS: u64 = 24 * 60 * 60;
const DEFAULT_MENU_PATH: &str = "packages/conf/menu.yaml";
const DEFAULT_FILES_DIR: &str = "files";
const DEFAULT_MESSAGE_DELAY_MS: u64 = 250;
const DEFAULT_GREETING_DELAY_MS: u64 = 1000;
const DEFAULT_TICKET_POLL_RETRIES: u32 = 3;
const DEFAULT_TICKET_POLL_DELAY_MS: u64 = 1000;

/// Human-pacing throttle and ticket confirmation budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    /// Delay before handling an inbound text/file event.
    pub inbound_delay: Duration,
    /// Delay after every emitted answer line.
    pub message_delay: Duration,
    /// Delay after the one-time greeting.
    pub greeting_delay: Duration,
    pub ticket_poll_retries: u32,
    pub ticket_poll_delay: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            inbound_delay: Duration::from_millis(DEFAULT_MESSAGE_DELAY_MS),
            message_delay: Duration::from_millis(DEFAULT_MESSAGE_DELAY_MS),
            greeting_delay: Duration::from_millis(DEFAULT_GREETING_DELAY_MS),
            ticket_poll_retries: DEFAULT_TICKET_POLL_RETRIES,
            ticket_poll_delay: Duration::from_millis(DEFAULT_TICKET_POLL_DELAY_MS),
        }
    }
}

impl Pacing {
    /// No delays; the poll budget is kept.
    #[must_use]
    pub fn immediate() -> Self {
        Self {
            inbound_delay: Duration::ZERO,
            message_delay: Duration::ZERO,
            greeting_delay: Duration::ZERO,
            ticket_poll_delay: Duration::ZERO,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectConfig {
    pub base_url: String,
    pub login: Option<String>,
    pub password: Option<String>,
    pub request_timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub ttl: Duration,
    pub valkey_url: Option<String>,
    pub key_prefix: String,
}

/// Everything `serve` needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotConfig {
    pub bind: String,
    pub webhook_path: String,
    pub inbound_queue_capacity: usize,
    pub max_in_flight_events: usize,
    pub connect: ConnectConfig,
    pub menu_path: PathBuf,
    pub files_dir: PathBuf,
    pub session: SessionConfig,
    pub pacing: Pacing,
}

impl BotConfig {
    /// Resolve settings, applying `VALKEY_URL`, `CONNECT_BOT_SESSION_TTL_SECS` and
    /// `CONNECT_BOT_SESSION_VALKEY_PREFIX` on top.
    ///
    /// # Errors
    /// Fails when the contact-center base URL is missing or a numeric limit is zero.
    pub fn from_settings(settings: &RuntimeSettings) -> Result<Self> {
        let server = &settings.server;
        let connect = &settings.connect;
        let pacing = &settings.pacing;

        let Some(base_url) = connect.base_url.clone().and_then(non_empty_string) else {
            bail!("connect.base_url is required (set it in settings.yaml)");
        };
        let inbound_queue_capacity = server
            .inbound_queue_capacity
            .unwrap_or(DEFAULT_INBOUND_QUEUE_CAPACITY);
        let max_in_flight_events = server
            .max_in_flight_events
            .unwrap_or(DEFAULT_MAX_IN_FLIGHT_EVENTS);
        if inbound_queue_capacity == 0 || max_in_flight_events == 0 {
            bail!("server.inbound_queue_capacity and server.max_in_flight_events must be > 0");
        }

        let message_delay =
            Duration::from_millis(pacing.message_delay_ms.unwrap_or(DEFAULT_MESSAGE_DELAY_MS));

        Ok(Self {
            bind: server
                .bind
                .clone()
                .and_then(non_empty_string)
                .unwrap_or_else(|| DEFAULT_BIND.to_string()),
            webhook_path: normalize_webhook_path(server.webhook_path.as_deref().unwrap_or("")),
            inbound_queue_capacity,
            max_in_flight_events,
            connect: ConnectConfig {
                base_url: base_url.trim_end_matches('/').to_string(),
                login: connect.login.clone().and_then(non_empty_string),
                password: connect.password.clone(),
                request_timeout: Duration::from_secs(
                    connect
                        .request_timeout_secs
                        .filter(|secs| *secs > 0)
                        .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
                ),
            },
            menu_path: PathBuf::from(
                settings
                    .menu
                    .path
                    .clone()
                    .and_then(non_empty_string)
                    .unwrap_or_else(|| DEFAULT_MENU_PATH.to_string()),
            ),
            files_dir: PathBuf::from(
                settings
                    .menu
                    .files_dir
                    .clone()
                    .and_then(non_empty_string)
                    .unwrap_or_else(|| DEFAULT_FILES_DIR.to_string()),
            ),
            session: session_config(settings),
            pacing: Pacing {
                inbound_delay: message_delay,
                message_delay,
                greeting_delay: Duration::from_millis(
                    pacing.greeting_delay_ms.unwrap_or(DEFAULT_GREETING_DELAY_MS),
                ),
                ticket_poll_retries: pacing
                    .ticket_poll_retries
                    .unwrap_or(DEFAULT_TICKET_POLL_RETRIES),
                ticket_poll_delay: Duration::from_millis(
                    pacing
                        .ticket_poll_delay_ms
                        .unwrap_or(DEFAULT_TICKET_POLL_DELAY_MS),
                ),
            },
        })
    }
}

fn session_config(settings: &RuntimeSettings) -> SessionConfig {
    let session = &settings.session;
    let valkey_url =
        non_empty_env("VALKEY_URL").or_else(|| session.valkey_url.clone().and_then(non_empty_string));
    let key_prefix = non_empty_env("CONNECT_BOT_SESSION_VALKEY_PREFIX")
        .or_else(|| session.redis_prefix.clone().and_then(non_empty_string))
        .unwrap_or_else(|| DEFAULT_SESSION_KEY_PREFIX.to_string());
    let ttl_secs = match non_empty_env("CONNECT_BOT_SESSION_TTL_SECS") {
        Some(raw) => match raw.parse::<u64>() {
            Ok(value) if value > 0 => Some(value),
            _ => {
                tracing::warn!(
                    env_var = "CONNECT_BOT_SESSION_TTL_SECS",
                    value = %raw,
                    "invalid session ttl env value; using settings/default"
                );
                session.ttl_secs.filter(|v| *v > 0)
            }
        },
        None => session.ttl_secs.filter(|v| *v > 0),
    };
    SessionConfig {
        ttl: Duration::from_secs(ttl_secs.unwrap_or(DEFAULT_SESSION_TTL_SECS)),
        valkey_url,
        key_prefix,
    }
}

/// Leading slash enforced; empty falls back to the default path.
#[must_use]
pub fn normalize_webhook_path(path: &str) -> String {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        DEFAULT_WEBHOOK_PATH.to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(non_empty_string)
}

fn non_empty_string(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
