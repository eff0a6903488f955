use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use crate::config::BotConfig;
use crate::connect::ConnectClient;
use crate::dispatcher::{Collaborators, Dispatcher};
use crate::session::{MemorySessionCache, SessionCache, SessionStore, ValkeySessionCache};

use super::ingress::build_ingress_app;
use super::session_gate::SessionGate;
use super::worker_pool::{InFlightLimit, spawn_dispatcher};

/// Session cache selected by configuration: Valkey when a URL is set, memory otherwise.
///
/// # Errors
/// A malformed Valkey URL.
pub fn build_session_cache(config: &BotConfig) -> Result<Arc<dyn SessionCache>> {
    match config.session.valkey_url.as_deref() {
        Some(url) => Ok(Arc::new(ValkeySessionCache::new(
            url,
            &config.session.key_prefix,
        )?)),
        None => Ok(Arc::new(MemorySessionCache::new())),
    }
}

/// Load the menu, wire collaborators and serve the webhook until SIGINT/SIGTERM.
///
/// Queued events are drained before returning.
///
/// # Errors
/// Menu loading, client construction, or binding the listener.
pub async fn run_server(config: BotConfig) -> Result<()> {
    let menu = connect_menu::load_menu_config(&config.menu_path)
        .with_context(|| format!("failed to load menu {}", config.menu_path.display()))?;
    for (menu_id, target) in menu.dangling_gotos() {
        tracing::warn!(menu = %menu_id, target = %target, "button points at an unknown menu");
    }

    let client = Arc::new(ConnectClient::new(&config.connect)?);
    let store = SessionStore::new(build_session_cache(&config)?, config.session.ttl, client.clone());
    let dispatcher = Arc::new(Dispatcher::new(
        Arc::new(menu),
        store,
        Collaborators {
            contact_center: client.clone(),
            knowledge_base: client.clone(),
            sender: client,
        },
        config.files_dir.clone(),
        config.pacing,
    ));

    let (tx, rx) = mpsc::channel(config.inbound_queue_capacity);
    let limit = InFlightLimit::new(config.max_in_flight_events);
    let worker = spawn_dispatcher(dispatcher, rx, limit.clone(), SessionGate::new());
    let ingress = build_ingress_app(&config.webhook_path, tx, limit);

    let listener = TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    tracing::info!(
        bind = %config.bind,
        webhook_path = %ingress.path,
        queue_capacity = config.inbound_queue_capacity,
        max_in_flight = config.max_in_flight_events,
        "connect bot listening (Ctrl+C/SIGTERM to stop)"
    );
    axum::serve(listener, ingress.app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("webhook stopped; draining queued events");
    if let Err(error) = worker.await {
        tracing::error!("dispatcher task failed: {error}");
    }
    tracing::info!("connect bot stopped");
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(error) => {
                tracing::warn!("failed to listen for SIGTERM: {error}");
                wait_for_ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    wait_for_ctrl_c().await;
}

async fn wait_for_ctrl_c() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for Ctrl+C: {error}");
        std::future::pending::<()>().await;
    }
}
