//! Marketplace listing monitor
//!
//! Single-binary service that:
//! 1. Keeps a session credential fresh with a refresh actor
//! 2. Waits for the first credential, then reads the newest catalog id
//! 3. Polls for items past that id and prints each new listing to stdout
//!
//! Logs go to stderr as JSON so stdout carries only listings.

mod config;
mod display;
mod error;
mod metrics;
mod monitor;
mod state;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use credential_refresh::{
    BackgroundRefresh, CredentialBridge, InlineRefresh, RefreshActor, RefreshRunner,
};
use marketplace::{HttpCatalog, ProxyList, ProxyPool, SessionCookieSource};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Config, RefreshMode};
use crate::display::ItemPrinter;
use crate::monitor::MonitorLoop;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and LOG_LEVEL / RUST_LOG support
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
        .init();

    info!("starting marketplace-monitor");

    // CLI: simple --config flag parsing
    let args: Vec<String> = std::env::args().collect();
    let cli_config_path = args
        .iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str());

    let config_path = Config::resolve_path(cli_config_path);
    info!(path = %config_path.display(), "loading configuration");

    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    info!(
        base_url = %config.marketplace.base_url,
        concurrent_requests = config.algorithm.concurrent_requests,
        filter_zero_stars = config.algorithm.filter_zero_stars_profiles,
        refresh_mode = ?config.refresh.mode,
        proxies = config.proxies.file.is_some(),
        "configuration loaded"
    );

    if let Some(addr) = config.metrics.listen_addr {
        metrics::install_exporter(addr)
            .with_context(|| format!("failed to start metrics exporter on {addr}"))?;
        info!(%addr, "metrics exporter listening");
    }

    let timeout = Duration::from_secs(config.marketplace.timeout_secs);

    // Polling pool, owned by the main context
    let catalog_proxies = Arc::new(
        ProxyList::new(config.proxies.file.clone(), timeout)
            .context("failed to build HTTP client")?,
    );
    if let Err(e) = catalog_proxies.init().await {
        error!(error = %e, "failed to load proxies, polling without them");
    } else {
        info!(proxies = catalog_proxies.len(), "proxy pool ready");
    }

    let catalog = Arc::new(HttpCatalog::new(
        config.marketplace.base_url.clone(),
        config.marketplace.session_cookie.clone(),
        config.algorithm.concurrent_requests,
        catalog_proxies,
    ));

    // Refresh actor gets its own pool and source; it shares nothing with polling
    let refresh_proxies = Arc::new(
        ProxyList::new(config.proxies.file.clone(), timeout)
            .context("failed to build HTTP client")?,
    );
    let source = Arc::new(SessionCookieSource::new(
        config.marketplace.base_url.clone(),
        config.marketplace.session_cookie.clone(),
        refresh_proxies.clone(),
    ));

    let (outbox, inbox) = mpsc::unbounded_channel();
    let bootstrap = CredentialBridge::spawn(inbox);
    let actor = RefreshActor::new(refresh_proxies, source, outbox);

    let runner: Box<dyn RefreshRunner> = match config.refresh.mode {
        RefreshMode::Background => Box::new(BackgroundRefresh),
        RefreshMode::Inline => Box::new(InlineRefresh),
    };
    let refresh = runner
        .launch(actor)
        .context("failed to start credential refresh")?;

    let printer = ItemPrinter::new(
        std::io::stdout(),
        config.algorithm.filter_zero_stars_profiles,
        config.display.separator_width,
    );
    let monitor = MonitorLoop::new(catalog, printer);

    // The monitor never returns; only a signal ends the process
    tokio::select! {
        _ = monitor.run(bootstrap) => warn!("monitor loop exited unexpectedly"),
        _ = shutdown_signal() => {}
    }

    refresh.shutdown();
    info!(mode = refresh.mode(), "shutdown complete");
    Ok(())
}

/// Wait for SIGTERM or SIGINT.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
