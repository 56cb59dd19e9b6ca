use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::broadcast;

use greenlight_notify::config::Settings;
use greenlight_notify::mailer::{BackgroundMailer, Mailer};
use greenlight_notify::postgres::{PoolInitError, PostgresPool};
use greenlight_notify::server::{serve_until_shutdown, AppState};
use greenlight_notify::shutdown::ShutdownConfig;
use greenlight_notify::telemetry::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let settings = Settings::new().context("failed to load configuration")?;

    // Initialize tracing
    init_tracing(&settings.logging)?;
    tracing::info!(env = %settings.server.env, "Configuration loaded");

    // Signals are watched from the start so a stuck startup can be interrupted
    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    let mut startup_rx = shutdown_tx.subscribe();
    let mut serve_rx = shutdown_tx.subscribe();
    tokio::spawn(shutdown_signal_handler(shutdown_tx.clone()));

    // Create mailer before the pool so a bad SMTP setup leaves nothing to close
    let mailer = Mailer::from_settings(&settings).context("failed to configure mailer")?;
    let background = BackgroundMailer::new(mailer);
    tracing::info!(sender = %settings.smtp.sender, "Mailer initialized");

    // Open database pool
    let pool = match PostgresPool::open_with_shutdown(&settings.db, async move {
        let _ = startup_rx.recv().await;
    })
    .await
    {
        Ok(pool) => pool,
        Err(PoolInitError::Cancelled) => {
            tracing::info!("Shutdown requested during startup");
            return Ok(());
        }
        Err(e) => return Err(e).context("failed to open database pool"),
    };

    // Serve, then drain deliveries and release the pool on every exit path
    let drain_timeout = settings.delivery.shutdown_drain();
    let addr = settings.server_addr();
    let state = AppState::new(settings, pool, background);

    let result = serve_until_shutdown(
        &addr,
        state,
        async move {
            let _ = serve_rx.recv().await;
        },
        shutdown_tx,
        ShutdownConfig { drain_timeout },
    )
    .await
    .with_context(|| format!("server on {} failed", addr))?;

    if !result.success {
        tracing::warn!(
            abandoned = result.deliveries_abandoned,
            "Shutdown finished with undelivered mail"
        );
    }

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal_handler(shutdown_tx: broadcast::Sender<()>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }

    let _ = shutdown_tx.send(());
}
