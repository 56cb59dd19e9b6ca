use std::future::Future;

use tokio::net::TcpListener;
use tokio::sync::broadcast;

use super::{create_app, AppState};
use crate::shutdown::{GracefulShutdown, ShutdownConfig, ShutdownResult};

/// Serve the API on `addr` until `signal` resolves, then run the graceful
/// shutdown sequence.
///
/// The shutdown sequence also runs when binding or serving fails, so the
/// pool in `state` is closed on every exit path. A serve error is returned
/// after shutdown has completed.
pub async fn serve_until_shutdown<F>(
    addr: &str,
    state: AppState,
    signal: F,
    shutdown_tx: broadcast::Sender<()>,
    config: ShutdownConfig,
) -> std::io::Result<ShutdownResult>
where
    F: Future<Output = ()> + Send + 'static,
{
    let background = state.mailer.clone();
    let pool = state.postgres_pool.clone();
    let app = create_app(state);

    let served = async {
        let listener = TcpListener::bind(addr).await?;
        tracing::info!("Server listening on {}", addr);
        axum::serve(listener, app).with_graceful_shutdown(signal).await
    }
    .await;

    let reason = match &served {
        Ok(()) => "server stopped",
        Err(e) => {
            tracing::error!(error = %e, addr = %addr, "Server failed");
            "server failed"
        }
    };

    let result = GracefulShutdown::with_config(background, pool, shutdown_tx, config)
        .execute(reason)
        .await;

    served.map(|()| result)
}
