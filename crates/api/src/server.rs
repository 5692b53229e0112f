//! Listener and graceful shutdown shared by both binaries.

use axum::Router;
use tokio::net::TcpListener;
use tokio::signal;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// If a handler cannot be installed, that signal is never observed and the
/// other one still triggers shutdown.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install SIGINT handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

/// Serves `app` on `addr` until a shutdown signal arrives.
pub async fn serve(app: Router, addr: &str, service: &'static str) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(service, addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!(service, "server shut down gracefully");
    Ok(())
}
