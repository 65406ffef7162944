//! Listener lifecycle: binding, serving and bounded graceful shutdown.

use std::future::IntoFuture;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinError;
use tracing::{error, info};

use crate::error::StartupError;

/// How long in-flight requests may run after shutdown is requested.
pub const SHUTDOWN_GRACE_PERIOD: Duration = Duration::from_secs(10);

/// Requests shutdown of every server holding a matching [`ShutdownSignal`].
#[derive(Debug)]
pub struct ShutdownTrigger(watch::Sender<bool>);

impl ShutdownTrigger {
    pub fn trigger(&self) {
        self.0.send_replace(true);
    }
}

/// Resolves once shutdown has been requested.
#[derive(Debug, Clone)]
pub struct ShutdownSignal(watch::Receiver<bool>);

impl ShutdownSignal {
    /// Waits for shutdown. A dropped trigger counts as a request.
    pub async fn wait(mut self) {
        while !*self.0.borrow_and_update() {
            if self.0.changed().await.is_err() {
                return;
            }
        }
    }
}

/// Creates a connected trigger and signal.
pub fn shutdown_channel() -> (ShutdownTrigger, ShutdownSignal) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger(tx), ShutdownSignal(rx))
}

/// Binds a listener on all interfaces.
///
/// # Errors
///
/// Returns an error if the port cannot be bound.
pub async fn bind(port: u16) -> Result<TcpListener, StartupError> {
    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
    TcpListener::bind(addr)
        .await
        .map_err(|e| StartupError::Bind {
            port,
            reason: e.to_string(),
        })
}

/// Serves `router` until `shutdown` resolves, then waits at most `grace`
/// for in-flight requests to finish.
///
/// # Errors
///
/// Returns an error if the server fails or does not drain within `grace`.
pub async fn serve(
    name: &'static str,
    listener: TcpListener,
    router: Router,
    shutdown: ShutdownSignal,
    grace: Duration,
) -> Result<(), StartupError> {
    if let Ok(addr) = listener.local_addr() {
        info!(server = name, %addr, "Listening");
    }

    let server = axum::serve(listener, router).with_graceful_shutdown(shutdown.clone().wait());
    let mut handle = tokio::spawn(server.into_future());

    tokio::select! {
        result = &mut handle => return finished(name, result),
        () = shutdown.wait() => {}
    }

    info!(server = name, grace_seconds = grace.as_secs(), "Shutting down");
    match tokio::time::timeout(grace, handle).await {
        Ok(result) => finished(name, result),
        Err(_) => Err(StartupError::ShutdownTimeout { server: name, grace }),
    }
}

fn finished(
    name: &'static str,
    result: Result<std::io::Result<()>, JoinError>,
) -> Result<(), StartupError> {
    match result {
        Ok(Ok(())) => {
            info!(server = name, "Server stopped");
            Ok(())
        }
        Ok(Err(e)) => Err(StartupError::Serve {
            server: name,
            reason: e.to_string(),
        }),
        Err(e) => Err(StartupError::Serve {
            server: name,
            reason: e.to_string(),
        }),
    }
}

/// Resolves on SIGINT or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received SIGINT"),
        () = terminate => info!("Received SIGTERM"),
    }
}
