use crate::adapters::http::{router, AppState};
use crate::config::ServiceSettings;
use crate::core::tracker::ConversationTracker;
use crate::core::ConversationStore;
use crate::utils::error::Result;
use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use tokio::net::TcpListener;

pub struct WebhookServer {
    listener: TcpListener,
    router: Router,
}

impl WebhookServer {
    pub async fn bind<S: ConversationStore + 'static>(
        settings: &ServiceSettings,
        store: S,
    ) -> Result<Self> {
        let state = AppState::new(
            ConversationTracker::new(store),
            settings.verify_token.as_str(),
            settings.app_secret.as_str(),
        );
        let router = router(state, settings.max_body_bytes);
        let listener = TcpListener::bind(settings.bind_addr()).await?;

        Ok(Self { listener, router })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serves until `shutdown` resolves, then drains in-flight requests.
    pub async fn run<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        tracing::info!("🚀 Listening on http://{}", self.local_addr()?);

        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("Server stopped");
        Ok(())
    }
}

/// Resolves on Ctrl-C or, on unix, SIGTERM (what `docker stop` sends).
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl-C, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
