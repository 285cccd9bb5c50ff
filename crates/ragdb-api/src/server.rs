use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use ragdb_pipeline::Answerer;

use crate::error::ServeError;
use crate::router::build_router;

/// Shared, read-only handler state. `answerer` is `None` when no index is loaded.
#[derive(Clone)]
pub struct AppState {
    pub answerer: Option<Arc<dyn Answerer>>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(answerer: Option<Arc<dyn Answerer>>) -> Self {
        Self { answerer, started_at: Instant::now() }
    }
}

pub struct ApiServer {
    addr: SocketAddr,
    answerer: Option<Arc<dyn Answerer>>,
}

impl ApiServer {
    pub fn new(bind: &str) -> Result<Self, ServeError> {
        let addr: SocketAddr = bind.parse().map_err(|_| ServeError::Address(bind.to_string()))?;
        if addr.ip().is_unspecified() {
            tracing::warn!(%addr, "API binding to all interfaces");
        }
        Ok(Self { addr, answerer: None })
    }

    #[must_use]
    pub fn with_answerer(mut self, answerer: Arc<dyn Answerer>) -> Self {
        self.answerer = Some(answerer);
        self
    }

    /// Serve until the process receives Ctrl-C.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind or hits a fatal I/O error.
    pub async fn serve(self) -> Result<(), ServeError> {
        let router = build_router(AppState::new(self.answerer));
        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .map_err(|e| ServeError::Bind(self.addr.to_string(), e))?;
        tracing::info!("API listening on http://{}", self.addr);

        axum::serve(listener, router)
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                tracing::info!("API shutting down");
            })
            .await
            .map_err(|e| ServeError::Server(e.to_string()))
    }
}
