//! HTTP server implementation.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{error, info};

use super::handlers::router;
use crate::error::Result;
use crate::lookup::LookupService;

/// HTTP server for the lookup service.
pub struct HttpServer {
    /// Address to bind to
    addr: SocketAddr,
    /// The lookup service instance
    service: Arc<LookupService>,
}

impl HttpServer {
    /// Create a new HTTP server.
    pub fn new(addr: SocketAddr, service: Arc<LookupService>) -> Self {
        Self { addr, service }
    }

    /// Start the HTTP server.
    ///
    /// This method will block until the server is shut down.
    pub async fn serve(self) -> Result<()> {
        let app = router(self.service)
            .into_make_service_with_connect_info::<SocketAddr>();

        info!(addr = %self.addr, "Starting HTTP server");

        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        axum::serve(listener, app).await.map_err(|e| {
            error!(error = %e, "HTTP server failed");
            e.into()
        })
    }

    /// Start the HTTP server with graceful shutdown.
    ///
    /// The server will shut down when the provided signal resolves.
    pub async fn serve_with_shutdown<F>(self, signal: F) -> Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let app = router(self.service)
            .into_make_service_with_connect_info::<SocketAddr>();

        info!(addr = %self.addr, "Starting HTTP server with graceful shutdown");

        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        axum::serve(listener, app)
            .with_graceful_shutdown(signal)
            .await
            .map_err(|e| {
                error!(error = %e, "HTTP server failed");
                e.into()
            })
    }
}
