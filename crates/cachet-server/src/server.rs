use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use cachet_store::TtlStore;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::handler::SharedStore;
use crate::router::build_router;
use crate::udp::UdpServer;

/// Cachet process: one store behind an HTTP API and a UDP listener.
///
/// Binding and serving are separate steps so callers can learn the bound
/// addresses (e.g. when configured with port 0) before serving.
pub struct CacheServer {
    config: ServerConfig,
    store: TtlStore,
    http: TcpListener,
    udp: UdpServer,
}

impl CacheServer {
    /// Create the store from `config.store` and bind both sockets.
    pub async fn bind(config: ServerConfig) -> ServerResult<Self> {
        config.validate()?;
        let store = TtlStore::with_config(config.store.clone())?;
        Self::bind_with_store(config, store).await
    }

    pub async fn bind_with_store(config: ServerConfig, store: TtlStore) -> ServerResult<Self> {
        config.validate()?;
        let shared: SharedStore = Arc::new(store.clone());
        let http = TcpListener::bind(config.http_addr).await?;
        let udp = UdpServer::bind(
            config.udp_addr,
            shared,
            config.request_timeout,
            config.udp_buffer_size,
        )
        .await?;
        Ok(Self {
            config,
            store,
            http,
            udp,
        })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn store(&self) -> &TtlStore {
        &self.store
    }

    pub fn http_addr(&self) -> ServerResult<SocketAddr> {
        Ok(self.http.local_addr()?)
    }

    pub fn udp_addr(&self) -> ServerResult<SocketAddr> {
        self.udp.local_addr()
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(Arc::new(self.store.clone()), self.config.request_timeout)
    }

    /// Serve until `shutdown` resolves or either listener fails.
    ///
    /// Shutdown order: HTTP stops accepting and finishes in-flight requests,
    /// UDP stops receiving and drains, then the store is closed. UDP drain
    /// and store teardown are each bounded by `shutdown_timeout`.
    pub async fn run<F>(self, shutdown: F) -> ServerResult<()>
    where
        F: Future<Output = ()> + Send,
    {
        let Self {
            config,
            store,
            http,
            udp,
        } = self;

        info!(
            http = %http.local_addr()?,
            udp = %udp.local_addr()?,
            "cachet server listening"
        );

        let (stop_tx, stop_rx) = watch::channel(false);
        let stopped = |mut rx: watch::Receiver<bool>| async move {
            let _ = rx.wait_for(|stop| *stop).await;
        };

        let router = build_router(Arc::new(store.clone()), config.request_timeout);
        let http_task = async {
            let result = axum::serve(http, router)
                .with_graceful_shutdown(stopped(stop_rx.clone()))
                .await
                .map_err(ServerError::Io);
            stop_tx.send_replace(true);
            info!("HTTP server stopped");
            result
        };
        let udp_task = async {
            let result = udp
                .run(stopped(stop_rx.clone()), config.shutdown_timeout)
                .await;
            stop_tx.send_replace(true);
            result
        };
        let signal_task = async {
            tokio::select! {
                _ = shutdown => info!("shutdown requested"),
                _ = stopped(stop_rx.clone()) => {}
            }
            stop_tx.send_replace(true);
        };

        let (http_result, udp_result, ()) = tokio::join!(http_task, udp_task, signal_task);

        let close_result = match tokio::time::timeout(config.shutdown_timeout, store.close()).await
        {
            Ok(result) => result.map_err(ServerError::from),
            Err(_) => {
                warn!(timeout = ?config.shutdown_timeout, "store did not close in time");
                Err(ServerError::Timeout(config.shutdown_timeout))
            }
        };

        for (what, result) in [("http", &http_result), ("udp", &udp_result), ("store", &close_result)] {
            if let Err(e) = result {
                error!(component = what, error = %e, "shutdown reported an error");
            }
        }
        info!("cachet server stopped");

        http_result?;
        udp_result?;
        close_result
    }
}

impl std::fmt::Debug for CacheServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheServer")
            .field("config", &self.config)
            .field("store", &self.store)
            .finish()
    }
}
