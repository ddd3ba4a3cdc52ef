//! Local HTTP bridge used by the browser extension.

mod routes;

use std::{net::SocketAddr, sync::Arc};

use anyhow::Result;
use axum::Router;
use log::{error, info};
use parking_lot::RwLock;
use tokio::{net::TcpListener, sync::broadcast};

use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::owner::StoreHandle;

pub use routes::{ADD_ITEM_ROUTE, LIST_ROUTE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeStatus {
    Stopped,
    /// Terminal for the lifetime of the process.
    Listening(SocketAddr),
}

pub struct Bridge {
    config: BridgeConfig,
    store: StoreHandle,
    status: Arc<RwLock<BridgeStatus>>,
}

impl Bridge {
    pub fn new(config: BridgeConfig, store: StoreHandle) -> Self {
        Self {
            config,
            store,
            status: Arc::new(RwLock::new(BridgeStatus::Stopped)),
        }
    }

    pub fn status(&self) -> BridgeStatus {
        *self.status.read()
    }

    pub fn router(&self) -> Router {
        routes::router(routes::BridgeState {
            store: self.store.clone(),
            ack: self.config.ack,
        })
    }

    /// Binds the configured address and starts serving in the background.
    ///
    /// Only the first successful call moves the bridge to listening. On a
    /// bind failure the bridge stays stopped and the error is returned.
    pub async fn start(
        &self,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<SocketAddr, BridgeError> {
        if let BridgeStatus::Listening(addr) = self.status() {
            return Err(BridgeError::AlreadyListening(addr));
        }

        let addr = self.config.address();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| BridgeError::Bind {
                addr: addr.clone(),
                source,
            })?;
        let local_addr = listener.local_addr().map_err(BridgeError::LocalAddr)?;

        {
            let mut status = self.status.write();
            if let BridgeStatus::Listening(existing) = *status {
                return Err(BridgeError::AlreadyListening(existing));
            }
            *status = BridgeStatus::Listening(local_addr);
        }
        info!("[wishcraft:http] listening on http://{local_addr}");

        let router = self.router();
        tokio::spawn(async move {
            if let Err(error) = run_http_server(listener, router, shutdown_rx).await {
                error!("[wishcraft:http] server stopped: {error:?}");
            }
        });

        Ok(local_addr)
    }
}

async fn run_http_server(
    listener: TcpListener,
    router: Router,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<()> {
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.recv().await;
        })
        .await?;

    Ok(())
}
