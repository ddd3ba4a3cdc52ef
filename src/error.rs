use std::net::SocketAddr;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ItemError {
    #[error("item name must not be empty")]
    BlankName,
}

/// Returned by [`crate::StoreHandle`] once the owning thread has gone away.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("wishlist store is no longer running")]
pub struct StoreClosed;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("bridge is already listening on {0}")]
    AlreadyListening(SocketAddr),
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to resolve listener address: {0}")]
    LocalAddr(#[source] std::io::Error),
}
