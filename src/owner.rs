//! The owning context for the wishlist store.
//!
//! A single thread holds the [`WishlistStore`] and applies commands in the
//! order they were sent. Everything else talks to it through a cloneable
//! [`StoreHandle`] and reads the snapshots it publishes.

use std::{sync::Arc, thread::JoinHandle};

use anyhow::{Context, Result};
use log::{info, warn};
use tokio::sync::{mpsc, oneshot, watch};

use crate::error::StoreClosed;
use crate::store::{MutationOutcome, StoreCommand, StoreSnapshot, WishlistStore};

const OWNER_THREAD_NAME: &str = "wishlist-store";

#[derive(Debug)]
pub(crate) struct Envelope {
    pub(crate) command: StoreCommand,
    pub(crate) respond_to: Option<oneshot::Sender<MutationOutcome>>,
}

/// Thread-safe access to the store owned by [`StoreOwner`].
#[derive(Clone)]
pub struct StoreHandle {
    commands: mpsc::UnboundedSender<Envelope>,
    snapshots: watch::Receiver<Arc<StoreSnapshot>>,
}

impl StoreHandle {
    /// Queues a mutation without waiting for it to be applied.
    ///
    /// Commands from one caller are applied in the order they were submitted.
    pub fn submit(&self, command: StoreCommand) -> Result<(), StoreClosed> {
        self.commands
            .send(Envelope {
                command,
                respond_to: None,
            })
            .map_err(|_| StoreClosed)
    }

    /// Queues a mutation and waits until it has been applied and saved.
    pub async fn apply(&self, command: StoreCommand) -> Result<MutationOutcome, StoreClosed> {
        let (respond_to, response) = oneshot::channel();
        self.commands
            .send(Envelope {
                command,
                respond_to: Some(respond_to),
            })
            .map_err(|_| StoreClosed)?;
        response.await.map_err(|_| StoreClosed)
    }

    /// Latest published state. Never waits on the owning thread.
    pub fn snapshot(&self) -> Arc<StoreSnapshot> {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<StoreSnapshot>> {
        self.snapshots.clone()
    }

    #[cfg(test)]
    pub(crate) fn detached(
        snapshot: StoreSnapshot,
    ) -> (
        Self,
        mpsc::UnboundedReceiver<Envelope>,
        watch::Sender<Arc<StoreSnapshot>>,
    ) {
        let (commands, inbox) = mpsc::unbounded_channel();
        let (publisher, snapshots) = watch::channel(Arc::new(snapshot));
        (
            Self {
                commands,
                snapshots,
            },
            inbox,
            publisher,
        )
    }
}

/// The thread that exclusively owns the store.
pub struct StoreOwner {
    thread: JoinHandle<()>,
}

impl StoreOwner {
    /// Moves `store` onto its own thread and returns the handle used to reach it.
    pub fn spawn(mut store: WishlistStore) -> Result<(StoreHandle, StoreOwner)> {
        let (commands, mut inbox) = mpsc::unbounded_channel::<Envelope>();
        let snapshots = store.subscribe();

        let thread = std::thread::Builder::new()
            .name(OWNER_THREAD_NAME.to_string())
            .spawn(move || {
                info!("[wishcraft:store] Owner thread started");
                while let Some(Envelope {
                    command,
                    respond_to,
                }) = inbox.blocking_recv()
                {
                    let outcome = store.apply(command);
                    if outcome == MutationOutcome::Unsaved {
                        warn!("[wishcraft:store] Change kept in memory only");
                    }
                    if let Some(respond_to) = respond_to {
                        let _ = respond_to.send(outcome);
                    }
                }
                info!("[wishcraft:store] All handles dropped, owner thread exiting");
            })
            .context("failed to spawn wishlist store thread")?;

        Ok((
            StoreHandle {
                commands,
                snapshots,
            },
            StoreOwner { thread },
        ))
    }

    /// Blocks until every [`StoreHandle`] is gone and the queue is drained.
    pub fn join(self) {
        if self.thread.join().is_err() {
            warn!("[wishcraft:store] Owner thread panicked");
        }
    }
}
