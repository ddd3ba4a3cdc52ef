//! Wishlist store, durable JSON persistence and the localhost bridge used by
//! the WishCraft browser extension.

pub mod bridge;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod owner;
pub mod persistence;
pub mod store;

pub use bridge::{Bridge, BridgeStatus};
pub use config::{AckPolicy, AppConfig, BridgeConfig};
pub use error::{BridgeError, ItemError, StoreClosed};
pub use model::{Wishlist, WishlistItem, WishlistSummary};
pub use owner::{StoreHandle, StoreOwner};
pub use persistence::{JsonFileStorage, Persistence};
pub use store::{MutationOutcome, StoreCommand, StoreSnapshot, WishlistStore};
