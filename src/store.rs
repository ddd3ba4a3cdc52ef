use std::sync::Arc;

use log::{error, info};
use tokio::sync::watch;
use uuid::Uuid;

use crate::model::{
    Wishlist, WishlistItem, WishlistSummary, DEFAULT_WISHLIST_NAME, FIRST_WISHLIST_NAME,
};
use crate::persistence::Persistence;

/// Immutable view of the store published after every change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreSnapshot {
    pub wishlists: Vec<Wishlist>,
    pub selected_id: Option<Uuid>,
}

impl StoreSnapshot {
    pub fn summaries(&self) -> Vec<WishlistSummary> {
        self.wishlists.iter().map(Wishlist::summary).collect()
    }

    pub fn wishlist(&self, id: Uuid) -> Option<&Wishlist> {
        self.wishlists.iter().find(|wishlist| wishlist.id() == id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum MutationOutcome {
    /// The target id was not present; nothing changed.
    Ignored,
    /// Applied to view state only; nothing durable changed.
    Applied,
    /// Applied and written to durable storage.
    Persisted,
    /// Applied in memory but the save failed. Memory stays authoritative.
    Unsaved,
}

/// Mutations accepted by the store. Every variant is a silent no-op when its
/// target id does not exist.
#[derive(Debug, Clone)]
pub enum StoreCommand {
    AddWishlist { name: Option<String> },
    RenameWishlist { id: Uuid, name: String },
    DeleteWishlist { id: Uuid },
    SelectWishlist { id: Uuid },
    UpdateWishlist { wishlist: Wishlist },
    AddItem { wishlist_id: Uuid, item: WishlistItem },
    UpdateItem { wishlist_id: Uuid, item: WishlistItem },
    DeleteItem { wishlist_id: Uuid, item_id: Uuid },
}

/// The authoritative in-memory wishlist collection.
///
/// Each effective mutation saves the full collection before returning and
/// then publishes a fresh [`StoreSnapshot`] to subscribers.
pub struct WishlistStore {
    wishlists: Vec<Wishlist>,
    selected_id: Option<Uuid>,
    persistence: Box<dyn Persistence>,
    snapshots: watch::Sender<Arc<StoreSnapshot>>,
}

impl WishlistStore {
    /// Loads the stored collection, synthesizing a first wishlist when
    /// nothing usable is on disk.
    pub fn open(persistence: Box<dyn Persistence>) -> Self {
        let wishlists = persistence.load();
        let (snapshots, _) = watch::channel(Arc::new(StoreSnapshot::default()));
        let mut store = Self {
            wishlists,
            selected_id: None,
            persistence,
            snapshots,
        };

        if store.wishlists.is_empty() {
            info!("[wishcraft:store] No wishlists found, creating \"{FIRST_WISHLIST_NAME}\"");
            store.add_wishlist(Some(FIRST_WISHLIST_NAME));
        } else {
            store.selected_id = store.wishlists.first().map(Wishlist::id);
            info!(
                "[wishcraft:store] Loaded {} wishlist(s)",
                store.wishlists.len()
            );
            store.publish();
        }

        store
    }

    pub fn wishlists(&self) -> &[Wishlist] {
        &self.wishlists
    }

    pub fn wishlist(&self, id: Uuid) -> Option<&Wishlist> {
        self.wishlists.iter().find(|wishlist| wishlist.id() == id)
    }

    pub fn selected_id(&self) -> Option<Uuid> {
        self.selected_id
    }

    pub fn selected_wishlist(&self) -> Option<&Wishlist> {
        self.selected_id.and_then(|id| self.wishlist(id))
    }

    /// `(id, name)` pairs only; items and cover images never leave this way.
    pub fn list_wishlists(&self) -> Vec<WishlistSummary> {
        self.wishlists.iter().map(Wishlist::summary).collect()
    }

    pub fn snapshot(&self) -> Arc<StoreSnapshot> {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<StoreSnapshot>> {
        self.snapshots.subscribe()
    }

    /// Appends a new wishlist and selects it. Always succeeds.
    pub fn add_wishlist(&mut self, name: Option<&str>) -> Uuid {
        self.insert_wishlist(name).0
    }

    pub fn rename_wishlist(&mut self, id: Uuid, name: impl Into<String>) -> MutationOutcome {
        let Some(wishlist) = self.wishlist_mut(id) else {
            return MutationOutcome::Ignored;
        };
        wishlist.name = name.into();
        self.commit()
    }

    pub fn delete_wishlist(&mut self, id: Uuid) -> MutationOutcome {
        let before = self.wishlists.len();
        self.wishlists.retain(|wishlist| wishlist.id() != id);
        if self.wishlists.len() == before {
            return MutationOutcome::Ignored;
        }

        if self.selected_id == Some(id) {
            self.selected_id = self.wishlists.first().map(Wishlist::id);
        }
        self.commit()
    }

    /// Changes the selection. Selection is view state and is not saved.
    pub fn select_wishlist(&mut self, id: Uuid) -> MutationOutcome {
        if self.wishlist(id).is_none() {
            return MutationOutcome::Ignored;
        }
        if self.selected_id != Some(id) {
            self.selected_id = Some(id);
            self.publish();
        }
        MutationOutcome::Applied
    }

    /// Replaces the whole record with the same id, e.g. after a cover edit.
    pub fn update_wishlist(&mut self, wishlist: Wishlist) -> MutationOutcome {
        let Some(slot) = self.wishlist_mut(wishlist.id()) else {
            return MutationOutcome::Ignored;
        };
        *slot = wishlist;
        self.commit()
    }

    pub fn add_item(&mut self, wishlist_id: Uuid, item: WishlistItem) -> MutationOutcome {
        let Some(wishlist) = self.wishlist_mut(wishlist_id) else {
            return MutationOutcome::Ignored;
        };
        wishlist.items.push(item);
        self.commit()
    }

    pub fn update_item(&mut self, wishlist_id: Uuid, item: WishlistItem) -> MutationOutcome {
        let Some(slot) = self
            .wishlist_mut(wishlist_id)
            .and_then(|wishlist| wishlist.items.iter_mut().find(|it| it.id() == item.id()))
        else {
            return MutationOutcome::Ignored;
        };
        *slot = item;
        self.commit()
    }

    pub fn delete_item(&mut self, wishlist_id: Uuid, item_id: Uuid) -> MutationOutcome {
        let Some(wishlist) = self.wishlist_mut(wishlist_id) else {
            return MutationOutcome::Ignored;
        };
        let before = wishlist.items.len();
        wishlist.items.retain(|item| item.id() != item_id);
        if wishlist.items.len() == before {
            return MutationOutcome::Ignored;
        }
        self.commit()
    }

    pub fn apply(&mut self, command: StoreCommand) -> MutationOutcome {
        match command {
            StoreCommand::AddWishlist { name } => self.insert_wishlist(name.as_deref()).1,
            StoreCommand::RenameWishlist { id, name } => self.rename_wishlist(id, name),
            StoreCommand::DeleteWishlist { id } => self.delete_wishlist(id),
            StoreCommand::SelectWishlist { id } => self.select_wishlist(id),
            StoreCommand::UpdateWishlist { wishlist } => self.update_wishlist(wishlist),
            StoreCommand::AddItem { wishlist_id, item } => self.add_item(wishlist_id, item),
            StoreCommand::UpdateItem { wishlist_id, item } => self.update_item(wishlist_id, item),
            StoreCommand::DeleteItem {
                wishlist_id,
                item_id,
            } => self.delete_item(wishlist_id, item_id),
        }
    }

    fn insert_wishlist(&mut self, name: Option<&str>) -> (Uuid, MutationOutcome) {
        let wishlist = Wishlist::new(name.unwrap_or(DEFAULT_WISHLIST_NAME));
        let id = wishlist.id();
        self.wishlists.push(wishlist);
        self.selected_id = Some(id);
        (id, self.commit())
    }

    fn wishlist_mut(&mut self, id: Uuid) -> Option<&mut Wishlist> {
        self.wishlists.iter_mut().find(|wishlist| wishlist.id() == id)
    }

    fn commit(&mut self) -> MutationOutcome {
        let outcome = match self.persistence.save(&self.wishlists) {
            Ok(()) => MutationOutcome::Persisted,
            Err(err) => {
                error!("[wishcraft:store] Error saving wishlists: {err:#}");
                MutationOutcome::Unsaved
            }
        };
        self.publish();
        outcome
    }

    fn publish(&self) {
        let snapshot = StoreSnapshot {
            wishlists: self.wishlists.clone(),
            selected_id: self.selected_id,
        };
        self.snapshots.send_replace(Arc::new(snapshot));
    }
}
