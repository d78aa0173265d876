use async_trait::async_trait;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::error::Result;
use crate::models::listing::{Listing, NewListing};

/// Capacity of the per-store change channel. Slow listeners that fall behind
/// see `Lagged` and resync from a full query.
pub const CHANGE_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEvent {
    Insert(Uuid),
    Update(Uuid),
    Delete(Uuid),
    /// Notifications may have been missed; re-read everything.
    Resync,
}

/// Persistence port for the `job_ads` collection.
///
/// Adapters assign ids and creation timestamps, never flip `approved` on
/// their own, and announce every committed change on `changes()`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ListingStore: Send + Sync {
    /// Human readable location of the collection, used in logs.
    fn collection_path(&self) -> String;

    /// Stores a new, unapproved listing.
    async fn insert(&self, listing: NewListing) -> Result<Listing>;

    /// Permanently removes a listing. Returns false if nothing matched.
    async fn delete(&self, id: Uuid) -> Result<bool>;

    async fn find(&self, id: Uuid) -> Result<Option<Listing>>;

    /// Every listing whose approval flag is set, in no particular order.
    async fn list_approved(&self) -> Result<Vec<Listing>>;

    fn changes(&self) -> broadcast::Receiver<StoreEvent>;
}
