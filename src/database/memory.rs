use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use crate::database::store::{ListingStore, StoreEvent, CHANGE_CHANNEL_CAPACITY};
use crate::error::{Error, Result};
use crate::models::listing::{Listing, NewListing};
use crate::utils::time;

#[derive(Default)]
struct Collection {
    listings: HashMap<Uuid, Listing>,
    last_created_at: Option<DateTime<Utc>>,
}

/// In-process listing store. Used when no database is configured and in
/// tests; `set_approved` stands in for the external moderator.
pub struct MemoryListingStore {
    app_id: String,
    collection: RwLock<Collection>,
    events: broadcast::Sender<StoreEvent>,
}

impl MemoryListingStore {
    pub fn new(app_id: impl Into<String>) -> Self {
        let (events, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            app_id: app_id.into(),
            collection: RwLock::new(Collection::default()),
            events,
        }
    }

    pub async fn set_approved(&self, id: Uuid, approved: bool) -> Result<()> {
        {
            let mut collection = self.collection.write().await;
            let listing = collection
                .listings
                .get_mut(&id)
                .ok_or_else(|| Error::NotFound(format!("listing {} not found", id)))?;
            listing.approved = approved;
        }
        self.announce(StoreEvent::Update(id));
        Ok(())
    }

    /// Inserts a fully formed record as-is, e.g. one imported from an older
    /// collection that never got a timestamp.
    pub async fn seed(&self, listing: Listing) {
        let id = listing.id;
        self.collection.write().await.listings.insert(id, listing);
        self.announce(StoreEvent::Insert(id));
    }

    pub async fn len(&self) -> usize {
        self.collection.read().await.listings.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn announce(&self, event: StoreEvent) {
        // No receivers just means nobody is watching yet.
        let _ = self.events.send(event);
    }
}

/// Next creation timestamp, strictly after the previous one.
fn next_created_at(last: Option<DateTime<Utc>>) -> DateTime<Utc> {
    let now = time::now();
    match last {
        Some(last) if now <= last => last + Duration::microseconds(1),
        _ => now,
    }
}

#[async_trait]
impl ListingStore for MemoryListingStore {
    fn collection_path(&self) -> String {
        format!("memory://artifacts/{}/public/data/job_ads", self.app_id)
    }

    async fn insert(&self, listing: NewListing) -> Result<Listing> {
        let stored = {
            let mut collection = self.collection.write().await;
            let created_at = next_created_at(collection.last_created_at);
            collection.last_created_at = Some(created_at);
            let stored = listing.into_listing(Uuid::new_v4(), created_at);
            collection.listings.insert(stored.id, stored.clone());
            stored
        };
        self.announce(StoreEvent::Insert(stored.id));
        Ok(stored)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let removed = self.collection.write().await.listings.remove(&id).is_some();
        if removed {
            self.announce(StoreEvent::Delete(id));
        }
        Ok(removed)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Listing>> {
        Ok(self.collection.read().await.listings.get(&id).cloned())
    }

    async fn list_approved(&self) -> Result<Vec<Listing>> {
        Ok(self
            .collection
            .read()
            .await
            .listings
            .values()
            .filter(|listing| listing.approved)
            .cloned()
            .collect())
    }

    fn changes(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }
}
