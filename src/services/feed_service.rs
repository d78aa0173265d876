use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast::error::RecvError, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::database::store::ListingStore;
use crate::error::Result;
use crate::models::listing::{Listing, ListingKind};

/// Which listings a viewer wants to see. Applied to the current snapshot
/// without touching the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedFilter {
    #[default]
    All,
    JobSeeker,
    Employer,
}

impl FeedFilter {
    pub fn matches(&self, kind: ListingKind) -> bool {
        match self {
            FeedFilter::All => true,
            FeedFilter::JobSeeker => kind == ListingKind::JobSeeker,
            FeedFilter::Employer => kind == ListingKind::Employer,
        }
    }

    pub fn empty_message(&self) -> String {
        let audience = match self {
            FeedFilter::All => "",
            FeedFilter::JobSeeker => "iş axtaran ",
            FeedFilter::Employer => "işçi axtaran ",
        };
        format!("Hələlik aktiv {}elanı yoxdur.", audience)
    }
}

/// Full, sorted set of approved listings as of one store read.
#[derive(Debug, Clone, Default)]
pub struct FeedSnapshot {
    pub version: u64,
    pub listings: Vec<Listing>,
}

impl FeedSnapshot {
    pub fn filtered(&self, filter: FeedFilter) -> Vec<Listing> {
        self.listings
            .iter()
            .filter(|listing| filter.matches(listing.kind()))
            .cloned()
            .collect()
    }

    pub fn find(&self, id: Uuid) -> Option<&Listing> {
        self.listings.iter().find(|listing| listing.id == id)
    }
}

/// A filtered view of one snapshot, as handed to a subscriber.
#[derive(Debug, Clone)]
pub struct FeedView {
    pub version: u64,
    pub filter: FeedFilter,
    pub listings: Vec<Listing>,
}

/// Newest first. Listings without a creation timestamp sort as the oldest.
pub fn sort_newest_first(listings: &mut [Listing]) {
    listings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

/// Live query over approved listings.
///
/// Every refresh replaces the whole snapshot; subscribers always observe the
/// most recently published one and never a partial merge.
#[derive(Clone)]
pub struct FeedService {
    store: Arc<dyn ListingStore>,
    snapshots: Arc<watch::Sender<Arc<FeedSnapshot>>>,
    refresh_lock: Arc<Mutex<()>>,
}

impl FeedService {
    pub fn new(store: Arc<dyn ListingStore>) -> Self {
        let (snapshots, _) = watch::channel(Arc::new(FeedSnapshot::default()));
        Self {
            store,
            snapshots: Arc::new(snapshots),
            refresh_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Re-reads the approved listings and publishes them as the new snapshot.
    /// On error the previous snapshot stays in place.
    pub async fn refresh(&self) -> Result<Arc<FeedSnapshot>> {
        let _guard = self.refresh_lock.lock().await;

        let mut listings = self.store.list_approved().await?;
        listings.retain(|listing| listing.approved);
        sort_newest_first(&mut listings);

        let version = self.snapshots.borrow().version + 1;
        let snapshot = Arc::new(FeedSnapshot { version, listings });
        self.snapshots.send_replace(snapshot.clone());
        debug!(
            version,
            listings = snapshot.listings.len(),
            "Published feed snapshot"
        );
        Ok(snapshot)
    }

    pub fn current(&self) -> Arc<FeedSnapshot> {
        self.snapshots.borrow().clone()
    }

    pub fn view(&self, filter: FeedFilter) -> FeedView {
        let snapshot = self.current();
        FeedView {
            version: snapshot.version,
            filter,
            listings: snapshot.filtered(filter),
        }
    }

    pub fn subscribe(&self, filter: FeedFilter) -> FeedSubscription {
        FeedSubscription {
            receiver: self.snapshots.subscribe(),
            filter,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.snapshots.receiver_count()
    }

    /// Subscribes to store changes and then loads the first snapshot, so a
    /// change committed during the initial read still triggers a refresh.
    pub async fn start(&self) -> Result<JoinHandle<()>> {
        let listener = self.spawn_change_listener();
        if let Err(e) = self.refresh().await {
            listener.abort();
            return Err(e);
        }
        Ok(listener)
    }

    /// Refreshes the feed whenever the store reports a change. Runs until the
    /// store's change stream closes.
    pub fn spawn_change_listener(&self) -> JoinHandle<()> {
        let feed = self.clone();
        let mut changes = self.store.changes();
        let collection = self.store.collection_path();
        tokio::spawn(async move {
            info!(%collection, "Feed change listener started");
            loop {
                match changes.recv().await {
                    Ok(event) => debug!(?event, "Listing collection changed"),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Feed change listener lagged; resyncing")
                    }
                    Err(RecvError::Closed) => {
                        info!(%collection, "Listing change stream closed");
                        break;
                    }
                }
                if let Err(e) = feed.refresh().await {
                    error!(error = ?e, "Feed refresh failed; keeping previous snapshot");
                }
            }
        })
    }
}

/// One live subscription. Dropping it, or calling `cancel`, releases it.
pub struct FeedSubscription {
    receiver: watch::Receiver<Arc<FeedSnapshot>>,
    filter: FeedFilter,
}

impl FeedSubscription {
    pub fn filter(&self) -> FeedFilter {
        self.filter
    }

    /// The latest snapshot, marked as seen.
    pub fn current(&mut self) -> FeedView {
        let snapshot = self.receiver.borrow_and_update().clone();
        FeedView {
            version: snapshot.version,
            filter: self.filter,
            listings: snapshot.filtered(self.filter),
        }
    }

    /// Waits for the next published snapshot. Intermediate snapshots that
    /// arrive while the caller is busy are skipped. `None` once the feed
    /// service is gone.
    pub async fn next(&mut self) -> Option<FeedView> {
        self.receiver.changed().await.ok()?;
        Some(self.current())
    }

    pub fn cancel(self) {}
}
