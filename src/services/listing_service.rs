use std::sync::Arc;

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::DeletePolicy;
use crate::database::store::ListingStore;
use crate::dto::listing_form::ListingForm;
use crate::error::{Error, Result};
use crate::models::listing::Listing;
use crate::models::session::Session;
use crate::services::feed_service::FeedService;

/// Create and delete paths for listings. Both re-sync the feed once the
/// store confirms the write, so the caller's next read reflects it.
#[derive(Clone)]
pub struct ListingService {
    store: Arc<dyn ListingStore>,
    feed: FeedService,
    delete_policy: DeletePolicy,
}

impl ListingService {
    pub fn new(store: Arc<dyn ListingStore>, feed: FeedService, delete_policy: DeletePolicy) -> Self {
        Self {
            store,
            feed,
            delete_policy,
        }
    }

    pub async fn create(&self, session: &Session, form: &ListingForm) -> Result<Listing> {
        let new_listing = form.to_new_listing(session.id)?;

        let listing = self.store.insert(new_listing).await.map_err(|e| {
            error!(error = ?e, session_id = %session.id, "Error adding listing");
            Error::PublishFailed(e.to_string())
        })?;

        info!(
            listing_id = %listing.id,
            kind = listing.kind().as_str(),
            session_id = %session.id,
            collection = %self.store.collection_path(),
            "Listing submitted for moderation"
        );
        self.sync_feed().await;
        Ok(listing)
    }

    pub async fn delete(&self, session: &Session, id: Uuid) -> Result<()> {
        if self.delete_policy == DeletePolicy::OwnerOnly {
            let listing = self.store.find(id).await.map_err(|e| {
                error!(error = ?e, listing_id = %id, "Error loading listing for delete");
                Error::DeleteFailed(e.to_string())
            })?;
            match listing {
                None => return Err(Error::NotFound(format!("listing {} not found", id))),
                Some(listing) if listing.user_id != session.id => {
                    return Err(Error::Forbidden("listing belongs to another session".into()))
                }
                Some(_) => {}
            }
        }

        let removed = self.store.delete(id).await.map_err(|e| {
            error!(error = ?e, listing_id = %id, "Error deleting listing");
            Error::DeleteFailed(e.to_string())
        })?;
        if !removed {
            return Err(Error::NotFound(format!("listing {} not found", id)));
        }

        info!(listing_id = %id, session_id = %session.id, "Listing deleted");
        self.sync_feed().await;
        Ok(())
    }

    async fn sync_feed(&self) {
        if let Err(e) = self.feed.refresh().await {
            warn!(error = ?e, "Feed refresh after write failed; change listener will retry");
        }
    }
}
