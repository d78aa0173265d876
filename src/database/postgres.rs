use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{postgres::PgListener, types::Json, FromRow, PgPool};
use tokio::{sync::broadcast, task::JoinHandle};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::database::store::{ListingStore, StoreEvent, CHANGE_CHANNEL_CAPACITY};
use crate::error::Result;
use crate::models::listing::{Listing, ListingDetails, NewListing};

/// Channel the `job_ads` trigger publishes on.
pub const CHANGE_CHANNEL: &str = "job_ads_changed";

const LISTING_COLUMNS: &str = "id, user_id, created_at, contact_number, email, approved, hide_my_name, full_name, details";

#[derive(Debug, FromRow)]
struct ListingRow {
    id: Uuid,
    user_id: Uuid,
    created_at: Option<DateTime<Utc>>,
    contact_number: String,
    email: String,
    approved: bool,
    hide_my_name: bool,
    full_name: Option<String>,
    details: Json<ListingDetails>,
}

impl From<ListingRow> for Listing {
    fn from(row: ListingRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            created_at: row.created_at,
            contact_number: row.contact_number,
            email: row.email,
            approved: row.approved,
            hide_my_name: row.hide_my_name,
            full_name: row.full_name,
            details: row.details.0,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChangeNotification {
    op: String,
    id: Uuid,
    app_id: String,
}

impl ChangeNotification {
    fn into_event(self) -> StoreEvent {
        match self.op.as_str() {
            "insert" => StoreEvent::Insert(self.id),
            "update" => StoreEvent::Update(self.id),
            "delete" => StoreEvent::Delete(self.id),
            _ => StoreEvent::Resync,
        }
    }
}

/// `job_ads` table adapter. Rows of every app share the table and are scoped
/// by `app_id`; variant fields live in the `details` JSONB column.
#[derive(Clone)]
pub struct PgListingStore {
    pool: PgPool,
    app_id: String,
    events: broadcast::Sender<StoreEvent>,
}

impl PgListingStore {
    pub fn new(pool: PgPool, app_id: impl Into<String>) -> Self {
        let (events, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            pool,
            app_id: app_id.into(),
            events,
        }
    }

    /// Subscribes to the trigger channel and forwards this app's row changes
    /// to `changes()`. When the listening connection drops, a fresh listener
    /// is subscribed first and a `Resync` follows, since notifications sent
    /// while disconnected are gone.
    pub async fn listen(&self) -> Result<JoinHandle<()>> {
        let mut listener = subscribe(&self.pool).await?;
        info!(channel = CHANGE_CHANNEL, app_id = %self.app_id, "Listening for listing changes");

        let pool = self.pool.clone();
        let app_id = self.app_id.clone();
        let events = self.events.clone();
        Ok(tokio::spawn(async move {
            loop {
                let received = match listener.try_recv().await {
                    Ok(Some(notification)) => {
                        change_event(Some(notification.payload()), &app_id)
                    }
                    Ok(None) => {
                        warn!("Listing change listener lost its connection; resubscribing");
                        match resubscribe(&pool).await {
                            Some(fresh) => listener = fresh,
                            None => break,
                        }
                        change_event(None, &app_id)
                    }
                    Err(sqlx::Error::PoolClosed) => break,
                    Err(e) => {
                        warn!(error = ?e, "Listing change listener failed");
                        tokio::time::sleep(Duration::from_secs(1)).await;
                        Some(StoreEvent::Resync)
                    }
                };
                if let Some(event) = received {
                    let _ = events.send(event);
                }
            }
            info!("Database pool closed; listing change listener stopping");
        }))
    }
}

async fn subscribe(pool: &PgPool) -> sqlx::Result<PgListener> {
    let mut listener = PgListener::connect_with(pool).await?;
    listener.listen(CHANGE_CHANNEL).await?;
    Ok(listener)
}

/// Retries until a listener is subscribed again. `None` once the pool is closed.
async fn resubscribe(pool: &PgPool) -> Option<PgListener> {
    loop {
        match subscribe(pool).await {
            Ok(listener) => return Some(listener),
            Err(sqlx::Error::PoolClosed) => return None,
            Err(e) => {
                warn!(error = ?e, "Resubscribing to listing changes failed");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }
    }
}

/// Maps what the listener received to a store event. `None` as input means
/// the connection was lost, which always calls for a full resync; `None` as
/// output means the change belongs to another app.
fn change_event(payload: Option<&str>, app_id: &str) -> Option<StoreEvent> {
    let Some(payload) = payload else {
        return Some(StoreEvent::Resync);
    };
    match serde_json::from_str::<ChangeNotification>(payload) {
        Ok(change) if change.app_id == app_id => Some(change.into_event()),
        Ok(change) => {
            debug!(app_id = %change.app_id, "Ignoring change for another app");
            None
        }
        Err(e) => {
            warn!(error = %e, payload, "Unreadable change notification");
            Some(StoreEvent::Resync)
        }
    }
}

#[async_trait]
impl ListingStore for PgListingStore {
    fn collection_path(&self) -> String {
        format!("postgres://job_ads?app_id={}", self.app_id)
    }

    async fn insert(&self, listing: NewListing) -> Result<Listing> {
        let kind = listing.details.kind();
        let query = format!(
            r#"
            INSERT INTO job_ads (
                id, app_id, kind, user_id, contact_number, email,
                approved, hide_my_name, full_name, details
            ) VALUES ($1, $2, $3, $4, $5, $6, FALSE, $7, $8, $9)
            RETURNING {}
            "#,
            LISTING_COLUMNS
        );
        let row = sqlx::query_as::<_, ListingRow>(&query)
            .bind(Uuid::new_v4())
            .bind(&self.app_id)
            .bind(kind.as_str())
            .bind(listing.user_id)
            .bind(&listing.contact_number)
            .bind(&listing.email)
            .bind(listing.hide_my_name)
            .bind(&listing.full_name)
            .bind(Json(&listing.details))
            .fetch_one(&self.pool)
            .await?;

        Ok(row.into())
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM job_ads WHERE id = $1 AND app_id = $2")
            .bind(id)
            .bind(&self.app_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Listing>> {
        let query = format!(
            "SELECT {} FROM job_ads WHERE id = $1 AND app_id = $2",
            LISTING_COLUMNS
        );
        let row = sqlx::query_as::<_, ListingRow>(&query)
            .bind(id)
            .bind(&self.app_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    async fn list_approved(&self) -> Result<Vec<Listing>> {
        let query = format!(
            "SELECT {} FROM job_ads WHERE app_id = $1 AND approved = TRUE",
            LISTING_COLUMNS
        );
        let rows = sqlx::query_as::<_, ListingRow>(&query)
            .bind(&self.app_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    fn changes(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }
}
