use std::convert::Infallible;
use std::time::Duration;

use axum::{
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::Stream;
use tracing::{info, warn};

use crate::{
    dto::listing_dto::{FeedQuery, FeedResponse},
    services::feed_service::FeedView,
    AppState,
};

const KEEP_ALIVE: Duration = Duration::from_secs(15);

fn snapshot_event(view: FeedView) -> Option<Event> {
    let version = view.version;
    match Event::default()
        .event("snapshot")
        .id(version.to_string())
        .json_data(FeedResponse::from(view))
    {
        Ok(event) => Some(event),
        Err(e) => {
            warn!(error = %e, version, "Failed to encode feed snapshot");
            None
        }
    }
}

/// `GET /api/listings/stream`: the current snapshot right away, then a new
/// `snapshot` event every time the feed changes. Closing the connection
/// cancels the subscription.
#[utoipa::path(
    get,
    path = "/api/listings/stream",
    params(
        ("type" = Option<String>, Query, description = "all, job_seeker or employer")
    ),
    responses(
        (status = 200, description = "text/event-stream of feed snapshots")
    )
)]
pub async fn stream_listings(
    State(state): State<AppState>,
    Query(query): Query<FeedQuery>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut subscription = state.feed_service.subscribe(query.kind);
    info!(filter = ?subscription.filter(), "Feed stream opened");

    let stream = async_stream::stream! {
        if let Some(event) = snapshot_event(subscription.current()) {
            yield Ok(event);
        }
        while let Some(view) = subscription.next().await {
            if let Some(event) = snapshot_event(view) {
                yield Ok(event);
            }
        }
        info!(filter = ?subscription.filter(), "Feed stream closed");
    };

    Sse::new(stream).keep_alive(KeepAlive::new().interval(KEEP_ALIVE).text("keep-alive"))
}
