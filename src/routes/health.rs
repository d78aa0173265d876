use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::AppState;

#[axum::debug_handler]
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.feed_service.current();
    let body = json!({
        "status": "ok",
        "store": state.store.collection_path(),
        "feed_version": snapshot.version,
        "listings": snapshot.listings.len(),
        "subscribers": state.feed_service.subscriber_count(),
    });
    (StatusCode::OK, Json(body))
}
