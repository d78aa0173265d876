pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod notice;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};

use crate::config::Config;
use crate::database::store::ListingStore;
use crate::middleware::{auth::require_session, rate_limit};
use crate::services::{
    contact_service::ContactService, feed_service::FeedService, listing_service::ListingService,
    session_service::SessionService,
};

const MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ListingStore>,
    pub feed_service: FeedService,
    pub listing_service: ListingService,
    pub session_service: SessionService,
    pub contact_service: ContactService,
    pub public_rps: u32,
    pub write_rps: u32,
}

impl AppState {
    pub fn new(config: &Config, store: Arc<dyn ListingStore>) -> Self {
        let feed_service = FeedService::new(store.clone());
        let listing_service =
            ListingService::new(store.clone(), feed_service.clone(), config.delete_policy);
        let session_service =
            SessionService::new(&config.session_secret, config.session_ttl_hours);
        let contact_service = ContactService::new(config.contact_country_code.clone());

        Self {
            store,
            feed_service,
            listing_service,
            session_service,
            contact_service,
            public_rps: config.public_rps,
            write_rps: config.write_rps,
        }
    }
}

/// Every route of the board. Browsing is open; anything that writes needs a
/// bearer session.
pub fn app(state: AppState) -> Router {
    let public_api = Router::new()
        .route("/api/session", post(routes::session::begin_session))
        .route("/api/listings", get(routes::listing::list_listings))
        .route("/api/listings/stream", get(routes::feed::stream_listings))
        .route("/api/listings/form-state", post(routes::listing::form_state))
        .route("/api/listings/:id", get(routes::listing::get_listing))
        .route(
            "/api/listings/:id/contact/:kind",
            get(routes::listing::contact_listing),
        )
        .layer(axum::middleware::from_fn_with_state(
            rate_limit::new_rps_state("public", state.public_rps),
            rate_limit::rps_middleware,
        ));

    let session_api = Router::new()
        .route("/api/session", get(routes::session::current_session))
        .route("/api/listings", post(routes::listing::create_listing))
        .route("/api/listings/:id", delete(routes::listing::delete_listing))
        .route_layer(axum::middleware::from_fn_with_state(
            state.session_service.clone(),
            require_session,
        ))
        .layer(axum::middleware::from_fn_with_state(
            rate_limit::new_rps_state("writes", state.write_rps),
            rate_limit::rps_middleware,
        ));

    Router::new()
        .route("/health", get(routes::health::health))
        .merge(public_api)
        .merge(session_api)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}
