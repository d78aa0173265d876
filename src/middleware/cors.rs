use axum::http::{header, Method};
use tower_http::cors::{Any, CorsLayer};

/// The board is embedded in third-party pages, so any origin may read the
/// feed. Writes still need a bearer session.
pub fn permissive_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_origin(Any)
}
