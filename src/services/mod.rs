pub mod contact_service;
pub mod feed_service;
pub mod listing_service;
pub mod session_service;
