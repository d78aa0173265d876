pub mod feed;
pub mod health;
pub mod listing;
pub mod session;
