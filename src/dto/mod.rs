pub mod listing_dto;
pub mod listing_form;
pub mod session_dto;
