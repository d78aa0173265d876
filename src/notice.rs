//! User-facing notices shown after a write. The board speaks Azerbaijani.

use serde::{Deserialize, Serialize};

pub const SUCCESS_TITLE: &str = "Uğurlu!";
pub const FAILURE_TITLE: &str = "Xəta";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub title: String,
    pub message: String,
}

impl Notice {
    fn new(title: &str, message: &str) -> Self {
        Self {
            title: title.to_string(),
            message: message.to_string(),
        }
    }

    pub fn listing_submitted() -> Self {
        Self::new(
            SUCCESS_TITLE,
            "Elanınız 1-2 saat ərzində yoxlanılıb paylaşılacaqdır.",
        )
    }

    pub fn listing_deleted() -> Self {
        Self::new(SUCCESS_TITLE, "Elanınız uğurla silindi.")
    }

    pub fn publish_failed() -> Self {
        Self::new(FAILURE_TITLE, "Elanınızı paylaşmaq mümkün olmadı.")
    }

    pub fn delete_failed() -> Self {
        Self::new(FAILURE_TITLE, "Elanınızı silmək mümkün olmadı.")
    }
}
