use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::session::Session;
use crate::services::session_service::IssuedSession;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub session_id: Uuid,
    pub expires_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl From<IssuedSession> for SessionResponse {
    fn from(issued: IssuedSession) -> Self {
        Self {
            session_id: issued.session.id,
            expires_at: issued.session.expires_at,
            token: Some(issued.token),
        }
    }
}

impl From<Session> for SessionResponse {
    fn from(session: Session) -> Self {
        Self {
            session_id: session.id,
            expires_at: session.expires_at,
            token: None,
        }
    }
}
