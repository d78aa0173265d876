use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::session::Session;
use crate::utils::time;

const ANONYMOUS: &str = "anonymous";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: usize,
    pub exp: usize,
    pub kind: String,
}

/// A freshly started session and the bearer token that proves it.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub session: Session,
    pub token: String,
}

/// Issues and checks anonymous session tokens.
#[derive(Clone)]
pub struct SessionService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl SessionService {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::hours(ttl_hours.clamp(1, 24 * 365)),
        }
    }

    pub fn begin_anonymous(&self) -> Result<IssuedSession> {
        let now = time::now();
        let session = Session {
            id: Uuid::new_v4(),
            expires_at: now + self.ttl,
        };
        let claims = Claims {
            sub: session.id.to_string(),
            iat: now.timestamp() as usize,
            exp: session.expires_at.timestamp() as usize,
            kind: ANONYMOUS.to_string(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        info!(session_id = %session.id, "Anonymous session started");

        Ok(IssuedSession { session, token })
    }

    pub fn verify(&self, token: &str) -> Result<Session> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        let claims = data.claims;

        if claims.kind != ANONYMOUS {
            return Err(Error::Unauthorized("unsupported_session".to_string()));
        }
        let id = Uuid::parse_str(&claims.sub)
            .map_err(|_| Error::Unauthorized("invalid_token".to_string()))?;
        let expires_at = DateTime::<Utc>::from_timestamp(claims.exp as i64, 0)
            .ok_or_else(|| Error::Unauthorized("invalid_token".to_string()))?;

        Ok(Session { id, expires_at })
    }
}
