use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

use crate::services::session_service::SessionService;

/// Pulls the token out of an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> std::result::Result<&str, &'static str> {
    let Some(auth_header) = headers.get(AUTHORIZATION) else {
        return Err("missing_authorization");
    };
    let Ok(auth_str) = auth_header.to_str() else {
        return Err("bad_authorization");
    };
    let Some(token) = auth_str.strip_prefix("Bearer ") else {
        return Err("unsupported_scheme");
    };
    let token = token.trim();
    if token.is_empty() {
        return Err("missing_authorization");
    }
    Ok(token)
}

/// Rejects requests without a valid anonymous session and makes the
/// `Session` available to handlers as an extension.
pub async fn require_session(
    State(sessions): State<SessionService>,
    mut req: Request,
    next: Next,
) -> Response {
    let token = match bearer_token(req.headers()) {
        Ok(token) => token,
        Err(code) => {
            return (StatusCode::UNAUTHORIZED, Json(json!({ "error": code }))).into_response()
        }
    };

    match sessions.verify(token) {
        Ok(session) => {
            req.extensions_mut().insert(session);
            next.run(req).await
        }
        Err(e) => {
            tracing::debug!(error = %e, "Rejected session token");
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "invalid_token" })),
            )
                .into_response()
        }
    }
}
