use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};

use crate::{dto::session_dto::SessionResponse, error::Result, models::session::Session, AppState};

#[utoipa::path(
    post,
    path = "/api/session",
    responses(
        (status = 201, description = "Anonymous session started", body = Json<SessionResponse>)
    )
)]
#[axum::debug_handler]
pub async fn begin_session(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let issued = state.session_service.begin_anonymous()?;
    Ok((StatusCode::CREATED, Json(SessionResponse::from(issued))))
}

#[utoipa::path(
    get,
    path = "/api/session",
    responses(
        (status = 200, description = "Session behind the bearer token", body = Json<SessionResponse>),
        (status = 401, description = "Missing or invalid session token")
    )
)]
#[axum::debug_handler]
pub async fn current_session(Extension(session): Extension<Session>) -> impl IntoResponse {
    Json(SessionResponse::from(session))
}
