use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;

use crate::{
    dto::{
        listing_dto::{
            CreateListingResponse, DeleteListingResponse, FeedQuery, FeedResponse, ListingResponse,
        },
        listing_form::{FormStateResponse, ListingForm},
    },
    error::{Error, Result},
    models::session::Session,
    notice::Notice,
    services::contact_service::ContactKind,
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/listings",
    params(
        ("type" = Option<String>, Query, description = "all, job_seeker or employer")
    ),
    responses(
        (status = 200, description = "Approved listings, newest first", body = Json<FeedResponse>)
    )
)]
#[axum::debug_handler]
pub async fn list_listings(
    State(state): State<AppState>,
    Query(query): Query<FeedQuery>,
) -> impl IntoResponse {
    Json(FeedResponse::from(state.feed_service.view(query.kind)))
}

#[utoipa::path(
    get,
    path = "/api/listings/{id}",
    params(
        ("id" = Uuid, Path, description = "Listing ID")
    ),
    responses(
        (status = 200, description = "Approved listing", body = Json<ListingResponse>),
        (status = 404, description = "Listing not found or not approved")
    )
)]
#[axum::debug_handler]
pub async fn get_listing(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let snapshot = state.feed_service.current();
    let listing = snapshot
        .find(id)
        .ok_or_else(|| Error::NotFound(format!("listing {} not found", id)))?;
    Ok(Json(ListingResponse::from(listing)))
}

#[utoipa::path(
    post,
    path = "/api/listings",
    request_body = ListingForm,
    responses(
        (status = 201, description = "Listing stored, awaiting approval", body = Json<CreateListingResponse>),
        (status = 400, description = "Invalid or malformed form"),
        (status = 401, description = "Missing or invalid session token"),
        (status = 503, description = "Listing could not be stored")
    )
)]
#[axum::debug_handler]
pub async fn create_listing(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    form: std::result::Result<Json<ListingForm>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(form) = form?;
    let listing = state.listing_service.create(&session, &form).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateListingResponse {
            id: listing.id,
            approved: listing.approved,
            notice: Notice::listing_submitted(),
        }),
    ))
}

#[utoipa::path(
    delete,
    path = "/api/listings/{id}",
    params(
        ("id" = Uuid, Path, description = "Listing ID")
    ),
    responses(
        (status = 200, description = "Listing deleted", body = Json<DeleteListingResponse>),
        (status = 401, description = "Missing or invalid session token"),
        (status = 403, description = "Listing belongs to another session"),
        (status = 404, description = "Listing not found"),
        (status = 503, description = "Listing could not be deleted")
    )
)]
#[axum::debug_handler]
pub async fn delete_listing(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.listing_service.delete(&session, id).await?;
    Ok(Json(DeleteListingResponse {
        id,
        notice: Notice::listing_deleted(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/listings/form-state",
    request_body = ListingForm,
    responses(
        (status = 200, description = "Value, enabled and required state per input", body = Json<FormStateResponse>),
        (status = 400, description = "Malformed form")
    )
)]
#[axum::debug_handler]
pub async fn form_state(
    form: std::result::Result<Json<ListingForm>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(form) = form?;
    Ok(Json(FormStateResponse::from(&form)))
}

#[utoipa::path(
    get,
    path = "/api/listings/{id}/contact/{kind}",
    params(
        ("id" = Uuid, Path, description = "Listing ID"),
        ("kind" = String, Path, description = "phone or email")
    ),
    responses(
        (status = 200, description = "Confirmation prompt and hand-off URI"),
        (status = 400, description = "Author did not share this contact"),
        (status = 404, description = "Listing not found or not approved")
    )
)]
#[axum::debug_handler]
pub async fn contact_listing(
    State(state): State<AppState>,
    Path((id, kind)): Path<(Uuid, ContactKind)>,
) -> Result<impl IntoResponse> {
    let snapshot = state.feed_service.current();
    let listing = snapshot
        .find(id)
        .ok_or_else(|| Error::NotFound(format!("listing {} not found", id)))?;
    let prompt = state.contact_service.for_listing(listing, kind)?;
    Ok(Json(prompt))
}
