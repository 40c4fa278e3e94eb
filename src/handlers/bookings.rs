use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Json, response::IntoResponse};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use super::{json_body, path_id, query};
use crate::AppState;
use crate::error::ApiError;
use crate::models::{
    Actor, Booking, BookingFilter, BookingStatus, ClassBooking, CreateBookingRequest,
};

#[derive(Debug, Default, Deserialize)]
pub struct StatusQuery {
    pub status: Option<BookingStatus>,
}

#[utoipa::path(
    post,
    path = "/bookings",
    request_body = CreateBookingRequest,
    responses(
        (status = 201, description = "Booking confirmed", body = Booking),
        (status = 400, description = "Class not bookable or already started"),
        (status = 403, description = "Caller is not a member or has no active subscription"),
        (status = 404, description = "Class not found"),
        (status = 409, description = "Class full or booking already exists"),
        (status = 503, description = "Subscription could not be verified")
    ),
    security(("bearer_auth" = [])),
    tag = "bookings"
)]
pub async fn create_booking(
    State(state): State<AppState>,
    actor: Actor,
    payload: Result<Json<CreateBookingRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let request = json_body(payload)?;
    let booking = state
        .bookings
        .create(&actor, request.class_id, Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

#[utoipa::path(
    put,
    path = "/bookings/{id}/cancel",
    params(("id" = Uuid, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Booking cancelled", body = Booking),
        (status = 400, description = "Booking not active or cancellation window closed"),
        (status = 403, description = "Booking belongs to someone else"),
        (status = 404, description = "Booking not found")
    ),
    security(("bearer_auth" = [])),
    tag = "bookings"
)]
pub async fn cancel_booking(
    State(state): State<AppState>,
    actor: Actor,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = path_id(id)?;
    Ok(Json(state.bookings.cancel(id, &actor, Utc::now()).await?))
}

#[utoipa::path(
    get,
    path = "/bookings/my-bookings",
    params(("status" = Option<String>, Query, description = "CONFIRMED, CANCELLED or COMPLETED")),
    responses((status = 200, description = "Bookings of the caller, newest first", body = [Booking])),
    security(("bearer_auth" = [])),
    tag = "bookings"
)]
pub async fn my_bookings(
    State(state): State<AppState>,
    actor: Actor,
    params: Result<Query<StatusQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let params = query(params)?;
    Ok(Json(
        state
            .bookings
            .list_mine(&actor, params.status, Utc::now())
            .await,
    ))
}

#[utoipa::path(
    get,
    path = "/bookings/class/{class_id}",
    params(
        ("class_id" = Uuid, Path, description = "Class id"),
        ("status" = Option<String>, Query, description = "CONFIRMED, CANCELLED or COMPLETED")
    ),
    responses(
        (status = 200, description = "Bookings of the class", body = [ClassBooking]),
        (status = 403, description = "Caller does not manage this class"),
        (status = 404, description = "Class not found")
    ),
    security(("bearer_auth" = [])),
    tag = "bookings"
)]
pub async fn class_bookings(
    State(state): State<AppState>,
    actor: Actor,
    class_id: Result<Path<Uuid>, PathRejection>,
    params: Result<Query<StatusQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let class_id = path_id(class_id)?;
    let params = query(params)?;
    Ok(Json(
        state
            .bookings
            .list_for_class(class_id, params.status, &actor, Utc::now())
            .await?,
    ))
}

#[utoipa::path(
    get,
    path = "/bookings",
    params(
        ("status" = Option<String>, Query, description = "CONFIRMED, CANCELLED or COMPLETED"),
        ("userId" = Option<String>, Query, description = "Only bookings of this user"),
        ("classId" = Option<Uuid>, Query, description = "Only bookings of this class")
    ),
    responses(
        (status = 200, description = "All bookings, newest first", body = [Booking]),
        (status = 403, description = "Caller is not an admin")
    ),
    security(("bearer_auth" = [])),
    tag = "bookings"
)]
pub async fn list_bookings(
    State(state): State<AppState>,
    actor: Actor,
    filter: Result<Query<BookingFilter>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = query(filter)?;
    Ok(Json(
        state
            .bookings
            .list_all(&filter, &actor, Utc::now())
            .await?,
    ))
}
