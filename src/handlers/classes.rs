use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::{Json, response::IntoResponse};
use chrono::Utc;
use uuid::Uuid;

use super::{json_body, path_id, query};
use crate::AppState;
use crate::error::ApiError;
use crate::models::{Actor, Class, ClassFilter, CreateClassRequest, UpdateClassRequest};

#[utoipa::path(
    get,
    path = "/classes",
    params(
        ("status" = Option<String>, Query, description = "ACTIVE, CANCELLED or COMPLETED"),
        ("monitorId" = Option<String>, Query, description = "Only classes of this monitor"),
        ("room" = Option<String>, Query, description = "Only classes in this room"),
        ("from" = Option<String>, Query, description = "Earliest start (ISO 8601)"),
        ("to" = Option<String>, Query, description = "Latest start (ISO 8601)")
    ),
    responses(
        (status = 200, description = "Classes ordered by start time", body = [Class]),
        (status = 401, description = "Invalid authentication token")
    ),
    security(("bearer_auth" = [])),
    tag = "classes"
)]
pub async fn list_classes(
    State(state): State<AppState>,
    _actor: Actor,
    filter: Result<Query<ClassFilter>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = query(filter)?;
    Ok(Json(state.classes.list(&filter, Utc::now()).await))
}

#[utoipa::path(
    get,
    path = "/classes/my-classes",
    responses(
        (status = 200, description = "Classes taught by the caller", body = [Class]),
        (status = 403, description = "Caller is not a monitor")
    ),
    security(("bearer_auth" = [])),
    tag = "classes"
)]
pub async fn my_classes(
    State(state): State<AppState>,
    actor: Actor,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.classes.list_for_monitor(&actor, Utc::now()).await?))
}

#[utoipa::path(
    get,
    path = "/classes/{id}",
    params(("id" = Uuid, Path, description = "Class id")),
    responses(
        (status = 200, description = "The class", body = Class),
        (status = 404, description = "Class not found")
    ),
    security(("bearer_auth" = [])),
    tag = "classes"
)]
pub async fn get_class(
    State(state): State<AppState>,
    _actor: Actor,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = path_id(id)?;
    Ok(Json(state.classes.get(id, Utc::now()).await?))
}

#[utoipa::path(
    post,
    path = "/classes",
    request_body = CreateClassRequest,
    responses(
        (status = 201, description = "Class created", body = Class),
        (status = 400, description = "Invalid class data"),
        (status = 403, description = "Caller is not a monitor or admin"),
        (status = 409, description = "Monitor or room already busy")
    ),
    security(("bearer_auth" = [])),
    tag = "classes"
)]
pub async fn create_class(
    State(state): State<AppState>,
    actor: Actor,
    payload: Result<Json<CreateClassRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let request = json_body(payload)?;
    let class = state.classes.create(&actor, request, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(class)))
}

#[utoipa::path(
    put,
    path = "/classes/{id}",
    params(("id" = Uuid, Path, description = "Class id")),
    request_body = UpdateClassRequest,
    responses(
        (status = 200, description = "Class updated", body = Class),
        (status = 400, description = "Invalid data or class no longer editable"),
        (status = 403, description = "Caller does not manage this class"),
        (status = 404, description = "Class not found"),
        (status = 409, description = "Monitor or room already busy, or capacity below occupancy")
    ),
    security(("bearer_auth" = [])),
    tag = "classes"
)]
pub async fn update_class(
    State(state): State<AppState>,
    actor: Actor,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateClassRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = path_id(id)?;
    let changes = json_body(payload)?;
    Ok(Json(
        state.classes.update(id, changes, &actor, Utc::now()).await?,
    ))
}

#[utoipa::path(
    put,
    path = "/classes/{id}/cancel",
    params(("id" = Uuid, Path, description = "Class id")),
    responses(
        (status = 200, description = "Class and its bookings cancelled", body = Class),
        (status = 400, description = "Class already cancelled or completed"),
        (status = 403, description = "Caller does not manage this class"),
        (status = 404, description = "Class not found")
    ),
    security(("bearer_auth" = [])),
    tag = "classes"
)]
pub async fn cancel_class(
    State(state): State<AppState>,
    actor: Actor,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = path_id(id)?;
    Ok(Json(state.classes.cancel(id, &actor, Utc::now()).await?))
}

#[utoipa::path(
    delete,
    path = "/classes/{id}",
    params(("id" = Uuid, Path, description = "Class id")),
    responses(
        (status = 204, description = "Class and its bookings deleted"),
        (status = 403, description = "Caller is not an admin"),
        (status = 404, description = "Class not found"),
        (status = 409, description = "Class still has confirmed bookings")
    ),
    security(("bearer_auth" = [])),
    tag = "classes"
)]
pub async fn delete_class(
    State(state): State<AppState>,
    actor: Actor,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = path_id(id)?;
    state.classes.delete(id, &actor).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/classes.ical",
    params(
        ("token" = Option<String>, Query, description = "Authentication token (alternative to Bearer header)")
    ),
    responses(
        (status = 200, description = "iCal file", content_type = "text/calendar"),
        (status = 401, description = "Invalid authentication token")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "classes"
)]
pub async fn classes_ical(
    State(state): State<AppState>,
    _actor: Actor,
) -> Result<impl IntoResponse, ApiError> {
    let classes = state.classes.upcoming(Utc::now()).await;
    let body = state.exporter.generate(&classes);
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/calendar"),
            (header::CONTENT_DISPOSITION, "attachment; filename=classes.ics"),
        ],
        body,
    ))
}
