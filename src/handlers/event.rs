use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    error::{AppError, Result},
    handlers::extract::AuthUser,
    models::event::{CreatedEvent, EventFields, ListQuery},
    services::scheduler::sort_by_date,
    state::AppState,
};

/// List the events visible to the caller, optionally ordered by date
pub async fn list_events(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse> {
    let events = state.bookings.list_events(&identity).await?;

    let events = match query.sort.as_deref() {
        None => events,
        Some("date") => sort_by_date(&events),
        Some(other) => {
            return Err(AppError::Validation(format!("cannot sort by {other}")));
        }
    };

    Ok((StatusCode::OK, Json(events)))
}

/// Book a new event owned by the caller
pub async fn create_event(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Json(fields): Json<EventFields>,
) -> Result<impl IntoResponse> {
    let id = state
        .bookings
        .create_event(fields, &identity.username)
        .await?;

    Ok((StatusCode::CREATED, Json(CreatedEvent { id })))
}

pub async fn update_event(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<i64>,
    Json(fields): Json<EventFields>,
) -> Result<impl IntoResponse> {
    state.bookings.update_event(id, fields, &identity).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_event(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    state.bookings.delete_event(id, &identity).await?;
    Ok(StatusCode::NO_CONTENT)
}
