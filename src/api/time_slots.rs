//! Time slot API endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    models::{CreateTimeSlotRequest, Seat, SeatIdsRequest, TimeSlot},
    utils::AppError,
    AppState, AuthUser,
};

/// Create routes for time slot endpoints
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_time_slots).post(create_time_slot))
        .route("/{id}", get(get_time_slot).delete(delete_time_slot))
        .route("/{id}/toggle", post(toggle_time_slot))
        .route("/{id}/seats", post(assign_seats).delete(unassign_seats))
        .route("/{id}/availability", get(available_seats))
}

#[derive(Debug, Deserialize)]
struct AvailabilityQuery {
    date: NaiveDate,
}

async fn list_time_slots(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<TimeSlot>>, AppError> {
    let slots = state.time_slots.list_time_slots(user.library()?).await?;
    Ok(Json(slots))
}

async fn create_time_slot(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateTimeSlotRequest>,
) -> Result<(StatusCode, Json<TimeSlot>), AppError> {
    user.require_librarian()?;

    let slot = state
        .time_slots
        .create_time_slot(
            user.library()?,
            &payload.start_time,
            &payload.end_time,
            payload.price,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(slot)))
}

async fn get_time_slot(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: AuthUser,
) -> Result<Json<TimeSlot>, AppError> {
    let slot = state.time_slots.get_time_slot(user.library()?, id).await?;
    Ok(Json(slot))
}

async fn toggle_time_slot(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: AuthUser,
) -> Result<Json<TimeSlot>, AppError> {
    user.require_librarian()?;

    let slot = state.time_slots.toggle_active(user.library()?, id).await?;
    Ok(Json(slot))
}

async fn delete_time_slot(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: AuthUser,
) -> Result<StatusCode, AppError> {
    user.require_librarian()?;

    state.time_slots.delete_time_slot(user.library()?, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn assign_seats(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: AuthUser,
    Json(payload): Json<SeatIdsRequest>,
) -> Result<Json<TimeSlot>, AppError> {
    user.require_librarian()?;

    let slot = state
        .time_slots
        .assign_seats(user.library()?, id, &payload.seat_ids)
        .await?;
    Ok(Json(slot))
}

async fn unassign_seats(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: AuthUser,
    Json(payload): Json<SeatIdsRequest>,
) -> Result<Json<TimeSlot>, AppError> {
    user.require_librarian()?;

    let slot = state
        .time_slots
        .unassign_seats(user.library()?, id, &payload.seat_ids)
        .await?;
    Ok(Json(slot))
}

/// Seats still free in the slot on `?date=YYYY-MM-DD`
async fn available_seats(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<AvailabilityQuery>,
    user: AuthUser,
) -> Result<Json<Vec<Seat>>, AppError> {
    let seats = state
        .time_slots
        .available_seats(user.library()?, id, query.date)
        .await?;
    Ok(Json(seats))
}
