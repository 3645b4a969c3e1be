//! Seat API endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    models::{BulkCreateSeatsRequest, Seat, SeatQuery, SeatSpec, UpdateSeatRequest},
    utils::AppError,
    AppState, AuthUser,
};

/// Create routes for seat endpoints
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_seats).post(create_seat))
        .route("/bulk", post(bulk_create_seats))
        .route(
            "/{id}",
            get(get_seat).put(update_seat).delete(delete_seat),
        )
        .route("/{id}/toggle", post(toggle_seat))
}

async fn list_seats(
    State(state): State<AppState>,
    Query(query): Query<SeatQuery>,
    user: AuthUser,
) -> Result<Json<Vec<Seat>>, AppError> {
    let seats = state.seats.list_seats(user.library()?, &query).await?;
    Ok(Json(seats))
}

async fn create_seat(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<SeatSpec>,
) -> Result<(StatusCode, Json<Seat>), AppError> {
    user.require_librarian()?;
    payload.validate()?;

    let seat = state.seats.create_seat(user.library()?, &payload).await?;
    Ok((StatusCode::CREATED, Json(seat)))
}

/// Create a batch of seats; all or nothing
async fn bulk_create_seats(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<BulkCreateSeatsRequest>,
) -> Result<(StatusCode, Json<Vec<Seat>>), AppError> {
    user.require_librarian()?;
    payload.validate()?;

    let seats = state
        .seats
        .bulk_create_seats(user.library()?, &payload.seats)
        .await?;
    Ok((StatusCode::CREATED, Json(seats)))
}

async fn get_seat(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: AuthUser,
) -> Result<Json<Seat>, AppError> {
    let seat = state.seats.get_seat(user.library()?, id).await?;
    Ok(Json(seat))
}

async fn update_seat(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: AuthUser,
    Json(payload): Json<UpdateSeatRequest>,
) -> Result<Json<Seat>, AppError> {
    user.require_librarian()?;
    payload.validate()?;

    let seat = state.seats.update_seat(user.library()?, id, &payload).await?;
    Ok(Json(seat))
}

async fn toggle_seat(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: AuthUser,
) -> Result<Json<Seat>, AppError> {
    user.require_librarian()?;

    let seat = state.seats.toggle_active(user.library()?, id).await?;
    Ok(Json(seat))
}

async fn delete_seat(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: AuthUser,
) -> Result<StatusCode, AppError> {
    user.require_librarian()?;

    state.seats.delete_seat(user.library()?, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
