//! Booking API endpoints
//!
//! Members see and cancel their own bookings; librarians act on every
//! booking of their library and may book on behalf of a member.

use std::convert::Infallible;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive},
        Sse,
    },
    routing::{get, post, put},
    Json, Router,
};
use chrono::NaiveDate;
use futures::stream::Stream;
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use uuid::Uuid;
use validator::Validate;

use crate::{
    models::{
        Booking, BookingQuery, CreateDailyBookingRequest, CreateMonthlyBookingRequest,
        PaymentStatusRequest, TransitionRequest,
    },
    services::{BookingContext, BookingEvent},
    utils::AppError,
    AppState, AuthUser,
};

/// Create routes for booking endpoints
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_bookings))
        .route("/daily", post(create_daily_booking))
        .route("/monthly", post(create_monthly_booking))
        .route("/monthly/availability", get(monthly_availability))
        .route("/events", get(booking_events))
        .route("/{id}", get(get_booking))
        .route("/{id}/transition", post(transition_booking))
        .route("/{id}/confirm", post(confirm_booking))
        .route("/{id}/cancel", post(cancel_booking))
        .route("/{id}/reject", post(reject_booking))
        .route("/{id}/check-in", post(check_in))
        .route("/{id}/check-out", post(check_out))
        .route("/{id}/complete", post(complete_booking))
        .route("/{id}/payment", put(set_payment_status))
}

#[derive(Debug, Deserialize)]
struct MonthlyAvailabilityQuery {
    seat_id: Uuid,
    start_date: NaiveDate,
    end_date: NaiveDate,
}

#[derive(Debug, Serialize)]
struct MonthlyAvailability {
    seat_id: Uuid,
    available: bool,
}

/// Booking context for a request, honouring a librarian's `on_behalf_of`
fn booking_context(user: &AuthUser, on_behalf_of: Option<Uuid>) -> Result<BookingContext, AppError> {
    let library_id = user.library()?;
    let user_id = match on_behalf_of {
        Some(other) if other != user.id => {
            user.require_librarian()?;
            other
        }
        _ => user.id,
    };
    Ok(BookingContext {
        library_id,
        user_id,
    })
}

/// Load a booking the caller may act on
async fn visible_booking(state: &AppState, user: &AuthUser, id: Uuid) -> Result<Booking, AppError> {
    let booking = state.ledger.get(user.library()?, id).await?;
    if booking.user_id != user.id && !user.is_librarian() {
        // Other members' bookings are reported as missing
        return Err(AppError::not_found("Booking not found"));
    }
    Ok(booking)
}

/// Whether a subscriber should see `event`. Members only follow their own bookings.
fn event_visible(event: &BookingEvent, library_id: Uuid, member_id: Option<Uuid>) -> bool {
    event.library_id() == library_id && member_id.is_none_or(|id| id == event.user_id())
}

/// Server-Sent Events stream of booking events in the caller's library
async fn booking_events(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let library_id = user.library()?;
    let member_id = (!user.is_librarian()).then_some(user.id);
    let receiver = state.notifier.subscribe();

    // Lagged receivers drop the missed events and carry on
    let stream = BroadcastStream::new(receiver).filter_map(move |result| {
        let event = result.ok()?;
        if !event_visible(&event, library_id, member_id) {
            return None;
        }
        Event::default().json_data(&event).ok().map(Ok)
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

async fn list_bookings(
    State(state): State<AppState>,
    Query(mut query): Query<BookingQuery>,
    user: AuthUser,
) -> Result<Json<Vec<Booking>>, AppError> {
    query.library_id = Some(user.library()?);
    if !user.is_librarian() {
        query.user_id = Some(user.id);
    }

    let bookings = state.ledger.find(&query).await?;
    Ok(Json(bookings))
}

async fn create_daily_booking(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateDailyBookingRequest>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let ctx = booking_context(&user, payload.user_id)?;

    let booking = state
        .ledger
        .create_daily_booking(ctx, payload.seat_id, payload.time_slot_id, payload.booking_date)
        .await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

async fn create_monthly_booking(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateMonthlyBookingRequest>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    payload.validate()?;
    let ctx = booking_context(&user, payload.user_id)?;

    let booking = state
        .ledger
        .create_monthly_booking(
            ctx,
            payload.seat_id,
            payload.start_date,
            payload.end_date,
            payload.amount,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

async fn monthly_availability(
    State(state): State<AppState>,
    Query(query): Query<MonthlyAvailabilityQuery>,
    user: AuthUser,
) -> Result<Json<MonthlyAvailability>, AppError> {
    let available = state
        .ledger
        .is_monthly_range_free(user.library()?, query.seat_id, query.start_date, query.end_date)
        .await?;
    Ok(Json(MonthlyAvailability {
        seat_id: query.seat_id,
        available,
    }))
}

async fn get_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: AuthUser,
) -> Result<Json<Booking>, AppError> {
    let booking = visible_booking(&state, &user, id).await?;
    Ok(Json(booking))
}

/// Move a booking to any status the edge table allows
async fn transition_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: AuthUser,
    Json(payload): Json<TransitionRequest>,
) -> Result<Json<Booking>, AppError> {
    user.require_librarian()?;

    let booking = state
        .ledger
        .transition(user.library()?, id, payload.status)
        .await?;
    Ok(Json(booking))
}

async fn confirm_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: AuthUser,
) -> Result<Json<Booking>, AppError> {
    user.require_librarian()?;

    let booking = state.ledger.confirm(user.library()?, id).await?;
    Ok(Json(booking))
}

/// Requester-initiated; librarians may cancel any booking
async fn cancel_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: AuthUser,
) -> Result<Json<Booking>, AppError> {
    let booking = visible_booking(&state, &user, id).await?;

    let booking = state.ledger.cancel(booking.library_id, booking.id).await?;
    Ok(Json(booking))
}

async fn reject_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: AuthUser,
) -> Result<Json<Booking>, AppError> {
    user.require_librarian()?;

    let booking = state.ledger.reject(user.library()?, id).await?;
    Ok(Json(booking))
}

async fn check_in(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: AuthUser,
) -> Result<Json<Booking>, AppError> {
    user.require_librarian()?;

    let booking = state.ledger.check_in(user.library()?, id).await?;
    Ok(Json(booking))
}

async fn check_out(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: AuthUser,
) -> Result<Json<Booking>, AppError> {
    user.require_librarian()?;

    let booking = state.ledger.check_out(user.library()?, id).await?;
    Ok(Json(booking))
}

/// Close a booking that was used without a recorded check-in
async fn complete_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: AuthUser,
) -> Result<Json<Booking>, AppError> {
    user.require_librarian()?;

    let booking = state.ledger.complete(user.library()?, id).await?;
    Ok(Json(booking))
}

async fn set_payment_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: AuthUser,
    Json(payload): Json<PaymentStatusRequest>,
) -> Result<Json<Booking>, AppError> {
    user.require_librarian()?;

    let booking = state
        .ledger
        .set_payment_status(user.library()?, id, payload.payment_status)
        .await?;
    Ok(Json(booking))
}
