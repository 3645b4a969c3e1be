//! Booking statistics endpoint

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};

use crate::{
    models::{BookingStatistics, StatisticsFilter},
    utils::AppError,
    AppState, AuthUser,
};

pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(get_statistics))
}

async fn get_statistics(
    State(state): State<AppState>,
    Query(filter): Query<StatisticsFilter>,
    user: AuthUser,
) -> Result<Json<BookingStatistics>, AppError> {
    user.require_librarian()?;

    let stats = state.ledger.statistics(user.library()?, &filter).await?;
    Ok(Json(stats))
}
