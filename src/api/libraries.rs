//! Library profile endpoints

use axum::{extract::State, http::StatusCode, routing::{get, post}, Json, Router};
use validator::Validate;

use crate::{
    models::{CreateLibraryRequest, Library, UpdateLibraryRequest},
    utils::AppError,
    AppState, AuthUser,
};

/// Routes for the caller's own library
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(get_library).put(update_library))
        .route("/deactivate", post(deactivate_library))
}

/// Routes for registering libraries (admin only)
pub fn admin_routes() -> Router<AppState> {
    Router::new().route("/", post(register_library))
}

async fn get_library(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Library>, AppError> {
    let library = state.libraries.get(user.library()?).await?;
    Ok(Json(library))
}

async fn update_library(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateLibraryRequest>,
) -> Result<Json<Library>, AppError> {
    user.require_librarian()?;
    payload.validate()?;

    let library = state.libraries.update(user.library()?, &payload).await?;
    Ok(Json(library))
}

async fn deactivate_library(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Library>, AppError> {
    user.require_librarian()?;

    let library = state.libraries.deactivate(user.library()?).await?;
    Ok(Json(library))
}

async fn register_library(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateLibraryRequest>,
) -> Result<(StatusCode, Json<Library>), AppError> {
    user.require_admin()?;
    payload.validate()?;

    let library = state.libraries.register(&payload).await?;
    Ok((StatusCode::CREATED, Json(library)))
}
