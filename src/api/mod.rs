//! HTTP routes
//!
//! Everything lives under `/api/v1`. Health probes are public; every other
//! route needs a bearer token.

use axum::{middleware::from_fn_with_state, routing::get, Router};

use crate::{middleware::auth_middleware, AppState};

mod bookings;
mod health;
mod libraries;
mod seats;
mod statistics;
mod time_slots;

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
}

pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .nest("/library", libraries::routes())
        .nest("/libraries", libraries::admin_routes())
        .nest("/seats", seats::routes())
        .nest("/time-slots", time_slots::routes())
        .nest("/bookings", bookings::routes())
        .nest("/statistics", statistics::routes())
}

/// The versioned API with authentication applied to protected routes
pub fn router(state: AppState) -> Router {
    let protected =
        protected_routes().layer(from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest("/api/v1", public_routes().merge(protected))
        .with_state(state)
}
