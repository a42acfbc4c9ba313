//! HTTP API routes for dine-cloud

pub mod auth;
pub mod categories;
pub mod health;
pub mod items;
pub mod menus;
pub mod orders;
pub mod public;
pub mod restaurant;
pub mod socket;
pub mod tables;
pub mod upload;

use axum::{Json, Router, middleware};
use shared::error::AppError;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::auth::dashboard::dashboard_gate;
use crate::auth::session::session_auth_middleware;
use crate::state::AppState;

pub type ApiResult<T> = Result<Json<T>, AppError>;

/// Routes behind the session (cookie or bearer token)
fn staff_router(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(auth::session_router())
        .merge(restaurant::router())
        .merge(tables::router())
        .merge(categories::router())
        .merge(items::router())
        .merge(menus::router())
        .merge(orders::router())
        .merge(upload::router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session_auth_middleware,
        ))
}

/// Static dashboard, redirected to the login page without a session cookie
fn dashboard_router(state: &AppState) -> Router<AppState> {
    Router::new()
        .nest_service("/dashboard", ServeDir::new(&state.dashboard_dir))
        .layer(middleware::from_fn_with_state(state.clone(), dashboard_gate))
}

/// Build the full application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Public: health, accounts, diner-facing API
        .merge(health::router())
        .merge(auth::router(&state))
        .merge(public::router())
        // WebSocket authenticates itself (query token or cookie)
        .merge(socket::router())
        .merge(staff_router(&state))
        .merge(dashboard_router(&state))
        .nest_service("/uploads", ServeDir::new(&state.upload_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
