//! Gate in front of the static dashboard
//!
//! Requests without a valid session cookie are redirected to the login
//! page instead of receiving a JSON 401.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::auth::session::{token_from_cookies, verify_token};
use crate::state::AppState;

/// Where unauthenticated dashboard visitors are sent
pub const LOGIN_PATH: &str = "/auth/login";

pub async fn dashboard_gate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let identity = token_from_cookies(request.headers())
        .and_then(|token| verify_token(&token, &state.jwt_secret).ok());

    match identity {
        Some(identity) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        None => Redirect::to(LOGIN_PATH).into_response(),
    }
}
