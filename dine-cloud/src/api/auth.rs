//! Account and session endpoints
//!
//! - POST /api/auth/signup           (3/min per IP)
//! - POST /api/auth/login            (5/min per IP)
//! - POST /api/auth/logout
//! - GET  /api/auth/session          (session required)
//! - POST /api/auth/change-password  (session required)

use axum::{
    Extension, Json, Router,
    extract::State,
    http::{StatusCode, header},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use shared::error::{ApiResponse, AppError, ErrorCode};
use shared::models::{ChangePasswordRequest, LoginRequest, SessionInfo, SessionResponse, SignupRequest};

use super::ApiResult;
use crate::auth::SessionIdentity;
use crate::auth::rate_limit::{login_rate_limit, signup_rate_limit};
use crate::auth::session::{clear_session_cookie, create_token, session_cookie};
use crate::db::users;
use crate::state::AppState;
use crate::util::{
    MAX_NAME_LEN, hash_password, normalize_email, validate_email, validate_password,
    validate_required_text, verify_password,
};

/// Public account routes (rate limited where credentials are involved)
pub fn router(state: &AppState) -> Router<AppState> {
    let signup = Router::new()
        .route("/api/auth/signup", post(signup))
        .layer(middleware::from_fn_with_state(state.clone(), signup_rate_limit));
    let login = Router::new()
        .route("/api/auth/login", post(login))
        .layer(middleware::from_fn_with_state(state.clone(), login_rate_limit));

    Router::new()
        .merge(signup)
        .merge(login)
        .route("/api/auth/logout", post(logout))
}

/// Routes that need an authenticated session
pub fn session_router() -> Router<AppState> {
    Router::new()
        .route("/api/auth/session", get(session))
        .route("/api/auth/change-password", post(change_password))
}

fn hash_or_internal(password: &str) -> Result<String, AppError> {
    hash_password(password).map_err(|e| {
        tracing::error!("Password hashing failed: {e}");
        AppError::internal("Failed to hash password")
    })
}

/// Sign a token and answer with it in the body and the session cookie
fn session_response(
    state: &AppState,
    identity: SessionIdentity,
    status: StatusCode,
) -> Result<Response, AppError> {
    let issued = create_token(&identity, &state.jwt_secret, state.session_ttl_hours).map_err(|e| {
        tracing::error!("JWT creation failed: {e}");
        AppError::internal("Failed to create session")
    })?;
    let cookie = session_cookie(&issued.token, issued.max_age, state.secure_cookies)?;

    let body = SessionResponse {
        token: issued.token,
        expires_at: issued.expires_at,
        session: identity.into(),
    };
    Ok((status, [(header::SET_COOKIE, cookie)], Json(body)).into_response())
}

/// POST /api/auth/signup: create a restaurant and its owner account
pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<Response, AppError> {
    let email = normalize_email(&req.email);
    validate_email(&email)?;
    validate_password(&req.password)?;
    validate_required_text(&req.name, "name", MAX_NAME_LEN)?;
    validate_required_text(&req.restaurant_name, "restaurant_name", MAX_NAME_LEN)?;

    if users::find_by_email(&state.pool, &email).await?.is_some() {
        return Err(AppError::new(ErrorCode::EmailAlreadyRegistered).with_detail("field", "email"));
    }

    let hashed = hash_or_internal(&req.password)?;
    let (user, restaurant) = users::create_with_restaurant(
        &state.pool,
        &email,
        req.name.trim(),
        &hashed,
        req.restaurant_name.trim(),
    )
    .await?;

    tracing::info!(restaurant_id = restaurant.id, user_id = user.id, "Restaurant signed up");

    let identity = SessionIdentity {
        user_id: user.id,
        restaurant_id: restaurant.id,
        email: user.email,
    };
    session_response(&state, identity, StatusCode::CREATED)
}

/// POST /api/auth/login: email + password
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Response, AppError> {
    let email = normalize_email(&req.email);

    let user = users::find_by_email(&state.pool, &email)
        .await?
        .ok_or_else(AppError::invalid_credentials)?;

    if !verify_password(&req.password, &user.hashed_password) {
        tracing::info!(user_id = user.id, "Login failed: wrong password");
        return Err(AppError::invalid_credentials());
    }

    tracing::info!(restaurant_id = user.restaurant_id, user_id = user.id, "User logged in");

    let identity = SessionIdentity {
        user_id: user.id,
        restaurant_id: user.restaurant_id,
        email: user.email,
    };
    session_response(&state, identity, StatusCode::OK)
}

/// POST /api/auth/logout: drop the session cookie
pub async fn logout(State(state): State<AppState>) -> Response {
    (
        [(header::SET_COOKIE, clear_session_cookie(state.secure_cookies))],
        ApiResponse::ok(),
    )
        .into_response()
}

/// GET /api/auth/session
pub async fn session(Extension(identity): Extension<SessionIdentity>) -> ApiResult<SessionInfo> {
    Ok(Json(identity.into()))
}

/// POST /api/auth/change-password
pub async fn change_password(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
    Json(req): Json<ChangePasswordRequest>,
) -> ApiResult<ApiResponse<()>> {
    validate_password(&req.new_password)?;

    let user = users::find_by_id(&state.pool, identity.user_id)
        .await?
        .ok_or_else(AppError::not_authenticated)?;

    if !verify_password(&req.current_password, &user.hashed_password) {
        return Err(AppError::invalid_credentials().with_detail("field", "current_password"));
    }

    let hashed = hash_or_internal(&req.new_password)?;
    users::update_password(&state.pool, user.id, &hashed).await?;

    tracing::info!(user_id = user.id, "Password changed");
    Ok(Json(ApiResponse::ok()))
}
