//! Session tokens for the owner dashboard and staff API
//!
//! A session is an HS256 JWT. Browsers carry it in an HttpOnly cookie,
//! API clients may send it as `Authorization: Bearer <token>`.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, header},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};
use shared::models::user::SessionInfo;

use crate::state::AppState;

/// Cookie name over plain HTTP (development)
pub const SESSION_COOKIE: &str = "session-token";
/// Cookie name when cookies are `Secure`
pub const SECURE_SESSION_COOKIE: &str = "__Secure-session-token";

/// JWT claims for a dashboard session
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User ID
    pub sub: String,
    pub restaurant_id: i64,
    pub email: String,
    /// Expiration (Unix timestamp seconds)
    pub exp: usize,
    /// Issued at (Unix timestamp seconds)
    pub iat: usize,
}

/// Authenticated session extracted from the token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    pub user_id: i64,
    pub restaurant_id: i64,
    pub email: String,
}

impl From<SessionIdentity> for SessionInfo {
    fn from(identity: SessionIdentity) -> Self {
        Self {
            user_id: identity.user_id,
            restaurant_id: identity.restaurant_id,
            email: identity.email,
        }
    }
}

/// A freshly signed session token
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    /// Expiry in Unix milliseconds
    pub expires_at: i64,
    /// Cookie lifetime in seconds
    pub max_age: i64,
}

/// Sign a session token for a user
pub fn create_token(
    identity: &SessionIdentity,
    secret: &str,
    ttl_hours: i64,
) -> Result<IssuedToken, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now();
    let expires = now + chrono::Duration::hours(ttl_hours);
    let claims = SessionClaims {
        sub: identity.user_id.to_string(),
        restaurant_id: identity.restaurant_id,
        email: identity.email.clone(),
        exp: expires.timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    let token = jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(IssuedToken {
        token,
        expires_at: expires.timestamp_millis(),
        max_age: ttl_hours * 3600,
    })
}

/// Verify a session token and return its identity
pub fn verify_token(token: &str, secret: &str) -> Result<SessionIdentity, AppError> {
    let data = jsonwebtoken::decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AppError::new(ErrorCode::TokenExpired),
        _ => {
            tracing::debug!("JWT validation failed: {e}");
            AppError::new(ErrorCode::TokenInvalid)
        }
    })?;

    let user_id = data
        .claims
        .sub
        .parse()
        .map_err(|_| AppError::new(ErrorCode::TokenInvalid))?;

    Ok(SessionIdentity {
        user_id,
        restaurant_id: data.claims.restaurant_id,
        email: data.claims.email,
    })
}

/// Session token from the cookie header, either cookie name
pub fn token_from_cookies(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| {
            (*name == SESSION_COOKIE || *name == SECURE_SESSION_COOKIE) && !value.is_empty()
        })
        .map(|(_, value)| value.to_string())
}

/// Session token from `Authorization: Bearer`, falling back to the cookie
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .or_else(|| token_from_cookies(headers))
}

/// `Set-Cookie` value carrying a session token
pub fn session_cookie(token: &str, max_age: i64, secure: bool) -> Result<HeaderValue, AppError> {
    let value = if secure {
        format!(
            "{SECURE_SESSION_COOKIE}={token}; Path=/; Max-Age={max_age}; HttpOnly; SameSite=Lax; Secure"
        )
    } else {
        format!("{SESSION_COOKIE}={token}; Path=/; Max-Age={max_age}; HttpOnly; SameSite=Lax")
    };
    HeaderValue::from_str(&value).map_err(|_| AppError::internal("Invalid session cookie value"))
}

/// `Set-Cookie` value that removes the session cookie
pub fn clear_session_cookie(secure: bool) -> HeaderValue {
    if secure {
        HeaderValue::from_static(
            "__Secure-session-token=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax; Secure",
        )
    } else {
        HeaderValue::from_static("session-token=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax")
    }
}

/// Middleware that verifies the session and inserts [`SessionIdentity`]
pub async fn session_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = token_from_headers(request.headers()).ok_or_else(AppError::not_authenticated)?;
    let identity = verify_token(&token, &state.jwt_secret)?;

    request.extensions_mut().insert(identity);

    Ok(next.run(request).await)
}
