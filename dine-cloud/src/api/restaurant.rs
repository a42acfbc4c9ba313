//! Restaurant profile of the signed-in account

use axum::{Extension, Json, Router, extract::State, routing::get};
use shared::error::{AppError, ErrorCode};
use shared::models::{Restaurant, RestaurantUpdate};
use shared::util::now_millis;

use super::ApiResult;
use crate::auth::SessionIdentity;
use crate::db::restaurants;
use crate::state::AppState;
use crate::util::{
    MAX_ADDRESS_LEN, MAX_NAME_LEN, MAX_NOTE_LEN, MAX_SHORT_TEXT_LEN, MAX_URL_LEN,
    validate_optional_text, validate_required_text,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/api/restaurant", get(get_restaurant).put(update_restaurant))
}

/// ISO 4217 shape: three upper-case ASCII letters
fn validate_currency(currency: &str) -> Result<(), AppError> {
    if currency.len() == 3 && currency.chars().all(|c| c.is_ascii_uppercase()) {
        return Ok(());
    }
    Err(
        AppError::with_message(ErrorCode::InvalidFormat, "Currency must be an ISO 4217 code")
            .with_detail("field", "currency"),
    )
}

fn validate_update(data: &RestaurantUpdate) -> Result<(), AppError> {
    if let Some(name) = &data.name {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
    }
    validate_optional_text(&data.description, "description", MAX_NOTE_LEN)?;
    validate_optional_text(&data.address, "address", MAX_ADDRESS_LEN)?;
    validate_optional_text(&data.phone, "phone", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(&data.logo_url, "logo_url", MAX_URL_LEN)?;
    if let Some(currency) = &data.currency {
        validate_currency(currency)?;
    }
    Ok(())
}

/// GET /api/restaurant
pub async fn get_restaurant(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
) -> ApiResult<Restaurant> {
    Ok(Json(restaurants::get(&state.pool, identity.restaurant_id).await?))
}

/// PUT /api/restaurant
pub async fn update_restaurant(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
    Json(data): Json<RestaurantUpdate>,
) -> ApiResult<Restaurant> {
    validate_update(&data)?;
    let restaurant =
        restaurants::update(&state.pool, identity.restaurant_id, &data, now_millis()).await?;
    tracing::info!(restaurant_id = restaurant.id, "Restaurant profile updated");
    Ok(Json(restaurant))
}
