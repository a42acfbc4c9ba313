//! Menu item API

use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::error::{ApiResponse, AppError, ErrorCode};
use shared::models::{MenuItem, MenuItemCreate, MenuItemUpdate};

use super::ApiResult;
use crate::auth::SessionIdentity;
use crate::db::items;
use crate::state::AppState;
use crate::util::{
    MAX_NAME_LEN, MAX_NOTE_LEN, MAX_URL_LEN, validate_optional_text, validate_required_text,
};

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/menu/items", routes())
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(get_by_id).put(update).delete(delete))
}

#[derive(Debug, Deserialize)]
pub struct ItemListQuery {
    pub category_id: Option<i64>,
}

/// Largest price a `NUMERIC(10,2)` column holds
fn max_price() -> Decimal {
    Decimal::new(9_999_999_999, 2)
}

fn validate_price(price: Decimal) -> Result<(), AppError> {
    let negative = price.is_sign_negative() && !price.is_zero();
    if negative || price > max_price() || price.normalize().scale() > 2 {
        return Err(AppError::new(ErrorCode::MenuItemInvalidPrice).with_detail("field", "price"));
    }
    Ok(())
}

/// GET /api/menu/items?category_id=
pub async fn list(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
    Query(query): Query<ItemListQuery>,
) -> ApiResult<Vec<MenuItem>> {
    Ok(Json(
        items::list(&state.pool, identity.restaurant_id, query.category_id).await?,
    ))
}

/// GET /api/menu/items/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
    Path(id): Path<i64>,
) -> ApiResult<MenuItem> {
    Ok(Json(items::get(&state.pool, identity.restaurant_id, id).await?))
}

/// POST /api/menu/items
pub async fn create(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
    Json(data): Json<MenuItemCreate>,
) -> Result<(StatusCode, Json<MenuItem>), AppError> {
    validate_required_text(&data.name, "name", MAX_NAME_LEN)?;
    validate_optional_text(&data.description, "description", MAX_NOTE_LEN)?;
    validate_optional_text(&data.image_url, "image_url", MAX_URL_LEN)?;
    validate_price(data.price)?;

    let item = items::create(&state.pool, identity.restaurant_id, &data).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// PUT /api/menu/items/{id}
pub async fn update(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
    Path(id): Path<i64>,
    Json(data): Json<MenuItemUpdate>,
) -> ApiResult<MenuItem> {
    if let Some(name) = &data.name {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
    }
    validate_optional_text(&data.description, "description", MAX_NOTE_LEN)?;
    validate_optional_text(&data.image_url, "image_url", MAX_URL_LEN)?;
    if let Some(price) = data.price {
        validate_price(price)?;
    }

    Ok(Json(
        items::update(&state.pool, identity.restaurant_id, id, &data).await?,
    ))
}

/// DELETE /api/menu/items/{id}
///
/// Menus still listing the item keep the stale entry; it is skipped on merge.
pub async fn delete(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
    Path(id): Path<i64>,
) -> ApiResult<ApiResponse<()>> {
    items::delete(&state.pool, identity.restaurant_id, id).await?;
    Ok(Json(ApiResponse::ok()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_prices_rejected() {
        assert!(validate_price(Decimal::ZERO).is_ok());
        assert!(validate_price(Decimal::new(1250, 2)).is_ok());
        assert_eq!(
            validate_price(Decimal::new(-1, 2)).unwrap_err().code,
            ErrorCode::MenuItemInvalidPrice
        );
    }

    #[test]
    fn price_must_fit_column() {
        assert!(validate_price(max_price()).is_ok());
        let err = validate_price(Decimal::new(10_000_000_000, 2)).unwrap_err();
        assert_eq!(err.code, ErrorCode::MenuItemInvalidPrice);
        assert_eq!(err.details.unwrap()["field"], "price");
    }

    #[test]
    fn sub_cent_prices_rejected() {
        assert!(validate_price(Decimal::new(12_500, 3)).is_ok());
        assert_eq!(
            validate_price(Decimal::new(12_345, 3)).unwrap_err().code,
            ErrorCode::MenuItemInvalidPrice
        );
    }
}
