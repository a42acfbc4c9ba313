//! Menu category API

use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
};
use shared::error::{ApiResponse, AppError};
use shared::models::{MenuCategory, MenuCategoryCreate, MenuCategoryUpdate, SortOrderUpdate};

use super::ApiResult;
use crate::auth::SessionIdentity;
use crate::db::categories;
use crate::state::AppState;
use crate::util::{MAX_NAME_LEN, validate_required_text};

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/menu/categories", routes())
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/sort-order", put(batch_update_sort_order))
        .route("/{id}", put(update).delete(delete))
}

/// GET /api/menu/categories
pub async fn list(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
) -> ApiResult<Vec<MenuCategory>> {
    Ok(Json(
        categories::list(&state.pool, identity.restaurant_id).await?,
    ))
}

/// POST /api/menu/categories
pub async fn create(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
    Json(data): Json<MenuCategoryCreate>,
) -> Result<(StatusCode, Json<MenuCategory>), AppError> {
    validate_required_text(&data.name, "name", MAX_NAME_LEN)?;
    let category = categories::create(&state.pool, identity.restaurant_id, &data).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// PUT /api/menu/categories/{id}
pub async fn update(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
    Path(id): Path<i64>,
    Json(data): Json<MenuCategoryUpdate>,
) -> ApiResult<MenuCategory> {
    if let Some(name) = &data.name {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
    }
    Ok(Json(
        categories::update(&state.pool, identity.restaurant_id, id, &data).await?,
    ))
}

/// DELETE /api/menu/categories/{id}: refused while items reference it
pub async fn delete(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
    Path(id): Path<i64>,
) -> ApiResult<ApiResponse<()>> {
    categories::delete(&state.pool, identity.restaurant_id, id).await?;
    tracing::info!(restaurant_id = identity.restaurant_id, category_id = id, "Category deleted");
    Ok(Json(ApiResponse::ok()))
}

/// PUT /api/menu/categories/sort-order
pub async fn batch_update_sort_order(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
    Json(updates): Json<Vec<SortOrderUpdate>>,
) -> ApiResult<ApiResponse<u64>> {
    let updated =
        categories::batch_update_sort_order(&state.pool, identity.restaurant_id, &updates).await?;
    Ok(Json(ApiResponse::success(updated)))
}
