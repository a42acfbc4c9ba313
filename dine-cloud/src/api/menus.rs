//! Menu layout API
//!
//! A menu is a named layout over the catalog. At most one menu per
//! restaurant is published; publishing another one takes its place.

use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use shared::error::{ApiResponse, AppError};
use shared::models::{Menu, MenuCreate, MenuDetail, MenuSummary, MenuUpdate};

use super::ApiResult;
use crate::auth::SessionIdentity;
use crate::db::menus;
use crate::state::AppState;
use crate::util::{MAX_NAME_LEN, validate_required_text};

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/menus", routes())
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(detail).put(save).delete(delete))
        .route("/{id}/publish", post(publish))
        .route("/{id}/unpublish", post(unpublish))
}

/// GET /api/menus
pub async fn list(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
) -> ApiResult<Vec<MenuSummary>> {
    Ok(Json(menus::list(&state.pool, identity.restaurant_id).await?))
}

/// GET /api/menus/{id}: stored layout plus the merged editor view
pub async fn detail(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
    Path(id): Path<i64>,
) -> ApiResult<MenuDetail> {
    Ok(Json(menus::detail(&state.pool, identity.restaurant_id, id).await?))
}

/// POST /api/menus
pub async fn create(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
    Json(data): Json<MenuCreate>,
) -> Result<(StatusCode, Json<Menu>), AppError> {
    validate_required_text(&data.name, "name", MAX_NAME_LEN)?;
    let menu = menus::create(&state.pool, identity.restaurant_id, &data).await?;
    tracing::info!(restaurant_id = identity.restaurant_id, menu_id = menu.id, "Menu created");
    Ok((StatusCode::CREATED, Json(menu)))
}

/// PUT /api/menus/{id}: save name and/or layout
pub async fn save(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
    Path(id): Path<i64>,
    Json(data): Json<MenuUpdate>,
) -> ApiResult<Menu> {
    if let Some(name) = &data.name {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
    }
    Ok(Json(
        menus::save(&state.pool, identity.restaurant_id, id, &data).await?,
    ))
}

/// DELETE /api/menus/{id}
pub async fn delete(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
    Path(id): Path<i64>,
) -> ApiResult<ApiResponse<()>> {
    menus::delete(&state.pool, identity.restaurant_id, id).await?;
    tracing::info!(restaurant_id = identity.restaurant_id, menu_id = id, "Menu deleted");
    Ok(Json(ApiResponse::ok()))
}

/// POST /api/menus/{id}/publish
pub async fn publish(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
    Path(id): Path<i64>,
) -> ApiResult<Menu> {
    Ok(Json(
        menus::publish(&state.pool, identity.restaurant_id, id).await?,
    ))
}

/// POST /api/menus/{id}/unpublish
pub async fn unpublish(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
    Path(id): Path<i64>,
) -> ApiResult<Menu> {
    Ok(Json(
        menus::unpublish(&state.pool, identity.restaurant_id, id).await?,
    ))
}
