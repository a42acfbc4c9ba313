//! Dining table API

use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use shared::error::{ApiResponse, AppError, ErrorCode};
use shared::models::{DiningTable, DiningTableCreate, DiningTableUpdate};

use super::ApiResult;
use crate::auth::SessionIdentity;
use crate::db::tables;
use crate::state::AppState;
use crate::util::{MAX_NAME_LEN, validate_required_text};

const MAX_CAPACITY: i32 = 100;

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/tables", routes())
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(get_by_id).put(update).delete(delete))
}

fn validate_capacity(capacity: Option<i32>) -> Result<(), AppError> {
    match capacity {
        Some(c) if !(1..=MAX_CAPACITY).contains(&c) => Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            format!("Capacity must be between 1 and {MAX_CAPACITY}"),
        )
        .with_detail("field", "capacity")),
        _ => Ok(()),
    }
}

/// GET /api/tables
pub async fn list(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
) -> ApiResult<Vec<DiningTable>> {
    let tables = tables::list(&state.pool, identity.restaurant_id).await?;
    Ok(Json(
        tables
            .into_iter()
            .map(|t| t.with_qr_url(&state.public_base_url))
            .collect(),
    ))
}

/// GET /api/tables/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
    Path(id): Path<i64>,
) -> ApiResult<DiningTable> {
    let table = tables::get(&state.pool, identity.restaurant_id, id).await?;
    Ok(Json(table.with_qr_url(&state.public_base_url)))
}

/// POST /api/tables
pub async fn create(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
    Json(data): Json<DiningTableCreate>,
) -> Result<(StatusCode, Json<DiningTable>), AppError> {
    validate_required_text(&data.name, "name", MAX_NAME_LEN)?;
    validate_capacity(data.capacity)?;

    let table = tables::create(&state.pool, identity.restaurant_id, &data).await?;
    tracing::info!(restaurant_id = identity.restaurant_id, table_id = table.id, "Table created");
    Ok((
        StatusCode::CREATED,
        Json(table.with_qr_url(&state.public_base_url)),
    ))
}

/// PUT /api/tables/{id}
pub async fn update(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
    Path(id): Path<i64>,
    Json(data): Json<DiningTableUpdate>,
) -> ApiResult<DiningTable> {
    if let Some(name) = &data.name {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
    }
    validate_capacity(data.capacity)?;

    let table = tables::update(&state.pool, identity.restaurant_id, id, &data).await?;
    Ok(Json(table.with_qr_url(&state.public_base_url)))
}

/// DELETE /api/tables/{id}
pub async fn delete(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
    Path(id): Path<i64>,
) -> ApiResult<ApiResponse<()>> {
    tables::delete(&state.pool, identity.restaurant_id, id).await?;
    tracing::info!(restaurant_id = identity.restaurant_id, table_id = id, "Table deleted");
    Ok(Json(ApiResponse::ok()))
}
