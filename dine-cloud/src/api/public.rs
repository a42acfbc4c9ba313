//! Diner-facing API (no session)
//!
//! The QR code on a table opens the ordering page, which reads the
//! restaurant, its published menu and the table, then places an order.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::Serialize;
use shared::error::{AppError, ErrorCode};
use shared::live::LiveMessage;
use shared::models::{Order, PublicOrderCreate, PublishedMenu};
use shared::order::OrderSource;

use super::ApiResult;
use crate::db::{menus, orders, restaurants, tables};
use crate::db::orders::NewOrder;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/public", routes())
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/restaurants/{id}", get(restaurant))
        .route("/restaurants/{id}/menu", get(menu))
        .route("/restaurants/{id}/tables/{table_id}", get(table))
        .route("/orders", post(create_order))
}

/// Restaurant header shown above the menu
#[derive(Debug, Serialize)]
pub struct PublicRestaurant {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub logo_url: Option<String>,
    pub currency: String,
}

/// Table as seen by a diner
#[derive(Debug, Serialize)]
pub struct PublicTable {
    pub id: i64,
    pub restaurant_id: i64,
    pub name: String,
}

/// GET /api/public/restaurants/{id}
pub async fn restaurant(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<PublicRestaurant> {
    let r = restaurants::get(&state.pool, id).await?;
    Ok(Json(PublicRestaurant {
        id: r.id,
        name: r.name,
        description: r.description,
        address: r.address,
        phone: r.phone,
        logo_url: r.logo_url,
        currency: r.currency,
    }))
}

/// GET /api/public/restaurants/{id}/menu: the published menu
pub async fn menu(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<PublishedMenu> {
    Ok(Json(menus::published(&state.pool, id).await?))
}

/// GET /api/public/restaurants/{id}/tables/{table_id}
///
/// Inactive tables are reported as such so the page can refuse to order.
pub async fn table(
    State(state): State<AppState>,
    Path((id, table_id)): Path<(i64, i64)>,
) -> ApiResult<PublicTable> {
    let table = tables::get(&state.pool, id, table_id).await?;
    if !table.is_active {
        return Err(AppError::new(ErrorCode::TableInactive).with_detail("table_id", table_id));
    }
    Ok(Json(PublicTable {
        id: table.id,
        restaurant_id: table.restaurant_id,
        name: table.name,
    }))
}

/// POST /api/public/orders: diner places an order from the table
pub async fn create_order(
    State(state): State<AppState>,
    Json(req): Json<PublicOrderCreate>,
) -> Result<(StatusCode, Json<Order>), AppError> {
    let order = orders::create(
        &state.pool,
        &NewOrder {
            restaurant_id: req.restaurant_id,
            table_id: req.table_id,
            items: &req.items,
            note: req.note.as_deref(),
            source: OrderSource::Customer,
        },
    )
    .await?;

    state
        .live_orders
        .publish(order.restaurant_id, LiveMessage::new_order(&order));

    Ok((StatusCode::CREATED, Json(order)))
}
