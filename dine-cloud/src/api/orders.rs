//! Order API for staff
//!
//! Every successful write is pushed to the restaurant's dashboards.

use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
};
use shared::error::{ApiResponse, AppError};
use shared::live::LiveMessage;
use shared::models::{
    ActiveOrders, Order, OrderItemsReplace, OrderListQuery, OrderStatusUpdate, PrintResult,
    StaffOrderCreate,
};
use shared::order::OrderSource;

use super::ApiResult;
use crate::auth::SessionIdentity;
use crate::db::orders::NewOrder;
use crate::db::{orders, restaurants};
use crate::printing::{ReceiptRenderer, print_receipt};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/active", get(active))
        .route("/{id}", get(get_by_id).delete(delete))
        .route("/{id}/status", put(change_status))
        .route("/{id}/pay", post(mark_paid))
        .route("/{id}/items", put(replace_items))
        .route("/{id}/print", post(print))
}

/// Push an updated order to the restaurant's dashboards
fn push_update(state: &AppState, order: &Order) {
    state
        .live_orders
        .publish(order.restaurant_id, LiveMessage::order_updated(order));
}

/// GET /api/orders?status=&limit=: newest first
pub async fn list(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
    Query(query): Query<OrderListQuery>,
) -> ApiResult<Vec<Order>> {
    let orders = orders::list(
        &state.pool,
        identity.restaurant_id,
        query.status,
        query.limit,
    )
    .await?;
    Ok(Json(orders))
}

/// GET /api/orders/active: open orders grouped by table
pub async fn active(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
) -> ApiResult<ActiveOrders> {
    let orders = orders::active(&state.pool, identity.restaurant_id).await?;
    Ok(Json(ActiveOrders::group(orders)))
}

/// POST /api/orders: staff places an order on behalf of a table
pub async fn create(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
    Json(req): Json<StaffOrderCreate>,
) -> Result<(StatusCode, Json<Order>), AppError> {
    let order = orders::create(
        &state.pool,
        &NewOrder {
            restaurant_id: identity.restaurant_id,
            table_id: req.table_id,
            items: &req.items,
            note: req.note.as_deref(),
            source: OrderSource::Staff,
        },
    )
    .await?;

    state
        .live_orders
        .publish(order.restaurant_id, LiveMessage::new_order(&order));

    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /api/orders/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
    Path(id): Path<i64>,
) -> ApiResult<Order> {
    Ok(Json(orders::get(&state.pool, identity.restaurant_id, id).await?))
}

/// DELETE /api/orders/{id}
pub async fn delete(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
    Path(id): Path<i64>,
) -> ApiResult<ApiResponse<()>> {
    orders::delete(&state.pool, identity.restaurant_id, id).await?;
    state
        .live_orders
        .publish(identity.restaurant_id, LiveMessage::OrderDeleted { order_id: id });
    Ok(Json(ApiResponse::ok()))
}

/// PUT /api/orders/{id}/status
pub async fn change_status(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
    Path(id): Path<i64>,
    Json(req): Json<OrderStatusUpdate>,
) -> ApiResult<Order> {
    let order = orders::change_status(
        &state.pool,
        identity.restaurant_id,
        id,
        req.status,
        req.reason.as_deref(),
    )
    .await?;
    push_update(&state, &order);
    Ok(Json(order))
}

/// POST /api/orders/{id}/pay
pub async fn mark_paid(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
    Path(id): Path<i64>,
) -> ApiResult<Order> {
    let order = orders::mark_paid(&state.pool, identity.restaurant_id, id).await?;
    push_update(&state, &order);
    Ok(Json(order))
}

/// PUT /api/orders/{id}/items: replace all lines of an editable order
pub async fn replace_items(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
    Path(id): Path<i64>,
    Json(req): Json<OrderItemsReplace>,
) -> ApiResult<Order> {
    let order = orders::replace_items(&state.pool, identity.restaurant_id, id, &req.items).await?;
    push_update(&state, &order);
    Ok(Json(order))
}

/// POST /api/orders/{id}/print: send the receipt to the print bridge
///
/// A bridge failure comes back as a warning in a 200 response.
pub async fn print(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
    Path(id): Path<i64>,
) -> ApiResult<PrintResult> {
    let order = orders::get(&state.pool, identity.restaurant_id, id).await?;
    let restaurant = restaurants::get(&state.pool, identity.restaurant_id).await?;

    let data = ReceiptRenderer::new(state.receipt_width).render(&restaurant, &order);
    Ok(Json(print_receipt(&state.printer, order.id, &data).await))
}
