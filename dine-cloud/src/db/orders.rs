//! Order queries
//!
//! Every write locks the order row (`FOR UPDATE`), runs the lifecycle check
//! from `shared::order` and writes in the same transaction. Line names and
//! prices are copied from the catalog when the order is placed or edited.

use rust_decimal::Decimal;
use shared::error::{AppError, ErrorCode};
use shared::models::{Order, OrderItem, OrderItemInput};
use shared::order::{OrderSource, OrderState, OrderStatus};
use shared::util::{now_millis, snowflake_id};
use sqlx::{PgConnection, PgExecutor, PgPool};
use std::collections::HashMap;

use crate::db::restaurants;
use crate::error::{ServiceError, ServiceResult};
use crate::util::{MAX_NOTE_LEN, validate_optional_text};

/// Largest quantity accepted on one line
pub const MAX_QUANTITY: i32 = 99;

const DEFAULT_LIST_LIMIT: i64 = 100;
const MAX_LIST_LIMIT: i64 = 500;

const COLUMNS: &str = "id, restaurant_id, table_id, table_name, source, status, cancel_reason, \
                       paid, is_locked, note, total, created_at, updated_at, paid_at";

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i64,
    restaurant_id: i64,
    table_id: Option<i64>,
    table_name: String,
    source: String,
    status: String,
    cancel_reason: Option<String>,
    paid: bool,
    is_locked: bool,
    note: Option<String>,
    total: Decimal,
    created_at: i64,
    updated_at: i64,
    paid_at: Option<i64>,
}

impl OrderRow {
    fn status(&self) -> ServiceResult<OrderStatus> {
        self.status
            .parse()
            .map_err(|e: shared::order::UnknownValue| ServiceError::Db(e.into()))
    }

    fn state(&self) -> ServiceResult<OrderState> {
        Ok(OrderState {
            status: self.status()?,
            paid: self.paid,
            is_locked: self.is_locked,
        })
    }

    fn into_order(self, items: Vec<OrderItem>) -> ServiceResult<Order> {
        let status = self.status()?;
        let source = self
            .source
            .parse()
            .map_err(|e: shared::order::UnknownValue| ServiceError::Db(e.into()))?;
        Ok(Order {
            id: self.id,
            restaurant_id: self.restaurant_id,
            table_id: self.table_id,
            table_name: self.table_name,
            source,
            status,
            cancel_reason: self.cancel_reason,
            paid: self.paid,
            is_locked: self.is_locked,
            note: self.note,
            total: self.total,
            created_at: self.created_at,
            updated_at: self.updated_at,
            paid_at: self.paid_at,
            items,
        })
    }
}

/// A new order as received from the public page or the dashboard
#[derive(Debug, Clone)]
pub struct NewOrder<'a> {
    pub restaurant_id: i64,
    pub table_id: i64,
    pub items: &'a [OrderItemInput],
    pub note: Option<&'a str>,
    pub source: OrderSource,
}

/// Catalog-resolved line, ready to insert
struct Line {
    menu_item_id: i64,
    name: String,
    price: Decimal,
    quantity: i32,
    note: Option<String>,
}

fn not_found(order_id: i64) -> AppError {
    AppError::new(ErrorCode::OrderNotFound).with_detail("order_id", order_id)
}

/// Order-level note, trimmed before storage
pub fn validate_note(note: Option<&str>) -> Result<(), AppError> {
    match note {
        Some(n) if n.trim().chars().count() > MAX_NOTE_LEN => Err(AppError::validation(format!(
            "note is too long (max {MAX_NOTE_LEN})"
        ))
        .with_detail("field", "note")),
        _ => Ok(()),
    }
}

/// Check requested lines before touching the database
pub fn validate_items(items: &[OrderItemInput]) -> Result<(), AppError> {
    if items.is_empty() {
        return Err(AppError::new(ErrorCode::OrderEmpty).with_detail("field", "items"));
    }
    for item in items {
        if !(1..=MAX_QUANTITY).contains(&item.quantity) {
            return Err(AppError::new(ErrorCode::InvalidQuantity)
                .with_detail("field", "quantity")
                .with_detail("menu_item_id", item.menu_item_id)
                .with_detail("max", MAX_QUANTITY));
        }
        validate_optional_text(&item.note, "note", MAX_NOTE_LEN)?;
    }
    Ok(())
}

/// Look up name, price and availability of every requested item
async fn resolve_lines(
    conn: &mut PgConnection,
    restaurant_id: i64,
    inputs: &[OrderItemInput],
) -> ServiceResult<Vec<Line>> {
    let ids: Vec<i64> = inputs.iter().map(|i| i.menu_item_id).collect();
    let rows: Vec<(i64, String, Decimal, bool)> = sqlx::query_as(
        "SELECT id, name, price, is_available FROM menu_items WHERE restaurant_id = $1 AND id = ANY($2)",
    )
    .bind(restaurant_id)
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await?;
    let catalog: HashMap<i64, (String, Decimal, bool)> = rows
        .into_iter()
        .map(|(id, name, price, available)| (id, (name, price, available)))
        .collect();

    inputs
        .iter()
        .map(|input| -> ServiceResult<Line> {
            let Some((name, price, available)) = catalog.get(&input.menu_item_id) else {
                return Err(AppError::new(ErrorCode::MenuItemNotFound)
                    .with_detail("menu_item_id", input.menu_item_id)
                    .into());
            };
            if !available {
                return Err(AppError::new(ErrorCode::OrderItemUnavailable)
                    .with_detail("menu_item_id", input.menu_item_id)
                    .with_detail("name", name.clone())
                    .into());
            }
            Ok(Line {
                menu_item_id: input.menu_item_id,
                name: name.clone(),
                price: *price,
                quantity: input.quantity,
                note: input
                    .note
                    .as_deref()
                    .map(str::trim)
                    .filter(|n| !n.is_empty())
                    .map(String::from),
            })
        })
        .collect()
}

/// Largest total a `NUMERIC(12,2)` column holds
fn max_total() -> Decimal {
    Decimal::new(999_999_999_999, 2)
}

fn total_of(lines: &[Line]) -> Result<Decimal, AppError> {
    let total: Decimal = lines
        .iter()
        .map(|l| l.price * Decimal::from(l.quantity))
        .sum();
    if total > max_total() {
        return Err(AppError::new(ErrorCode::ValueOutOfRange)
            .with_detail("field", "items")
            .with_detail("max", max_total().to_string()));
    }
    Ok(total)
}

async fn insert_lines(
    conn: &mut PgConnection,
    order_id: i64,
    lines: Vec<Line>,
) -> ServiceResult<()> {
    let mut ids = Vec::with_capacity(lines.len());
    let mut menu_item_ids = Vec::with_capacity(lines.len());
    let mut names = Vec::with_capacity(lines.len());
    let mut prices = Vec::with_capacity(lines.len());
    let mut quantities = Vec::with_capacity(lines.len());
    let mut notes = Vec::with_capacity(lines.len());
    let mut positions = Vec::with_capacity(lines.len());
    for (position, line) in lines.into_iter().enumerate() {
        ids.push(snowflake_id());
        menu_item_ids.push(line.menu_item_id);
        names.push(line.name);
        prices.push(line.price);
        quantities.push(line.quantity);
        notes.push(line.note);
        positions.push(position as i32);
    }

    sqlx::query(
        r#"
        INSERT INTO order_items (id, order_id, menu_item_id, name, price, quantity, note, position)
        SELECT u.id, $1, u.menu_item_id, u.name, u.price, u.quantity, u.note, u.position
        FROM UNNEST($2::bigint[], $3::bigint[], $4::text[], $5::numeric[], $6::int[], $7::text[], $8::int[])
            AS u(id, menu_item_id, name, price, quantity, note, position)
        "#,
    )
    .bind(order_id)
    .bind(&ids)
    .bind(&menu_item_ids)
    .bind(&names)
    .bind(&prices)
    .bind(&quantities)
    .bind(&notes)
    .bind(&positions)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn load_items<'e>(db: impl PgExecutor<'e>, order_ids: &[i64]) -> ServiceResult<Vec<OrderItem>> {
    let items = sqlx::query_as::<_, OrderItem>(
        r#"
        SELECT id, order_id, menu_item_id, name, price, quantity, note, position
        FROM order_items
        WHERE order_id = ANY($1)
        ORDER BY order_id, position
        "#,
    )
    .bind(order_ids)
    .fetch_all(db)
    .await?;
    Ok(items)
}

/// Attach items to their orders, keeping the order of `rows`
async fn with_items(pool: &PgPool, rows: Vec<OrderRow>) -> ServiceResult<Vec<Order>> {
    let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
    let mut items_by_order: HashMap<i64, Vec<OrderItem>> = HashMap::new();
    for item in load_items(pool, &ids).await? {
        items_by_order.entry(item.order_id).or_default().push(item);
    }
    rows.into_iter()
        .map(|row| {
            let items = items_by_order.remove(&row.id).unwrap_or_default();
            row.into_order(items)
        })
        .collect()
}

async fn fetch(conn: &mut PgConnection, restaurant_id: i64, order_id: i64) -> ServiceResult<Order> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {COLUMNS} FROM orders WHERE id = $1 AND restaurant_id = $2"
    ))
    .bind(order_id)
    .bind(restaurant_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| not_found(order_id))?;
    let items = load_items(&mut *conn, &[order_id]).await?;
    row.into_order(items)
}

/// Lock the order row for the rest of the transaction
async fn lock(conn: &mut PgConnection, restaurant_id: i64, order_id: i64) -> ServiceResult<OrderRow> {
    sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {COLUMNS} FROM orders WHERE id = $1 AND restaurant_id = $2 FOR UPDATE"
    ))
    .bind(order_id)
    .bind(restaurant_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| not_found(order_id).into())
}

/// Place an order. Table and items must belong to the restaurant.
pub async fn create(pool: &PgPool, new: &NewOrder<'_>) -> ServiceResult<Order> {
    validate_items(new.items)?;
    validate_note(new.note)?;
    let note = new.note.map(str::trim).filter(|n| !n.is_empty());

    let mut tx = pool.begin().await?;

    if restaurants::find(&mut *tx, new.restaurant_id).await?.is_none() {
        return Err(AppError::new(ErrorCode::RestaurantNotFound).into());
    }

    let table: Option<(String, bool)> = sqlx::query_as(
        "SELECT name, is_active FROM dining_tables WHERE id = $1 AND restaurant_id = $2",
    )
    .bind(new.table_id)
    .bind(new.restaurant_id)
    .fetch_optional(&mut *tx)
    .await?;
    let Some((table_name, is_active)) = table else {
        return Err(AppError::new(ErrorCode::TableNotFound)
            .with_detail("table_id", new.table_id)
            .into());
    };
    if !is_active {
        return Err(AppError::new(ErrorCode::TableInactive)
            .with_detail("table_id", new.table_id)
            .into());
    }

    let lines = resolve_lines(&mut tx, new.restaurant_id, new.items).await?;
    let total = total_of(&lines)?;
    let order_id = snowflake_id();
    let now = now_millis();

    sqlx::query(
        r#"
        INSERT INTO orders (
            id, restaurant_id, table_id, table_name, source, status,
            paid, is_locked, note, total, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, FALSE, FALSE, $7, $8, $9, $9)
        "#,
    )
    .bind(order_id)
    .bind(new.restaurant_id)
    .bind(new.table_id)
    .bind(&table_name)
    .bind(new.source.as_str())
    .bind(OrderStatus::Pending.as_str())
    .bind(note)
    .bind(total)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    insert_lines(&mut tx, order_id, lines).await?;
    let order = fetch(&mut tx, new.restaurant_id, order_id).await?;
    tx.commit().await?;

    tracing::info!(
        restaurant_id = new.restaurant_id,
        order_id,
        table = %table_name,
        source = new.source.as_str(),
        "Order placed"
    );
    Ok(order)
}

pub async fn get(pool: &PgPool, restaurant_id: i64, order_id: i64) -> ServiceResult<Order> {
    let mut conn = pool.acquire().await?;
    fetch(&mut conn, restaurant_id, order_id).await
}

/// Orders newest first, optionally filtered by status
pub async fn list(
    pool: &PgPool,
    restaurant_id: i64,
    status: Option<OrderStatus>,
    limit: Option<i64>,
) -> ServiceResult<Vec<Order>> {
    let limit = limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT);
    let rows = sqlx::query_as::<_, OrderRow>(&format!(
        r#"
        SELECT {COLUMNS} FROM orders
        WHERE restaurant_id = $1 AND ($2::text IS NULL OR status = $2)
        ORDER BY created_at DESC, id DESC
        LIMIT $3
        "#
    ))
    .bind(restaurant_id)
    .bind(status.map(|s| s.as_str()))
    .bind(limit)
    .fetch_all(pool)
    .await?;
    with_items(pool, rows).await
}

/// Non-terminal orders, oldest first (kitchen board order)
pub async fn active(pool: &PgPool, restaurant_id: i64) -> ServiceResult<Vec<Order>> {
    let statuses: Vec<&str> = OrderStatus::ACTIVE.iter().map(|s| s.as_str()).collect();
    let rows = sqlx::query_as::<_, OrderRow>(&format!(
        r#"
        SELECT {COLUMNS} FROM orders
        WHERE restaurant_id = $1 AND status = ANY($2)
        ORDER BY created_at, id
        "#
    ))
    .bind(restaurant_id)
    .bind(&statuses)
    .fetch_all(pool)
    .await?;
    with_items(pool, rows).await
}

pub async fn delete(pool: &PgPool, restaurant_id: i64, order_id: i64) -> ServiceResult<()> {
    let result = sqlx::query("DELETE FROM orders WHERE id = $1 AND restaurant_id = $2")
        .bind(order_id)
        .bind(restaurant_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(not_found(order_id).into());
    }
    tracing::info!(restaurant_id, order_id, "Order deleted");
    Ok(())
}

pub async fn change_status(
    pool: &PgPool,
    restaurant_id: i64,
    order_id: i64,
    next: OrderStatus,
    reason: Option<&str>,
) -> ServiceResult<Order> {
    let mut tx = pool.begin().await?;
    let row = lock(&mut tx, restaurant_id, order_id).await?;
    let (state, cancel_reason) = row.state()?.check_status_change(next, reason)?;

    sqlx::query(
        r#"
        UPDATE orders SET status = $2, cancel_reason = COALESCE($3, cancel_reason), updated_at = $4
        WHERE id = $1
        "#,
    )
    .bind(order_id)
    .bind(state.status.as_str())
    .bind(cancel_reason)
    .bind(now_millis())
    .execute(&mut *tx)
    .await?;

    let order = fetch(&mut tx, restaurant_id, order_id).await?;
    tx.commit().await?;

    tracing::info!(restaurant_id, order_id, from = %row.status, to = %next, "Order status changed");
    Ok(order)
}

/// Mark as paid. Paid orders are locked against item edits.
pub async fn mark_paid(pool: &PgPool, restaurant_id: i64, order_id: i64) -> ServiceResult<Order> {
    let mut tx = pool.begin().await?;
    let row = lock(&mut tx, restaurant_id, order_id).await?;
    let state = row.state()?.check_mark_paid()?;
    let now = now_millis();

    sqlx::query(
        "UPDATE orders SET paid = $2, is_locked = $3, paid_at = $4, updated_at = $4 WHERE id = $1",
    )
    .bind(order_id)
    .bind(state.paid)
    .bind(state.is_locked)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    let order = fetch(&mut tx, restaurant_id, order_id).await?;
    tx.commit().await?;

    tracing::info!(restaurant_id, order_id, total = %order.total, "Order paid");
    Ok(order)
}

/// Replace all items of an unlocked, non-terminal order
pub async fn replace_items(
    pool: &PgPool,
    restaurant_id: i64,
    order_id: i64,
    inputs: &[OrderItemInput],
) -> ServiceResult<Order> {
    validate_items(inputs)?;

    let mut tx = pool.begin().await?;
    let row = lock(&mut tx, restaurant_id, order_id).await?;
    row.state()?.check_items_editable()?;

    let lines = resolve_lines(&mut tx, restaurant_id, inputs).await?;
    let total = total_of(&lines)?;

    sqlx::query("DELETE FROM order_items WHERE order_id = $1")
        .bind(order_id)
        .execute(&mut *tx)
        .await?;
    insert_lines(&mut tx, order_id, lines).await?;

    sqlx::query("UPDATE orders SET total = $2, updated_at = $3 WHERE id = $1")
        .bind(order_id)
        .bind(total)
        .bind(now_millis())
        .execute(&mut *tx)
        .await?;

    let order = fetch(&mut tx, restaurant_id, order_id).await?;
    tx.commit().await?;

    tracing::info!(restaurant_id, order_id, items = order.items.len(), "Order items replaced");
    Ok(order)
}
