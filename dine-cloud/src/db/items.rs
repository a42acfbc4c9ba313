//! Menu item queries

use shared::error::{AppError, ErrorCode};
use shared::models::{MenuItem, MenuItemCreate, MenuItemUpdate};
use shared::util::{now_millis, snowflake_id};
use sqlx::{PgExecutor, PgPool};

use crate::db::categories;
use crate::error::{ServiceResult, conflict_on_unique};

const COLUMNS: &str = "id, restaurant_id, category_id, name, description, price, image_url, \
                       is_available, display_order, created_at, updated_at";

fn not_found(item_id: i64) -> AppError {
    AppError::new(ErrorCode::MenuItemNotFound).with_detail("item_id", item_id)
}

fn category_not_found(category_id: i64) -> AppError {
    AppError::new(ErrorCode::CategoryNotFound)
        .with_detail("field", "category_id")
        .with_detail("category_id", category_id)
}

/// Items of a restaurant, optionally of one category, in catalog order
pub async fn list<'e>(
    db: impl PgExecutor<'e>,
    restaurant_id: i64,
    category_id: Option<i64>,
) -> ServiceResult<Vec<MenuItem>> {
    let items = sqlx::query_as::<_, MenuItem>(&format!(
        r#"
        SELECT {COLUMNS} FROM menu_items
        WHERE restaurant_id = $1 AND ($2::bigint IS NULL OR category_id = $2)
        ORDER BY category_id, display_order, id
        "#
    ))
    .bind(restaurant_id)
    .bind(category_id)
    .fetch_all(db)
    .await?;
    Ok(items)
}

pub async fn get(pool: &PgPool, restaurant_id: i64, item_id: i64) -> ServiceResult<MenuItem> {
    sqlx::query_as::<_, MenuItem>(&format!(
        "SELECT {COLUMNS} FROM menu_items WHERE id = $1 AND restaurant_id = $2"
    ))
    .bind(item_id)
    .bind(restaurant_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| not_found(item_id).into())
}

pub async fn create(
    pool: &PgPool,
    restaurant_id: i64,
    data: &MenuItemCreate,
) -> ServiceResult<MenuItem> {
    if !categories::exists(pool, restaurant_id, data.category_id).await? {
        return Err(category_not_found(data.category_id).into());
    }

    let now = now_millis();
    let item = sqlx::query_as::<_, MenuItem>(&format!(
        r#"
        INSERT INTO menu_items (
            id, restaurant_id, category_id, name, description, price,
            image_url, is_available, display_order, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(snowflake_id())
    .bind(restaurant_id)
    .bind(data.category_id)
    .bind(data.name.trim())
    .bind(&data.description)
    .bind(data.price)
    .bind(&data.image_url)
    .bind(data.is_available.unwrap_or(true))
    .bind(data.display_order.unwrap_or(0))
    .bind(now)
    .fetch_one(pool)
    .await
    .map_err(|e| conflict_on_unique(e, ErrorCode::MenuItemNameExists))?;
    Ok(item)
}

pub async fn update(
    pool: &PgPool,
    restaurant_id: i64,
    item_id: i64,
    data: &MenuItemUpdate,
) -> ServiceResult<MenuItem> {
    if let Some(category_id) = data.category_id
        && !categories::exists(pool, restaurant_id, category_id).await?
    {
        return Err(category_not_found(category_id).into());
    }

    sqlx::query_as::<_, MenuItem>(&format!(
        r#"
        UPDATE menu_items SET
            category_id = COALESCE($3, category_id),
            name = COALESCE($4, name),
            description = COALESCE($5, description),
            price = COALESCE($6, price),
            image_url = COALESCE($7, image_url),
            is_available = COALESCE($8, is_available),
            display_order = COALESCE($9, display_order),
            updated_at = $10
        WHERE id = $1 AND restaurant_id = $2
        RETURNING {COLUMNS}
        "#
    ))
    .bind(item_id)
    .bind(restaurant_id)
    .bind(data.category_id)
    .bind(data.name.as_deref().map(str::trim))
    .bind(&data.description)
    .bind(data.price)
    .bind(&data.image_url)
    .bind(data.is_available)
    .bind(data.display_order)
    .bind(now_millis())
    .fetch_optional(pool)
    .await
    .map_err(|e| conflict_on_unique(e, ErrorCode::MenuItemNameExists))?
    .ok_or_else(|| not_found(item_id).into())
}

/// Delete an item. Past orders keep their frozen name and price.
pub async fn delete(pool: &PgPool, restaurant_id: i64, item_id: i64) -> ServiceResult<()> {
    let result = sqlx::query("DELETE FROM menu_items WHERE id = $1 AND restaurant_id = $2")
        .bind(item_id)
        .bind(restaurant_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(not_found(item_id).into());
    }
    Ok(())
}
