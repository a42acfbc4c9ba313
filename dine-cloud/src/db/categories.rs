//! Menu category queries

use shared::error::{AppError, ErrorCode};
use shared::models::{MenuCategory, MenuCategoryCreate, MenuCategoryUpdate, SortOrderUpdate};
use shared::util::{now_millis, snowflake_id};
use sqlx::{PgExecutor, PgPool};

use crate::error::{ServiceResult, conflict_on_unique};

const COLUMNS: &str =
    "id, restaurant_id, name, display_order, is_visible, created_at, updated_at";

fn not_found(category_id: i64) -> AppError {
    AppError::new(ErrorCode::CategoryNotFound).with_detail("category_id", category_id)
}

/// All categories of a restaurant in catalog order
pub async fn list<'e>(
    db: impl PgExecutor<'e>,
    restaurant_id: i64,
) -> ServiceResult<Vec<MenuCategory>> {
    let categories = sqlx::query_as::<_, MenuCategory>(&format!(
        "SELECT {COLUMNS} FROM menu_categories WHERE restaurant_id = $1 ORDER BY display_order, id"
    ))
    .bind(restaurant_id)
    .fetch_all(db)
    .await?;
    Ok(categories)
}

pub async fn exists<'e>(
    db: impl PgExecutor<'e>,
    restaurant_id: i64,
    category_id: i64,
) -> ServiceResult<bool> {
    let found: Option<i64> = sqlx::query_scalar(
        "SELECT id FROM menu_categories WHERE id = $1 AND restaurant_id = $2",
    )
    .bind(category_id)
    .bind(restaurant_id)
    .fetch_optional(db)
    .await?;
    Ok(found.is_some())
}

pub async fn create(
    pool: &PgPool,
    restaurant_id: i64,
    data: &MenuCategoryCreate,
) -> ServiceResult<MenuCategory> {
    let now = now_millis();
    let category = sqlx::query_as::<_, MenuCategory>(&format!(
        r#"
        INSERT INTO menu_categories (id, restaurant_id, name, display_order, is_visible, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $6)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(snowflake_id())
    .bind(restaurant_id)
    .bind(data.name.trim())
    .bind(data.display_order.unwrap_or(0))
    .bind(data.is_visible.unwrap_or(true))
    .bind(now)
    .fetch_one(pool)
    .await
    .map_err(|e| conflict_on_unique(e, ErrorCode::CategoryNameExists))?;
    Ok(category)
}

pub async fn update(
    pool: &PgPool,
    restaurant_id: i64,
    category_id: i64,
    data: &MenuCategoryUpdate,
) -> ServiceResult<MenuCategory> {
    sqlx::query_as::<_, MenuCategory>(&format!(
        r#"
        UPDATE menu_categories SET
            name = COALESCE($3, name),
            display_order = COALESCE($4, display_order),
            is_visible = COALESCE($5, is_visible),
            updated_at = $6
        WHERE id = $1 AND restaurant_id = $2
        RETURNING {COLUMNS}
        "#
    ))
    .bind(category_id)
    .bind(restaurant_id)
    .bind(data.name.as_deref().map(str::trim))
    .bind(data.display_order)
    .bind(data.is_visible)
    .bind(now_millis())
    .fetch_optional(pool)
    .await
    .map_err(|e| conflict_on_unique(e, ErrorCode::CategoryNameExists))?
    .ok_or_else(|| not_found(category_id).into())
}

/// Delete an empty category.
///
/// The row is locked first so an item cannot be added between the count and
/// the delete.
pub async fn delete(pool: &PgPool, restaurant_id: i64, category_id: i64) -> ServiceResult<()> {
    let mut tx = pool.begin().await?;

    let locked: Option<i64> = sqlx::query_scalar(
        "SELECT id FROM menu_categories WHERE id = $1 AND restaurant_id = $2 FOR UPDATE",
    )
    .bind(category_id)
    .bind(restaurant_id)
    .fetch_optional(&mut *tx)
    .await?;
    if locked.is_none() {
        return Err(not_found(category_id).into());
    }

    let item_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM menu_items WHERE category_id = $1")
            .bind(category_id)
            .fetch_one(&mut *tx)
            .await?;
    if item_count > 0 {
        return Err(AppError::new(ErrorCode::CategoryHasItems)
            .with_detail("category_id", category_id)
            .with_detail("item_count", item_count)
            .into());
    }

    sqlx::query("DELETE FROM menu_categories WHERE id = $1")
        .bind(category_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}

/// Batch update display order. Ids of other restaurants are ignored.
pub async fn batch_update_sort_order(
    pool: &PgPool,
    restaurant_id: i64,
    items: &[SortOrderUpdate],
) -> ServiceResult<u64> {
    if items.is_empty() {
        return Ok(0);
    }
    let ids: Vec<i64> = items.iter().map(|i| i.id).collect();
    let orders: Vec<i32> = items.iter().map(|i| i.display_order).collect();
    let result = sqlx::query(
        r#"
        UPDATE menu_categories c SET display_order = u.display_order, updated_at = $4
        FROM UNNEST($2::bigint[], $3::int[]) AS u(id, display_order)
        WHERE c.id = u.id AND c.restaurant_id = $1
        "#,
    )
    .bind(restaurant_id)
    .bind(&ids)
    .bind(&orders)
    .bind(now_millis())
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}
