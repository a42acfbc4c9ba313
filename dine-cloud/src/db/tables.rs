//! Dining table queries

use shared::error::{AppError, ErrorCode};
use shared::models::{DiningTable, DiningTableCreate, DiningTableUpdate};
use shared::util::{now_millis, snowflake_id};
use sqlx::{PgExecutor, PgPool};

use crate::error::{ServiceResult, conflict_on_unique};

const COLUMNS: &str = "id, restaurant_id, name, capacity, is_active, created_at";

fn not_found(table_id: i64) -> AppError {
    AppError::new(ErrorCode::TableNotFound).with_detail("table_id", table_id)
}

pub async fn list(pool: &PgPool, restaurant_id: i64) -> ServiceResult<Vec<DiningTable>> {
    let tables = sqlx::query_as::<_, DiningTable>(&format!(
        "SELECT {COLUMNS} FROM dining_tables WHERE restaurant_id = $1 ORDER BY name, id"
    ))
    .bind(restaurant_id)
    .fetch_all(pool)
    .await?;
    Ok(tables)
}

pub async fn find<'e>(
    db: impl PgExecutor<'e>,
    restaurant_id: i64,
    table_id: i64,
) -> ServiceResult<Option<DiningTable>> {
    let table = sqlx::query_as::<_, DiningTable>(&format!(
        "SELECT {COLUMNS} FROM dining_tables WHERE id = $1 AND restaurant_id = $2"
    ))
    .bind(table_id)
    .bind(restaurant_id)
    .fetch_optional(db)
    .await?;
    Ok(table)
}

pub async fn get(pool: &PgPool, restaurant_id: i64, table_id: i64) -> ServiceResult<DiningTable> {
    find(pool, restaurant_id, table_id)
        .await?
        .ok_or_else(|| not_found(table_id).into())
}

pub async fn create(
    pool: &PgPool,
    restaurant_id: i64,
    data: &DiningTableCreate,
) -> ServiceResult<DiningTable> {
    let table = sqlx::query_as::<_, DiningTable>(&format!(
        r#"
        INSERT INTO dining_tables (id, restaurant_id, name, capacity, is_active, created_at)
        VALUES ($1, $2, $3, $4, TRUE, $5)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(snowflake_id())
    .bind(restaurant_id)
    .bind(data.name.trim())
    .bind(data.capacity.unwrap_or(4))
    .bind(now_millis())
    .fetch_one(pool)
    .await
    .map_err(|e| conflict_on_unique(e, ErrorCode::TableNameExists))?;
    Ok(table)
}

pub async fn update(
    pool: &PgPool,
    restaurant_id: i64,
    table_id: i64,
    data: &DiningTableUpdate,
) -> ServiceResult<DiningTable> {
    sqlx::query_as::<_, DiningTable>(&format!(
        r#"
        UPDATE dining_tables SET
            name = COALESCE($3, name),
            capacity = COALESCE($4, capacity),
            is_active = COALESCE($5, is_active)
        WHERE id = $1 AND restaurant_id = $2
        RETURNING {COLUMNS}
        "#
    ))
    .bind(table_id)
    .bind(restaurant_id)
    .bind(data.name.as_deref().map(str::trim))
    .bind(data.capacity)
    .bind(data.is_active)
    .fetch_optional(pool)
    .await
    .map_err(|e| conflict_on_unique(e, ErrorCode::TableNameExists))?
    .ok_or_else(|| not_found(table_id).into())
}

/// Delete a table. Its orders stay and lose their table reference.
pub async fn delete(pool: &PgPool, restaurant_id: i64, table_id: i64) -> ServiceResult<()> {
    let result = sqlx::query("DELETE FROM dining_tables WHERE id = $1 AND restaurant_id = $2")
        .bind(table_id)
        .bind(restaurant_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(not_found(table_id).into());
    }
    Ok(())
}
