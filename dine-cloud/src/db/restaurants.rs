//! Restaurant (tenant) queries

use shared::error::{AppError, ErrorCode};
use shared::models::{Restaurant, RestaurantUpdate};
use sqlx::{PgExecutor, PgPool};

use crate::error::ServiceResult;

pub async fn find<'e>(db: impl PgExecutor<'e>, id: i64) -> ServiceResult<Option<Restaurant>> {
    let restaurant = sqlx::query_as::<_, Restaurant>(
        r#"
        SELECT id, name, description, address, phone, logo_url, currency, created_at, updated_at
        FROM restaurants
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(restaurant)
}

pub async fn get(pool: &PgPool, id: i64) -> ServiceResult<Restaurant> {
    find(pool, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::RestaurantNotFound).into())
}

/// Insert a new restaurant (signup)
pub async fn insert<'e>(
    db: impl PgExecutor<'e>,
    id: i64,
    name: &str,
    now: i64,
) -> ServiceResult<Restaurant> {
    let restaurant = sqlx::query_as::<_, Restaurant>(
        r#"
        INSERT INTO restaurants (id, name, created_at, updated_at)
        VALUES ($1, $2, $3, $3)
        RETURNING id, name, description, address, phone, logo_url, currency, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(now)
    .fetch_one(db)
    .await?;
    Ok(restaurant)
}

/// Partial update; absent fields keep their value
pub async fn update(
    pool: &PgPool,
    id: i64,
    data: &RestaurantUpdate,
    now: i64,
) -> ServiceResult<Restaurant> {
    sqlx::query_as::<_, Restaurant>(
        r#"
        UPDATE restaurants SET
            name = COALESCE($2, name),
            description = COALESCE($3, description),
            address = COALESCE($4, address),
            phone = COALESCE($5, phone),
            logo_url = COALESCE($6, logo_url),
            currency = COALESCE($7, currency),
            updated_at = $8
        WHERE id = $1
        RETURNING id, name, description, address, phone, logo_url, currency, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(&data.name)
    .bind(&data.description)
    .bind(&data.address)
    .bind(&data.phone)
    .bind(&data.logo_url)
    .bind(&data.currency)
    .bind(now)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::new(ErrorCode::RestaurantNotFound).into())
}
