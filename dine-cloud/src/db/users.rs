//! Owner accounts

use shared::error::ErrorCode;
use shared::models::{Restaurant, User};
use shared::util::{now_millis, snowflake_id};
use sqlx::PgPool;

use crate::db::restaurants;
use crate::error::{ServiceResult, conflict_on_unique};

pub async fn find_by_email(pool: &PgPool, email: &str) -> ServiceResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, restaurant_id, email, name, hashed_password, created_at FROM users WHERE email = $1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> ServiceResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, restaurant_id, email, name, hashed_password, created_at FROM users WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

/// Create a restaurant and its owner in one transaction.
///
/// `email` must already be normalized. A taken email rolls back the
/// restaurant insert and reports `EmailAlreadyRegistered`.
pub async fn create_with_restaurant(
    pool: &PgPool,
    email: &str,
    name: &str,
    hashed_password: &str,
    restaurant_name: &str,
) -> ServiceResult<(User, Restaurant)> {
    let now = now_millis();
    let mut tx = pool.begin().await?;

    let restaurant = restaurants::insert(&mut *tx, snowflake_id(), restaurant_name, now).await?;

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, restaurant_id, email, name, hashed_password, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, restaurant_id, email, name, hashed_password, created_at
        "#,
    )
    .bind(snowflake_id())
    .bind(restaurant.id)
    .bind(email)
    .bind(name)
    .bind(hashed_password)
    .bind(now)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| conflict_on_unique(e, ErrorCode::EmailAlreadyRegistered))?;

    tx.commit().await?;
    Ok((user, restaurant))
}

pub async fn update_password(pool: &PgPool, user_id: i64, hashed_password: &str) -> ServiceResult<()> {
    sqlx::query("UPDATE users SET hashed_password = $1 WHERE id = $2")
        .bind(hashed_password)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}
