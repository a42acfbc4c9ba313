//! Saved menus: layout save, merge and publish
//!
//! At most one menu per restaurant is published. The partial unique index
//! `menus_one_published` enforces it; `publish` serializes concurrent
//! publishes on the restaurant's menu row locks so the last one wins.

use shared::error::{AppError, ErrorCode};
use shared::menu::{MenuLayout, merge_layout};
use shared::models::{Menu, MenuCreate, MenuDetail, MenuSummary, MenuUpdate, PublishedMenu};
use shared::util::{now_millis, snowflake_id};
use sqlx::types::Json;
use sqlx::{PgConnection, PgExecutor, PgPool};

use crate::db::{categories, items, restaurants};
use crate::error::{ServiceError, ServiceResult, unique_violation};

const COLUMNS: &str =
    "id, restaurant_id, name, layout, version, published, published_at, created_at, updated_at";

/// Partial unique index: one published menu per restaurant
const ONE_PUBLISHED_INDEX: &str = "menus_one_published";

fn not_found(menu_id: i64) -> AppError {
    AppError::new(ErrorCode::MenuNotFound).with_detail("menu_id", menu_id)
}

fn map_write_error(err: sqlx::Error) -> ServiceError {
    match unique_violation(&err) {
        Some(ONE_PUBLISHED_INDEX) => AppError::new(ErrorCode::MenuPublishConflict).into(),
        Some(_) => AppError::new(ErrorCode::MenuNameExists)
            .with_detail("field", "name")
            .into(),
        None => err.into(),
    }
}

pub async fn list(pool: &PgPool, restaurant_id: i64) -> ServiceResult<Vec<MenuSummary>> {
    let menus = sqlx::query_as::<_, MenuSummary>(
        r#"
        SELECT id, name, version, published, published_at, updated_at
        FROM menus
        WHERE restaurant_id = $1
        ORDER BY created_at, id
        "#,
    )
    .bind(restaurant_id)
    .fetch_all(pool)
    .await?;
    Ok(menus)
}

pub async fn get<'e>(
    db: impl PgExecutor<'e>,
    restaurant_id: i64,
    menu_id: i64,
) -> ServiceResult<Menu> {
    sqlx::query_as::<_, Menu>(&format!(
        "SELECT {COLUMNS} FROM menus WHERE id = $1 AND restaurant_id = $2"
    ))
    .bind(menu_id)
    .bind(restaurant_id)
    .fetch_optional(db)
    .await?
    .ok_or_else(|| not_found(menu_id).into())
}

/// A menu merged with the current catalog
pub async fn detail(pool: &PgPool, restaurant_id: i64, menu_id: i64) -> ServiceResult<MenuDetail> {
    let menu = get(pool, restaurant_id, menu_id).await?;
    let categories = categories::list(pool, restaurant_id).await?;
    let items = items::list(pool, restaurant_id, None).await?;
    let merged = merge_layout(&categories, &items, &menu.layout);
    Ok(MenuDetail { menu, merged })
}

/// Reject a layout that does not match the restaurant's catalog
async fn validate_layout(
    conn: &mut PgConnection,
    restaurant_id: i64,
    layout: &MenuLayout,
) -> ServiceResult<()> {
    let categories = categories::list(&mut *conn, restaurant_id).await?;
    let items = items::list(&mut *conn, restaurant_id, None).await?;
    layout.validate(&categories, &items)?;
    Ok(())
}

pub async fn create(pool: &PgPool, restaurant_id: i64, data: &MenuCreate) -> ServiceResult<Menu> {
    let layout = data.layout.clone().unwrap_or_default();
    let now = now_millis();

    let mut tx = pool.begin().await?;
    validate_layout(&mut tx, restaurant_id, &layout).await?;

    let menu = sqlx::query_as::<_, Menu>(&format!(
        r#"
        INSERT INTO menus (id, restaurant_id, name, layout, version, published, created_at, updated_at)
        VALUES ($1, $2, $3, $4, 1, FALSE, $5, $5)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(snowflake_id())
    .bind(restaurant_id)
    .bind(data.name.trim())
    .bind(Json(&layout))
    .bind(now)
    .fetch_one(&mut *tx)
    .await
    .map_err(map_write_error)?;

    tx.commit().await?;
    Ok(menu)
}

/// Rename and/or replace the layout. Every save bumps the version.
pub async fn save(
    pool: &PgPool,
    restaurant_id: i64,
    menu_id: i64,
    data: &MenuUpdate,
) -> ServiceResult<Menu> {
    let mut tx = pool.begin().await?;

    let locked: Option<i64> = sqlx::query_scalar(
        "SELECT id FROM menus WHERE id = $1 AND restaurant_id = $2 FOR UPDATE",
    )
    .bind(menu_id)
    .bind(restaurant_id)
    .fetch_optional(&mut *tx)
    .await?;
    if locked.is_none() {
        return Err(not_found(menu_id).into());
    }

    if let Some(layout) = &data.layout {
        validate_layout(&mut tx, restaurant_id, layout).await?;
    }

    let menu = sqlx::query_as::<_, Menu>(&format!(
        r#"
        UPDATE menus SET
            name = COALESCE($2, name),
            layout = COALESCE($3, layout),
            version = version + 1,
            updated_at = $4
        WHERE id = $1
        RETURNING {COLUMNS}
        "#
    ))
    .bind(menu_id)
    .bind(data.name.as_deref().map(str::trim))
    .bind(data.layout.as_ref().map(Json))
    .bind(now_millis())
    .fetch_one(&mut *tx)
    .await
    .map_err(map_write_error)?;

    tx.commit().await?;
    tracing::info!(restaurant_id, menu_id, version = menu.version, "Menu saved");
    Ok(menu)
}

pub async fn delete(pool: &PgPool, restaurant_id: i64, menu_id: i64) -> ServiceResult<()> {
    let result = sqlx::query("DELETE FROM menus WHERE id = $1 AND restaurant_id = $2")
        .bind(menu_id)
        .bind(restaurant_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(not_found(menu_id).into());
    }
    Ok(())
}

/// Publish a menu, unpublishing whichever menu was published before.
pub async fn publish(pool: &PgPool, restaurant_id: i64, menu_id: i64) -> ServiceResult<Menu> {
    let now = now_millis();
    let mut tx = pool.begin().await?;

    // Lock every menu row of the restaurant in a stable order
    let ids: Vec<i64> = sqlx::query_scalar(
        "SELECT id FROM menus WHERE restaurant_id = $1 ORDER BY id FOR UPDATE",
    )
    .bind(restaurant_id)
    .fetch_all(&mut *tx)
    .await?;
    if !ids.contains(&menu_id) {
        return Err(not_found(menu_id).into());
    }

    sqlx::query(
        r#"
        UPDATE menus SET published = FALSE, published_at = NULL
        WHERE restaurant_id = $1 AND published AND id <> $2
        "#,
    )
    .bind(restaurant_id)
    .bind(menu_id)
    .execute(&mut *tx)
    .await?;

    let menu = sqlx::query_as::<_, Menu>(&format!(
        r#"
        UPDATE menus SET published = TRUE, published_at = $2, updated_at = $2
        WHERE id = $1
        RETURNING {COLUMNS}
        "#
    ))
    .bind(menu_id)
    .bind(now)
    .fetch_one(&mut *tx)
    .await
    .map_err(map_write_error)?;

    tx.commit().await.map_err(map_write_error)?;
    tracing::info!(restaurant_id, menu_id, "Menu published");
    Ok(menu)
}

pub async fn unpublish(pool: &PgPool, restaurant_id: i64, menu_id: i64) -> ServiceResult<Menu> {
    let menu = sqlx::query_as::<_, Menu>(&format!(
        r#"
        UPDATE menus SET published = FALSE, published_at = NULL, updated_at = $3
        WHERE id = $1 AND restaurant_id = $2
        RETURNING {COLUMNS}
        "#
    ))
    .bind(menu_id)
    .bind(restaurant_id)
    .bind(now_millis())
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| not_found(menu_id))?;
    tracing::info!(restaurant_id, menu_id, "Menu unpublished");
    Ok(menu)
}

/// What diners see: the published menu merged with the catalog, hidden and
/// unavailable entries removed.
pub async fn published(pool: &PgPool, restaurant_id: i64) -> ServiceResult<PublishedMenu> {
    let restaurant = restaurants::get(pool, restaurant_id).await?;

    let menu = sqlx::query_as::<_, Menu>(&format!(
        "SELECT {COLUMNS} FROM menus WHERE restaurant_id = $1 AND published"
    ))
    .bind(restaurant_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::new(ErrorCode::NoPublishedMenu))?;

    let categories = categories::list(pool, restaurant_id).await?;
    let items = items::list(pool, restaurant_id, None).await?;
    let merged = merge_layout(&categories, &items, &menu.layout);

    Ok(PublishedMenu {
        restaurant_id,
        menu_id: menu.id,
        name: menu.name,
        version: menu.version,
        currency: restaurant.currency,
        categories: merged.published_view(),
    })
}
