//! Database-backed tests. Skipped unless `DATABASE_URL` points at a
//! PostgreSQL instance the tests may migrate and write to.

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use dine_cloud::auth::SessionIdentity;
use dine_cloud::auth::session::create_token;
use dine_cloud::db::orders::NewOrder;
use dine_cloud::db::{categories, items, menus, orders, tables, users};
use dine_cloud::{AppState, Config, api};
use rust_decimal::Decimal;
use shared::error::{AppError, ErrorCode};
use shared::live::LiveMessage;
use shared::models::{
    DiningTableCreate, MenuCategoryCreate, MenuCreate, MenuItemCreate, OrderItemInput,
};
use shared::order::{OrderSource, OrderStatus};
use shared::util::snowflake_id;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;

async fn pool() -> Option<PgPool> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping");
        return None;
    };
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    Some(pool)
}

/// Fresh restaurant with an owner account, returns its id
async fn restaurant(pool: &PgPool) -> i64 {
    let email = format!("owner-{}@test.example", snowflake_id());
    let (_, restaurant) =
        users::create_with_restaurant(pool, &email, "Owner", "not-a-real-hash", "Test Bistro")
            .await
            .unwrap();
    restaurant.id
}

fn code<T: std::fmt::Debug>(result: Result<T, dine_cloud::error::ServiceError>) -> ErrorCode {
    AppError::from(result.unwrap_err()).code
}

fn category(name: &str) -> MenuCategoryCreate {
    MenuCategoryCreate {
        name: name.into(),
        display_order: None,
        is_visible: None,
    }
}

fn item(category_id: i64, name: &str, cents: i64) -> MenuItemCreate {
    MenuItemCreate {
        category_id,
        name: name.into(),
        description: None,
        price: Decimal::new(cents, 2),
        image_url: None,
        is_available: None,
        display_order: None,
    }
}

async fn post_json(
    app: axum::Router,
    uri: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(
            Request::post(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn put_json(
    app: axum::Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(
            Request::put(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

/// Restaurant with one table and one item, plus a staff token for it
struct Floor {
    state: AppState,
    restaurant_id: i64,
    table_id: i64,
    item_id: i64,
    token: String,
}

async fn floor(pool: &PgPool) -> Floor {
    let url = std::env::var("DATABASE_URL").unwrap();
    let state = AppState::with_pool(&Config::for_database(url), pool.clone()).unwrap();

    let email = format!("floor-{}@test.example", snowflake_id());
    let (user, restaurant) =
        users::create_with_restaurant(pool, &email, "Owner", "not-a-real-hash", "Live Bistro")
            .await
            .unwrap();
    let cat = categories::create(pool, restaurant.id, &category("Mains")).await.unwrap();
    let soup = items::create(pool, restaurant.id, &item(cat.id, "Soup", 450)).await.unwrap();
    let table = tables::create(
        pool,
        restaurant.id,
        &DiningTableCreate {
            name: "T7".into(),
            capacity: None,
        },
    )
    .await
    .unwrap();

    let identity = SessionIdentity {
        user_id: user.id,
        restaurant_id: restaurant.id,
        email,
    };
    let token = create_token(&identity, &state.jwt_secret, 1).unwrap().token;

    Floor {
        state,
        restaurant_id: restaurant.id,
        table_id: table.id,
        item_id: soup.id,
        token,
    }
}

async fn place_order(app: axum::Router, floor: &Floor) -> i64 {
    let (status, order) = post_json(
        app,
        "/api/public/orders",
        serde_json::json!({
            "restaurant_id": floor.restaurant_id,
            "table_id": floor.table_id,
            "items": [{ "menu_item_id": floor.item_id, "quantity": 2 }],
            "note": "window seat",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    order["id"].as_i64().unwrap()
}

#[tokio::test]
async fn order_changes_reach_live_subscribers() {
    let Some(pool) = pool().await else { return };
    let floor = floor(&pool).await;
    let mut rx = floor.state.live_orders.subscribe(floor.restaurant_id);
    let app = api::create_router(floor.state.clone());

    let order_id = place_order(app.clone(), &floor).await;
    match rx.try_recv().unwrap() {
        LiveMessage::NewOrder { order } => {
            assert_eq!(order.id, order_id);
            assert_eq!(order.status, OrderStatus::Pending);
            assert_eq!(order.total, Decimal::new(900, 2));
        }
        other => panic!("expected NewOrder, got {other:?}"),
    }

    let (status, _) = put_json(
        app,
        &format!("/api/orders/{order_id}/status"),
        &floor.token,
        serde_json::json!({ "status": "PREPARING" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    match rx.try_recv().unwrap() {
        LiveMessage::OrderUpdated { order } => {
            assert_eq!(order.id, order_id);
            assert_eq!(order.status, OrderStatus::Preparing);
        }
        other => panic!("expected OrderUpdated, got {other:?}"),
    }
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn refused_transition_publishes_nothing() {
    let Some(pool) = pool().await else { return };
    let floor = floor(&pool).await;
    let app = api::create_router(floor.state.clone());
    let order_id = place_order(app.clone(), &floor).await;

    let mut rx = floor.state.live_orders.subscribe(floor.restaurant_id);
    let (status, body) = put_json(
        app.clone(),
        &format!("/api/orders/{order_id}/status"),
        &floor.token,
        serde_json::json!({ "status": "COMPLETED" }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], ErrorCode::InvalidStatusTransition.code());

    let (status, body) = put_json(
        app,
        &format!("/api/orders/{order_id}/status"),
        &floor.token,
        serde_json::json!({ "status": "CANCELED" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], ErrorCode::CancelReasonRequired.code());

    assert!(rx.try_recv().is_err());
    let stored = orders::get(&pool, floor.restaurant_id, order_id).await.unwrap();
    assert_eq!(stored.status, OrderStatus::Pending);
}

#[tokio::test]
async fn signup_then_login_share_restaurant() {
    let Some(pool) = pool().await else { return };
    let url = std::env::var("DATABASE_URL").unwrap();
    let state = AppState::with_pool(&Config::for_database(url), pool.clone()).unwrap();
    let app = api::create_router(state);

    let email = format!("signup-{}@test.example", snowflake_id());
    let (status, signup) = post_json(
        app.clone(),
        "/api/auth/signup",
        serde_json::json!({
            "email": email,
            "password": "correct horse battery",
            "name": "Ana",
            "restaurant_name": "Casa Ana",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let restaurant_id = signup["session"]["restaurant_id"].as_i64().unwrap();

    let stored = dine_cloud::db::restaurants::get(&pool, restaurant_id).await.unwrap();
    assert_eq!(stored.name, "Casa Ana");

    let (status, login) = post_json(
        app.clone(),
        "/api/auth/login",
        serde_json::json!({ "email": email.to_uppercase(), "password": "correct horse battery" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(login["session"]["restaurant_id"], restaurant_id);

    let (status, _) = post_json(
        app.clone(),
        "/api/auth/login",
        serde_json::json!({ "email": email, "password": "wrong password" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = post_json(
        app,
        "/api/auth/signup",
        serde_json::json!({
            "email": email,
            "password": "another password",
            "name": "Ana",
            "restaurant_name": "Second",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], ErrorCode::EmailAlreadyRegistered.code());
}

#[tokio::test]
async fn publishing_replaces_previous_menu() {
    let Some(pool) = pool().await else { return };
    let rid = restaurant(&pool).await;

    let create = |name: &str| MenuCreate {
        name: name.into(),
        layout: None,
    };
    let a = menus::create(&pool, rid, &create("Lunch")).await.unwrap();
    let b = menus::create(&pool, rid, &create("Dinner")).await.unwrap();

    menus::publish(&pool, rid, a.id).await.unwrap();
    let published = menus::publish(&pool, rid, b.id).await.unwrap();
    assert!(published.published);

    assert!(!menus::get(&pool, rid, a.id).await.unwrap().published);
    assert_eq!(menus::published(&pool, rid).await.unwrap().menu_id, b.id);

    menus::unpublish(&pool, rid, b.id).await.unwrap();
    assert_eq!(
        code(menus::published(&pool, rid).await),
        ErrorCode::NoPublishedMenu
    );
}

#[tokio::test]
async fn concurrent_publishes_leave_one_published() {
    let Some(pool) = pool().await else { return };
    let rid = restaurant(&pool).await;

    let mut ids = Vec::new();
    for name in ["Breakfast", "Lunch", "Dinner"] {
        let menu = menus::create(
            &pool,
            rid,
            &MenuCreate {
                name: name.into(),
                layout: None,
            },
        )
        .await
        .unwrap();
        ids.push(menu.id);
    }

    let (r1, r2, r3) = tokio::join!(
        menus::publish(&pool, rid, ids[0]),
        menus::publish(&pool, rid, ids[1]),
        menus::publish(&pool, rid, ids[2]),
    );
    for result in [r1, r2, r3] {
        if let Err(e) = result {
            assert_eq!(AppError::from(e).code, ErrorCode::MenuPublishConflict);
        }
    }

    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM menus WHERE restaurant_id = $1 AND published")
            .bind(rid)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn paid_order_items_cannot_change() {
    let Some(pool) = pool().await else { return };
    let rid = restaurant(&pool).await;

    let cat = categories::create(&pool, rid, &category("Mains")).await.unwrap();
    let burger = items::create(&pool, rid, &item(cat.id, "Burger", 1250)).await.unwrap();
    let fries = items::create(&pool, rid, &item(cat.id, "Fries", 400)).await.unwrap();
    let table = tables::create(
        &pool,
        rid,
        &DiningTableCreate {
            name: "T1".into(),
            capacity: None,
        },
    )
    .await
    .unwrap();

    let lines = [OrderItemInput {
        menu_item_id: burger.id,
        quantity: 2,
        note: None,
    }];
    let order = orders::create(
        &pool,
        &NewOrder {
            restaurant_id: rid,
            table_id: table.id,
            items: &lines,
            note: None,
            source: OrderSource::Staff,
        },
    )
    .await
    .unwrap();
    assert_eq!(order.total, Decimal::new(2500, 2));

    let paid = orders::mark_paid(&pool, rid, order.id).await.unwrap();
    assert!(paid.paid && paid.is_locked);

    let edit = [OrderItemInput {
        menu_item_id: fries.id,
        quantity: 1,
        note: None,
    }];
    assert_eq!(
        code(orders::replace_items(&pool, rid, order.id, &edit).await),
        ErrorCode::OrderLocked
    );

    let after = orders::get(&pool, rid, order.id).await.unwrap();
    assert_eq!(after.items.len(), 1);
    assert_eq!(after.items[0].menu_item_id, Some(burger.id));
    assert_eq!(after.items[0].quantity, 2);
    assert_eq!(after.total, Decimal::new(2500, 2));
}

#[tokio::test]
async fn category_delete_requires_empty_category() {
    let Some(pool) = pool().await else { return };
    let rid = restaurant(&pool).await;

    let drinks = categories::create(&pool, rid, &category("Drinks")).await.unwrap();
    items::create(&pool, rid, &item(drinks.id, "Water", 150)).await.unwrap();
    assert_eq!(
        code(categories::delete(&pool, rid, drinks.id).await),
        ErrorCode::CategoryHasItems
    );

    let desserts = categories::create(&pool, rid, &category("Desserts")).await.unwrap();
    categories::delete(&pool, rid, desserts.id).await.unwrap();
    assert!(!categories::exists(&pool, rid, desserts.id).await.unwrap());
}

#[tokio::test]
async fn duplicate_category_name_conflicts() {
    let Some(pool) = pool().await else { return };
    let rid = restaurant(&pool).await;

    categories::create(&pool, rid, &category("Starters")).await.unwrap();
    let err = AppError::from(
        categories::create(&pool, rid, &category("Starters"))
            .await
            .unwrap_err(),
    );
    assert_eq!(err.code, ErrorCode::CategoryNameExists);
    assert_eq!(err.http_status(), StatusCode::CONFLICT);

    // Same name in another restaurant is fine
    let other = restaurant(&pool).await;
    categories::create(&pool, other, &category("Starters")).await.unwrap();
}
