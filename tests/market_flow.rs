use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::{Duration, Utc};
use marketplace_api::{
    chat::ChatHub,
    db::{DbPool, create_orm_conn, create_pool, run_migrations},
    dto::chat::SendMessageRequest,
    email::Mailer,
    middleware::auth::AuthUser,
    models::MarketRole,
    routes::{create_api_router, params::{Pagination, ProductQuery}},
    search::LiveSearch,
    services::{catalog_service, chat_service, role_service},
    state::AppState,
    tier::{FeatureTier, Tier},
};
use tokio::sync::OnceCell;
use tower::ServiceExt;
use uuid::Uuid;

// Catalog search, tier gating and chat against a live database. Tests share
// one database and isolate themselves through per-test vendors and users.

static STATE: OnceCell<Option<AppState>> = OnceCell::const_new();

async fn setup_state() -> Option<AppState> {
    STATE
        .get_or_init(|| async {
            let database_url = match std::env::var("TEST_DATABASE_URL")
                .or_else(|_| std::env::var("DATABASE_URL"))
            {
                Ok(url) => url,
                Err(_) => {
                    eprintln!(
                        "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
                    );
                    return None;
                }
            };

            let orm = create_orm_conn(&database_url).await.expect("orm connection");
            run_migrations(&orm).await.expect("migrations");
            let pool = create_pool(&database_url).await.expect("pool");

            Some(AppState {
                pool,
                orm,
                hub: ChatHub::new(),
                mailer: Mailer::disabled(),
                chat_notify_email: None,
            })
        })
        .await
        .clone()
}

fn unique(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4())
}

async fn create_user(pool: &DbPool, role: MarketRole) -> anyhow::Result<AuthUser> {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO users (id, email, password_hash, role) VALUES ($1, $2, 'dummy', $3)")
        .bind(id)
        .bind(unique("user") + "@example.com")
        .bind(role.as_str())
        .execute(pool)
        .await?;
    Ok(AuthUser { user_id: id, role })
}

struct Fixture {
    vendor_id: Uuid,
    category_id: Uuid,
}

/// One vendor and category per test so result sets are deterministic on a
/// shared database.
async fn seed_catalog(pool: &DbPool) -> anyhow::Result<Fixture> {
    let vendor_id = Uuid::new_v4();
    sqlx::query("INSERT INTO vendors (id, name) VALUES ($1, $2)")
        .bind(vendor_id)
        .bind(unique("Vendor"))
        .execute(pool)
        .await?;

    let category_id = Uuid::new_v4();
    sqlx::query("INSERT INTO categories (id, name) VALUES ($1, $2)")
        .bind(category_id)
        .bind(unique("Category"))
        .execute(pool)
        .await?;

    Ok(Fixture {
        vendor_id,
        category_id,
    })
}

async fn seed_product(
    pool: &DbPool,
    fixture: &Fixture,
    name: &str,
    description: &str,
    price: i64,
    stock: i32,
    age_minutes: i64,
) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO products (id, vendor_id, category_id, name, description, price, stock, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(id)
    .bind(fixture.vendor_id)
    .bind(fixture.category_id)
    .bind(unique(name))
    .bind(description)
    .bind(price)
    .bind(stock)
    .bind(Utc::now() - Duration::minutes(age_minutes))
    .execute(pool)
    .await?;
    Ok(id)
}

fn vendor_query(fixture: &Fixture) -> ProductQuery {
    ProductQuery {
        vendor_id: Some(fixture.vendor_id),
        ..ProductQuery::default()
    }
}

#[tokio::test]
async fn empty_query_returns_everything_newest_first() -> anyhow::Result<()> {
    let Some(state) = setup_state().await else {
        return Ok(());
    };
    let fixture = seed_catalog(&state.pool).await?;
    let oldest = seed_product(&state.pool, &fixture, "Mug", "ceramic", 1000, 5, 30).await?;
    let middle = seed_product(&state.pool, &fixture, "Hoodie", "warm", 2000, 5, 20).await?;
    let newest = seed_product(&state.pool, &fixture, "Sticker", "vinyl", 300, 5, 10).await?;

    let page = catalog_service::search_products(&state.orm, &vendor_query(&fixture)).await?;
    assert_eq!(page.total, 3);
    let ids: Vec<Uuid> = page.items.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![newest, middle, oldest]);

    Ok(())
}

#[tokio::test]
async fn free_text_matches_name_and_description() -> anyhow::Result<()> {
    let Some(state) = setup_state().await else {
        return Ok(());
    };
    let fixture = seed_catalog(&state.pool).await?;
    let by_name = seed_product(&state.pool, &fixture, "Ferris Mug", "ceramic", 1000, 5, 3).await?;
    let by_desc =
        seed_product(&state.pool, &fixture, "Plushie", "a ferris doll", 2000, 5, 2).await?;
    seed_product(&state.pool, &fixture, "Sticker", "vinyl", 300, 5, 1).await?;

    let query = ProductQuery {
        q: Some("FERRIS".to_string()),
        ..vendor_query(&fixture)
    };
    let page = catalog_service::search_products(&state.orm, &query).await?;
    let mut ids: Vec<Uuid> = page.items.iter().map(|p| p.id).collect();
    ids.sort();
    let mut expected = vec![by_name, by_desc];
    expected.sort();
    assert_eq!(ids, expected, "match is case-insensitive over both fields");

    Ok(())
}

#[tokio::test]
async fn filters_compose_with_the_text_predicate() -> anyhow::Result<()> {
    let Some(state) = setup_state().await else {
        return Ok(());
    };
    let fixture = seed_catalog(&state.pool).await?;
    let cheap = seed_product(&state.pool, &fixture, "Mug", "ceramic", 500, 5, 3).await?;
    seed_product(&state.pool, &fixture, "Mug Deluxe", "ceramic", 5000, 5, 2).await?;
    seed_product(&state.pool, &fixture, "Mug Ghost", "ceramic", 700, 0, 1).await?;

    let query = ProductQuery {
        q: Some("mug".to_string()),
        max_price: Some(1000),
        in_stock: Some(true),
        ..vendor_query(&fixture)
    };
    let page = catalog_service::search_products(&state.orm, &query).await?;
    let ids: Vec<Uuid> = page.items.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![cheap]);

    Ok(())
}

#[tokio::test]
async fn live_search_commits_only_the_final_input() -> anyhow::Result<()> {
    let Some(state) = setup_state().await else {
        return Ok(());
    };
    let fixture = seed_catalog(&state.pool).await?;
    let mug = seed_product(&state.pool, &fixture, "Ferris Mug", "ceramic", 1000, 5, 1).await?;
    seed_product(&state.pool, &fixture, "Hoodie", "warm", 2000, 5, 2).await?;

    let live = LiveSearch::spawn(state.orm.clone(), vendor_query(&fixture));
    let mut results = live.results();

    live.input("f");
    live.input("fer");
    live.input("ferris");

    tokio::time::timeout(std::time::Duration::from_secs(5), results.changed()).await??;
    let page = results.borrow_and_update().clone().expect("search page");
    let ids: Vec<Uuid> = page.items.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![mug], "only the final committed query ran");

    Ok(())
}

#[tokio::test]
async fn tier_gate_follows_the_stored_record() -> anyhow::Result<()> {
    let Some(state) = setup_state().await else {
        return Ok(());
    };
    let user = create_user(&state.pool, MarketRole::Buyer).await?;

    // No record yet: no tier, denied everything gated, open still allowed.
    assert_eq!(role_service::current_tier(&state.orm, &user).await?, None);
    let denied = role_service::check_access(&state.orm, &user, FeatureTier::AtLeast(Tier::Basic))
        .await?
        .data
        .unwrap();
    assert!(!denied.granted);
    let open = role_service::check_access(&state.orm, &user, FeatureTier::Open)
        .await?
        .data
        .unwrap();
    assert!(open.granted);

    sqlx::query("INSERT INTO user_roles (user_id, tier) VALUES ($1, 'growth')")
        .bind(user.user_id)
        .execute(&state.pool)
        .await?;

    assert_eq!(
        role_service::current_tier(&state.orm, &user).await?,
        Some(Tier::Growth)
    );
    let basic = role_service::check_access(&state.orm, &user, FeatureTier::AtLeast(Tier::Basic))
        .await?
        .data
        .unwrap();
    assert!(basic.granted);
    let pro = role_service::check_access(&state.orm, &user, FeatureTier::AtLeast(Tier::Pro))
        .await?
        .data
        .unwrap();
    assert!(!pro.granted);

    Ok(())
}

#[tokio::test]
async fn malformed_tier_rows_are_rejected_not_propagated() -> anyhow::Result<()> {
    let Some(state) = setup_state().await else {
        return Ok(());
    };
    let user = create_user(&state.pool, MarketRole::Buyer).await?;

    sqlx::query("INSERT INTO user_roles (user_id, tier) VALUES ($1, 'platinum')")
        .bind(user.user_id)
        .execute(&state.pool)
        .await?;

    let result = role_service::current_tier(&state.orm, &user).await;
    assert!(matches!(
        result,
        Err(marketplace_api::error::AppError::Decode(_))
    ));

    Ok(())
}

#[tokio::test]
async fn protected_routes_reject_missing_and_invalid_tokens() -> anyhow::Result<()> {
    let Some(state) = setup_state().await else {
        return Ok(());
    };
    let app = create_api_router().with_state(state);

    let missing = app
        .clone()
        .oneshot(Request::builder().uri("/cart").body(Body::empty())?)
        .await?;
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    let wrong_scheme = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/cart")
                .header(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(wrong_scheme.status(), StatusCode::UNAUTHORIZED);

    // set_var is unsafe in edition 2024; nothing else in this binary reads it.
    unsafe { std::env::set_var("JWT_SECRET", "integration-test-secret") };
    let garbage = app
        .oneshot(
            Request::builder()
                .uri("/cart")
                .header(header::AUTHORIZATION, "Bearer not-a-jwt")
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(garbage.status(), StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn chat_message_persists_and_invalidates_the_room() -> anyhow::Result<()> {
    let Some(state) = setup_state().await else {
        return Ok(());
    };
    let user = create_user(&state.pool, MarketRole::Buyer).await?;
    let room_id = Uuid::new_v4();

    let mut subscription = state.hub.subscribe(room_id);

    chat_service::send_message(
        &state,
        &user,
        room_id,
        SendMessageRequest {
            body: "hello there".to_string(),
        },
    )
    .await?;

    let event = tokio::time::timeout(std::time::Duration::from_secs(5), subscription.recv())
        .await?
        .expect("invalidation event");
    assert_eq!(event.room_id, room_id);

    let history = chat_service::list_messages(&state, room_id, Pagination::default()).await?;
    let items = history.data.unwrap().items;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].body, "hello there");
    assert_eq!(items[0].sender_id, user.user_id);

    let empty = chat_service::send_message(
        &state,
        &user,
        room_id,
        SendMessageRequest {
            body: "   ".to_string(),
        },
    )
    .await;
    assert!(empty.is_err());

    Ok(())
}
