use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use marketplace_api::{
    config::AppConfig,
    db::{create_orm_conn, create_pool, run_migrations},
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm).await?;

    let admin_id = ensure_user(&pool, "admin@example.com", "admin123", "admin").await?;
    let vendor_user = ensure_user(&pool, "vendor@example.com", "vendor123", "vendor").await?;
    let buyer_id = ensure_user(&pool, "buyer@example.com", "buyer123", "buyer").await?;

    ensure_tier(&pool, vendor_user, "pro").await?;
    ensure_tier(&pool, buyer_id, "basic").await?;

    let category_id = ensure_category(&pool, "Merch").await?;
    let vendor_id = ensure_vendor(&pool, "Crab Supply Co", "sales@crabsupply.example").await?;
    seed_products(&pool, vendor_id, category_id).await?;

    println!("Seed completed. Admin ID: {admin_id}, Vendor user ID: {vendor_user}");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let row: (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, password_hash, role)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .fetch_one(pool)
    .await?;

    println!("Ensured user {email} (role={role})");
    Ok(row.0)
}

async fn ensure_tier(pool: &sqlx::PgPool, user_id: Uuid, tier: &str) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO user_roles (user_id, tier)
        VALUES ($1, $2)
        ON CONFLICT (user_id) DO UPDATE SET tier = EXCLUDED.tier
        "#,
    )
    .bind(user_id)
    .bind(tier)
    .execute(pool)
    .await?;
    Ok(())
}

async fn ensure_category(pool: &sqlx::PgPool, name: &str) -> anyhow::Result<Uuid> {
    let row: (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO categories (id, name)
        VALUES ($1, $2)
        ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .fetch_one(pool)
    .await?;
    Ok(row.0)
}

async fn ensure_vendor(pool: &sqlx::PgPool, name: &str, email: &str) -> anyhow::Result<Uuid> {
    let row: (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO vendors (id, name, contact_email)
        VALUES ($1, $2, $3)
        ON CONFLICT (name) DO UPDATE SET contact_email = EXCLUDED.contact_email
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(email)
    .fetch_one(pool)
    .await?;
    Ok(row.0)
}

async fn seed_products(
    pool: &sqlx::PgPool,
    vendor_id: Uuid,
    category_id: Uuid,
) -> anyhow::Result<()> {
    let products = vec![
        ("Axum Hoodie", "Warm hoodie for Rustaceans", 550000, 50),
        ("Ferris Mug", "Coffee tastes better with Ferris", 120000, 100),
        ("Rust Sticker Pack", "Decorate your laptop", 50000, 200),
        ("E-book: Async Rust", "Learn async Rust patterns", 250000, 0),
    ];

    for (name, desc, price, stock) in products {
        sqlx::query(
            r#"
            INSERT INTO products (id, vendor_id, category_id, name, description, price, stock)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(vendor_id)
        .bind(category_id)
        .bind(name)
        .bind(desc)
        .bind(price)
        .bind(stock)
        .execute(pool)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}
