use serde_json::json;
use storefront_api::{
    config::AppConfig,
    db::{create_pool, orm_from_pool, run_migrations},
    models::Appearance,
    services::auth_service::hash_password,
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url, 2).await?;
    // Ensure migrations are applied.
    run_migrations(&orm_from_pool(pool.clone())).await?;

    let admin_id = ensure_user(&pool, "admin@example.com", "admin12345", "admin").await?;
    let merchant_id = ensure_user(&pool, "merchant@example.com", "merchant123", "merchant").await?;
    let customer_id = ensure_user(&pool, "customer@example.com", "customer123", "customer").await?;
    let store_id = ensure_store(&pool, merchant_id).await?;
    seed_products(&pool, store_id).await?;
    seed_coupon(&pool, store_id).await?;

    println!(
        "Seed completed. Admin ID: {admin_id}, Merchant ID: {merchant_id}, Customer ID: {customer_id}, Store ID: {store_id}"
    );
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let password_hash = hash_password(password).map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let (id,): (Uuid,) = sqlx::query_as(
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
    Ok(id)
}

async fn ensure_store(pool: &sqlx::PgPool, owner_id: Uuid) -> anyhow::Result<Uuid> {
    let (store_id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO stores (id, owner_id, name, slug, description, support_email, currency)
        VALUES ($1, $2, 'Ferris Threads', 'ferris-threads', 'Apparel for Rustaceans', 'help@ferris-threads.test', 'INR')
        ON CONFLICT (slug) DO UPDATE SET owner_id = EXCLUDED.owner_id
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(owner_id)
    .fetch_one(pool)
    .await?;

    let menus = json!([
        { "label": "Shop", "href": "/products", "children": [
            { "label": "Hoodies", "href": "/products?category=hoodies" },
            { "label": "Mugs", "href": "/products?category=mugs" }
        ]},
        { "label": "Clearance", "href": "/clearance", "children": [] }
    ]);
    let slides = json!([
        { "image_url": "https://cdn.example.com/banners/winter.jpg", "title": "Winter drop",
          "subtitle": "Hoodies from 1,499", "link_url": "/products?category=hoodies", "is_active": true }
    ]);
    sqlx::query(
        r#"
        INSERT INTO store_settings (store_id, navbar_menus, carousel_slides, appearance)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (store_id) DO NOTHING
        "#,
    )
    .bind(store_id)
    .bind(menus)
    .bind(slides)
    .bind(serde_json::to_value(Appearance::default())?)
    .execute(pool)
    .await?;

    println!("Ensured store ferris-threads");
    Ok(store_id)
}

async fn seed_products(pool: &sqlx::PgPool, store_id: Uuid) -> anyhow::Result<()> {
    let products: Vec<(&str, &str, &str, i64, Option<i64>, i32)> = vec![
        ("Axum Hoodie", "Warm cotton hoodie for Rustaceans", "hoodies", 1499, Some(2499), 50),
        ("Borrow Checker Hoodie", "Heavyweight fleece hoodie", "hoodies", 1899, None, 3),
        ("Ferris Mug", "Coffee tastes better with Ferris", "mugs", 399, Some(499), 100),
        ("Rust Sticker Pack", "Decorate your laptop", "stickers", 149, Some(299), 200),
        ("Async Tote Bag", "Carries futures and groceries", "bags", 599, None, 25),
    ];

    for (name, desc, category, price, compare_at, stock) in products {
        sqlx::query(
            r#"
            INSERT INTO products (id, store_id, name, description, category, price, compare_at_price, stock)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (store_id, name) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(store_id)
        .bind(name)
        .bind(desc)
        .bind(category)
        .bind(price)
        .bind(compare_at)
        .bind(stock)
        .execute(pool)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}

async fn seed_coupon(pool: &sqlx::PgPool, store_id: Uuid) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO coupons (id, store_id, code, discount_type, discount_value, min_order_amount, max_uses)
        VALUES ($1, $2, 'WELCOME10', 'percent', 10, 500, 100)
        ON CONFLICT (store_id, code) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(store_id)
    .execute(pool)
    .await?;

    println!("Seeded coupon WELCOME10");
    Ok(())
}
