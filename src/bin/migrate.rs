use storefront_api::{
    config::AppConfig,
    db::{create_pool, orm_from_pool, run_migrations},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;
    let pool = create_pool(&config.database_url, 1).await?;
    run_migrations(&orm_from_pool(pool)).await?;
    println!("Migrations applied");
    Ok(())
}
