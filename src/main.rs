use std::net::SocketAddr;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storefront_api::{
    app::build_app,
    config::AppConfig,
    db::{create_pool, run_migrations},
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,storefront_api=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    let pool = create_pool(&config.database_url, config.db_max_connections).await?;
    let addr = SocketAddr::from((config.host.parse::<std::net::IpAddr>()?, config.port));

    let state = AppState::new(pool, config)?;
    run_migrations(&state.orm).await?;
    tracing::info!(
        llm = state.llm.is_some(),
        courier = state.courier.is_some(),
        "integrations configured"
    );

    let app = build_app(state);
    tracing::info!("listening on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;

    Ok(())
}
