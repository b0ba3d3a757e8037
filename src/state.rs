use std::sync::Arc;

use crate::{
    config::AppConfig,
    db::{DbPool, OrmConn},
    integrations::{courier::CourierClient, gemini::GeminiClient},
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub config: Arc<AppConfig>,
    pub courier: Option<CourierClient>,
    pub llm: Option<GeminiClient>,
}

impl AppState {
    /// Build state from a pool, constructing the optional integration clients
    /// from whatever credentials the configuration carries.
    pub fn new(pool: DbPool, config: AppConfig) -> anyhow::Result<Self> {
        let courier = match &config.courier.api_token {
            Some(token) => Some(CourierClient::with_base_url(
                token.clone(),
                &config.courier.base_url,
                config.http_timeout_secs,
            )?),
            None => None,
        };
        let llm = match &config.gemini.api_key {
            Some(key) => Some(GeminiClient::with_base_url(
                key.clone(),
                &config.gemini.model,
                &config.gemini.base_url,
                config.http_timeout_secs,
            )?),
            None => None,
        };

        Ok(Self {
            orm: crate::db::orm_from_pool(pool.clone()),
            pool,
            config: Arc::new(config),
            courier,
            llm,
        })
    }
}
