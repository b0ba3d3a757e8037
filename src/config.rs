use std::env;

use secrecy::SecretString;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub db_max_connections: u32,
    pub jwt_secret: SecretString,
    pub jwt_ttl_hours: i64,
    pub offer_default_ttl_hours: i64,
    pub abandoned_cart_idle_minutes: i64,
    pub low_stock_threshold: i32,
    pub http_timeout_secs: u64,
    pub cors_allow_origin: Option<String>,
    pub gemini: GeminiConfig,
    pub courier: CourierConfig,
}

/// LLM settings for the shopping assistant. Without an API key the assistant
/// answers from templates only.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Option<SecretString>,
    pub model: String,
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct CourierConfig {
    pub api_token: Option<SecretString>,
    pub base_url: String,
}

/// Longest idle window an abandoned-cart query may ask for (one year).
pub const MAX_IDLE_MINUTES: i64 = 60 * 24 * 365;
const MAX_JWT_TTL_HOURS: i64 = 24 * 365;

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET is not set"))?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env_parse("APP_PORT", 3000);

        Ok(Self {
            port,
            database_url,
            host,
            db_max_connections: env_parse("DB_MAX_CONNECTIONS", 10),
            jwt_secret: SecretString::from(jwt_secret),
            jwt_ttl_hours: env_parse("JWT_TTL_HOURS", 24).clamp(1, MAX_JWT_TTL_HOURS),
            offer_default_ttl_hours: env_parse("OFFER_DEFAULT_TTL_HOURS", 72),
            abandoned_cart_idle_minutes: env_parse("ABANDONED_CART_IDLE_MINUTES", 60)
                .clamp(0, MAX_IDLE_MINUTES),
            low_stock_threshold: env_parse("LOW_STOCK_THRESHOLD", 5),
            http_timeout_secs: env_parse("HTTP_TIMEOUT_SECS", 15),
            cors_allow_origin: env_non_empty("CORS_ALLOW_ORIGIN"),
            gemini: GeminiConfig {
                api_key: env_non_empty("GEMINI_API_KEY").map(SecretString::from),
                model: env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-1.5-flash".to_string()),
                base_url: env::var("GEMINI_BASE_URL")
                    .unwrap_or_else(|_| "https://generativelanguage.googleapis.com".to_string()),
            },
            courier: CourierConfig {
                api_token: env_non_empty("COURIER_API_TOKEN").map(SecretString::from),
                base_url: env::var("COURIER_BASE_URL")
                    .unwrap_or_else(|_| "https://track.delhivery.com".to_string()),
            },
        })
    }

    /// Configuration for tests and tools that never reach the network.
    pub fn for_tests(database_url: &str, jwt_secret: &str) -> Self {
        Self {
            database_url: database_url.to_string(),
            host: "127.0.0.1".to_string(),
            port: 0,
            db_max_connections: 5,
            jwt_secret: SecretString::from(jwt_secret.to_string()),
            jwt_ttl_hours: 24,
            offer_default_ttl_hours: 72,
            abandoned_cart_idle_minutes: 60,
            low_stock_threshold: 5,
            http_timeout_secs: 5,
            cors_allow_origin: None,
            gemini: GeminiConfig {
                api_key: None,
                model: "gemini-1.5-flash".to_string(),
                base_url: "http://127.0.0.1:9".to_string(),
            },
            courier: CourierConfig {
                api_token: None,
                base_url: "http://127.0.0.1:9".to_string(),
            },
        }
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_parse_falls_back_on_garbage() {
        // SAFETY: no other test reads or writes this key.
        unsafe { env::set_var("STOREFRONT_TEST_PORT", "not-a-number") };
        assert_eq!(env_parse::<u16>("STOREFRONT_TEST_PORT", 3000), 3000);
        unsafe { env::set_var("STOREFRONT_TEST_PORT", " 8080 ") };
        assert_eq!(env_parse::<u16>("STOREFRONT_TEST_PORT", 3000), 8080);
        unsafe { env::remove_var("STOREFRONT_TEST_PORT") };
    }

    #[test]
    fn blank_values_count_as_unset() {
        unsafe { env::set_var("STOREFRONT_TEST_KEY", "   ") };
        assert!(env_non_empty("STOREFRONT_TEST_KEY").is_none());
        unsafe { env::remove_var("STOREFRONT_TEST_KEY") };
    }
}
