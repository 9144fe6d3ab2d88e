use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct ReconcilerConfig {
    pub database_url: String,
    pub redis_url: String,

    pub gateway_base_url: String,
    pub gateway_api_key: String,
    pub gateway_http_timeout_seconds: u64,

    pub health_check_interval_seconds: u64,
    pub orphan_reap_interval_seconds: u64,
}

impl ReconcilerConfig {
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        Self {
            database_url: std::env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            redis_url: std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1/".to_string()),

            gateway_base_url: std::env::var("GATEWAY_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            gateway_api_key: std::env::var("GATEWAY_API_KEY").expect("GATEWAY_API_KEY must be set"),
            gateway_http_timeout_seconds: env_parse("GATEWAY_HTTP_TIMEOUT_SECONDS", 15),

            health_check_interval_seconds: env_parse("WA_HEALTH_CHECK_INTERVAL_SECONDS", 300),
            orphan_reap_interval_seconds: env_parse("WA_ORPHAN_REAP_INTERVAL_SECONDS", 3600),
        }
    }

    pub fn gateway_config(&self) -> gateway_client::GatewayConfig {
        gateway_client::GatewayConfig {
            base_url: self.gateway_base_url.clone(),
            api_key: self.gateway_api_key.clone(),
            http_timeout_seconds: self.gateway_http_timeout_seconds,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
