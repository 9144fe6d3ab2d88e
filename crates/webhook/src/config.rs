use serde::Deserialize;

#[derive(Deserialize, Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub redis_url: String,

    pub gateway_base_url: String,
    pub gateway_api_key: String,
    pub gateway_http_timeout_seconds: u64,

    pub idempotency_ttl_seconds: u64,

    pub queue_depth_unhealthy: i64,
    pub queue_depth_degraded: i64,

    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        Self {
            database_url: std::env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            redis_url: std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1/".to_string()),

            gateway_base_url: std::env::var("GATEWAY_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            gateway_api_key: std::env::var("GATEWAY_API_KEY").expect("GATEWAY_API_KEY must be set"),
            gateway_http_timeout_seconds: env_parse("GATEWAY_HTTP_TIMEOUT_SECONDS", 15),

            idempotency_ttl_seconds: env_parse("WA_IDEMPOTENCY_TTL_SECONDS", 86_400),

            queue_depth_unhealthy: env_parse("WA_QUEUE_DEPTH_UNHEALTHY", 1000),
            queue_depth_degraded: env_parse("WA_QUEUE_DEPTH_DEGRADED", 100),

            host: std::env::var("WEBHOOK_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env_parse("WEBHOOK_PORT", 8000),
        }
    }

    pub fn listen_address(&self) -> std::net::SocketAddr {
        format!("{}:{}", self.host, self.port)
            .parse()
            .expect("invalid host or port")
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listen_address_parses_host_and_port() {
        let config = AppConfig {
            database_url: "postgres://x".to_string(),
            redis_url: "redis://x".to_string(),
            gateway_base_url: "http://x".to_string(),
            gateway_api_key: "key".to_string(),
            gateway_http_timeout_seconds: 15,
            idempotency_ttl_seconds: 86_400,
            queue_depth_unhealthy: 1000,
            queue_depth_degraded: 100,
            host: "127.0.0.1".to_string(),
            port: 8000,
        };
        assert_eq!(config.listen_address().to_string(), "127.0.0.1:8000");
    }
}
