use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct WorkerConfig {
    pub database_url: String,
    pub redis_url: String,

    pub gateway_base_url: String,
    pub gateway_api_key: String,
    pub gateway_http_timeout_seconds: u64,

    pub tokens_per_second: f64,
    pub bucket_capacity: f64,
    pub max_deliveries: u32,
    pub base_backoff_seconds: f64,
    pub max_backoff_seconds: f64,
    pub claim_idle_ms: u64,
    pub stream_max_len: usize,
    pub idempotency_ttl_seconds: u64,

    pub read_count: usize,
    pub read_block_ms: u64,
    pub shutdown_budget_seconds: u64,
}

impl WorkerConfig {
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        Self {
            database_url: std::env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            redis_url: std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1/".to_string()),

            gateway_base_url: std::env::var("GATEWAY_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            gateway_api_key: std::env::var("GATEWAY_API_KEY").expect("GATEWAY_API_KEY must be set"),
            gateway_http_timeout_seconds: env_parse("GATEWAY_HTTP_TIMEOUT_SECONDS", 15),

            tokens_per_second: env_parse("WA_TOKENS_PER_SECOND", 1.0),
            bucket_capacity: env_parse("WA_BUCKET_CAPACITY", 5.0),
            max_deliveries: env_parse("WA_MAX_DELIVERIES", 5),
            base_backoff_seconds: env_parse("WA_BASE_BACKOFF_SECONDS", 2.0),
            max_backoff_seconds: env_parse("WA_MAX_BACKOFF_SECONDS", 60.0),
            claim_idle_ms: env_parse("WA_CLAIM_IDLE_MS", 15_000),
            stream_max_len: env_parse("WA_STREAM_MAX_LEN", 10_000),
            idempotency_ttl_seconds: env_parse("WA_IDEMPOTENCY_TTL_SECONDS", 86_400),

            read_count: env_parse("WA_WORKER_READ_COUNT", 10),
            read_block_ms: env_parse("WA_WORKER_READ_BLOCK_MS", 5_000),
            shutdown_budget_seconds: env_parse("WA_WORKER_SHUTDOWN_BUDGET_SECONDS", 30),
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
