use serde::Deserialize;

#[derive(Deserialize, Debug, Clone)]
pub struct RegistryConfig {
    pub database_url: String,
    pub redis_url: String,
}

impl RegistryConfig {
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        Self {
            database_url: std::env::var("DATABASE_URL")
                .expect("DATABASE_URL environment variable must be set"),
            redis_url: std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1/".to_string()),
        }
    }
}
