use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("an enabled WhatsApp registration already exists for organization {organization_id}")]
    AlreadyEnabled { organization_id: uuid::Uuid },

    #[error("no registration found for instance {0}")]
    NotFound(String),
}

pub type RegistryResult<T> = Result<T, RegistryError>;
