use thiserror::Error;

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("failed to encode queue payload: {0}")]
    Encode(#[from] serde_json::Error),
}

pub type QueueResult<T> = Result<T, QueueError>;
