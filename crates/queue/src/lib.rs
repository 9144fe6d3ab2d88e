pub mod enqueue;
pub mod errors;
pub mod idempotency;
pub mod rate_limiter;
pub mod stream;

pub use enqueue::{enqueue_with_idempotency, EnqueueOutcome};
pub use errors::{QueueError, QueueResult};
pub use idempotency::IdempotencyStore;
pub use rate_limiter::RateLimiter;
pub use stream::{Delivered, QueueEntry, RedisQueue, UnparseableEntry};
