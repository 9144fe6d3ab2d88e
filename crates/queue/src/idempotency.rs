use redis::aio::ConnectionManager;

use crate::errors::QueueResult;

/// Set-if-absent with expiration, backing both webhook-ingress and
/// enqueue-path deduplication.
pub struct IdempotencyStore {
    conn: ConnectionManager,
}

impl IdempotencyStore {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    /// Returns `true` iff this caller is the first to claim `logical_id`
    /// within `ttl_seconds`.
    pub async fn claim(&mut self, logical_id: &str, ttl_seconds: u64) -> QueueResult<bool> {
        let claimed: bool = redis::cmd("SET")
            .arg(logical_id)
            .arg(1)
            .arg("NX")
            .arg("EX")
            .arg(ttl_seconds)
            .query_async::<Option<String>>(&mut self.conn)
            .await
            .map(|reply| reply.is_some())?;
        Ok(claimed)
    }
}

#[cfg(test)]
mod tests {
    // Exercising `claim` requires a live Redis instance; covered by the
    // integration suite rather than here.
}
