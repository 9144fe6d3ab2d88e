use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, info, warn};
use uuid::Uuid;

use common::backoff::compute_backoff_delay;
use common::OutboundMessage;
use gateway_client::GatewayClient;
use queue::{Delivered, RedisQueue, UnparseableEntry, RateLimiter};

use crate::config::WorkerConfig;

/// Drives the delivery loop for exactly one instance. Multiple workers
/// may run against the same instance concurrently — they share the
/// `wa_workers` consumer group, so Redis arbitrates who gets which entry.
pub struct InstanceWorker {
    instance: String,
    consumer: String,
    queue: RedisQueue,
    rate_limiter: RateLimiter,
    gateway: Arc<GatewayClient>,
    config: WorkerConfig,
}

impl InstanceWorker {
    pub fn new(
        instance: String,
        queue: RedisQueue,
        rate_limiter: RateLimiter,
        gateway: Arc<GatewayClient>,
        config: WorkerConfig,
    ) -> Self {
        let consumer = format!("worker-{}", Uuid::new_v4());
        Self {
            instance,
            consumer,
            queue,
            rate_limiter,
            gateway,
            config,
        }
    }

    /// Runs until `shutdown` is flipped to `true`. Never returns an
    /// `Err` — every failure mode within a single iteration is logged and
    /// swallowed so the process stays alive.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
        if let Err(err) = self.queue.ensure_group(&self.instance).await {
            error!(instance = %self.instance, error = %err, "failed to ensure consumer group, retrying shortly");
        }
        if let Err(err) = self.queue.register_as_consumer(&self.instance, &self.consumer).await {
            warn!(instance = %self.instance, error = %err, "failed to register as consumer");
        }

        let mut claim_cursor = "0".to_string();

        loop {
            if *shutdown.borrow() {
                info!(instance = %self.instance, "shutdown signalled, stopping worker loop");
                return;
            }

            match self.run_one_iteration(&mut claim_cursor, &mut shutdown).await {
                Ok(()) => {}
                Err(err) => {
                    error!(instance = %self.instance, error = %err, "worker iteration failed, sleeping briefly");
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            }
        }
    }

    async fn run_one_iteration(
        &mut self,
        claim_cursor: &mut String,
        shutdown: &mut watch::Receiver<bool>,
    ) -> anyhow::Result<()> {
        let (claimed, next_cursor) = self
            .queue
            .claim_orphans(&self.instance, &self.consumer, self.config.claim_idle_ms, claim_cursor)
            .await?;
        *claim_cursor = next_cursor;

        let entries = if !claimed.is_empty() {
            claimed
        } else {
            tokio::select! {
                result = self.queue.read_new(&self.instance, &self.consumer, self.config.read_count, self.config.read_block_ms) => result?,
                _ = shutdown.changed() => return Ok(()),
            }
        };

        for entry in entries {
            self.deliver_one(entry).await?;
        }

        Ok(())
    }

    async fn deliver_one(&mut self, entry: Delivered) -> anyhow::Result<()> {
        let (entry_id, message) = match entry {
            Delivered::Parsed(e) => (e.entry_id, e.message),
            Delivered::Unparseable(UnparseableEntry { entry_id, raw }) => {
                warn!(instance = %self.instance, entry_id, "dropping unparseable queue entry");
                let envelope = serde_json::json!({
                    "raw_payload": raw,
                    "final_error": "parse_error",
                    "dead_lettered_at": chrono::Utc::now(),
                });
                let payload = serde_json::to_vec(&envelope)?;
                self.queue.move_to_dlq(&self.instance, &payload).await?;
                self.queue.ack_and_delete(&self.instance, &entry_id).await?;
                return Ok(());
            }
        };

        self.rate_limiter.wait_for_token(&self.instance).await;

        let connection_open = self.gateway.instance_connection_state(&self.instance).await.is_open();

        let sent = connection_open && self.gateway.send_text(&self.instance, &message.to, &message.text).await;

        if sent {
            self.queue.ack_and_delete(&self.instance, &entry_id).await?;
        } else {
            self.retry(&entry_id, message).await?;
        }

        Ok(())
    }

    async fn retry(&mut self, entry_id: &str, message: OutboundMessage) -> anyhow::Result<()> {
        let new_attempts = message.attempts + 1;

        if new_attempts >= self.config.max_deliveries {
            let dead_letter = common::DeadLetterEntry {
                message: message.clone(),
                final_error: "max_deliveries_exceeded".to_string(),
                dead_lettered_at: chrono::Utc::now(),
            };
            let payload = serde_json::to_vec(&dead_letter)?;
            self.queue.move_to_dlq(&self.instance, &payload).await?;
            self.queue.ack_and_delete(&self.instance, entry_id).await?;
            warn!(instance = %self.instance, message_id = %message.message_id, "message dead-lettered");
            return Ok(());
        }

        self.queue.ack_and_delete(&self.instance, entry_id).await?;

        let delay = compute_backoff_delay(
            new_attempts.saturating_sub(1),
            self.config.base_backoff_seconds,
            self.config.max_backoff_seconds,
        );
        tokio::time::sleep(delay).await;

        let mut retried = message;
        retried.attempts = new_attempts;
        self.queue.enqueue(&self.instance, &retried).await?;
        Ok(())
    }
}
