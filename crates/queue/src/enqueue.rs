use common::keys;
use common::OutboundMessage;

use crate::idempotency::IdempotencyStore;
use crate::stream::RedisQueue;
use crate::QueueResult;

/// Outcome of a caller-facing enqueue attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// First submission of this `message_id`; the stream entry id.
    Enqueued { entry_id: String },
    /// A prior submission already claimed this `message_id` within the
    /// idempotency window. Nothing was appended.
    Duplicate,
}

/// The caller-facing egress entry point: claims the `message_id` via the
/// idempotency store before ever touching the stream, so repeated
/// submissions of the same logical send do not multiply in the queue.
pub async fn enqueue_with_idempotency(
    queue: &mut RedisQueue,
    idempotency: &mut IdempotencyStore,
    message: &OutboundMessage,
    idempotency_ttl_seconds: u64,
) -> QueueResult<EnqueueOutcome> {
    let claimed = idempotency
        .claim(&idempotency_key(message), idempotency_ttl_seconds)
        .await?;

    if !claimed {
        return Ok(EnqueueOutcome::Duplicate);
    }

    let entry_id = queue.enqueue(&message.instance, message).await?;
    Ok(EnqueueOutcome::Enqueued { entry_id })
}

fn idempotency_key(message: &OutboundMessage) -> String {
    keys::enqueue_idempotency(&message.message_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_the_documented_idempotency_key() {
        let message = OutboundMessage::new("m1", "inst-a", "+15551230000", "hi");
        assert_eq!(idempotency_key(&message), "wa:msg:m1");
    }
}
