use redis::aio::ConnectionManager;
use redis::{ErrorKind, RedisError, Value};
use tracing::{debug, warn};

use common::keys::{self, CONSUMER_GROUP};
use common::OutboundMessage;

use crate::errors::{QueueError, QueueResult};

const FIELD: &str = "payload";

/// One delivery attempt handed to a worker: the stream-assigned entry id
/// plus the decoded message. `entry_id` is opaque and only meaningful to
/// `ack`/`delete`/claim calls against the same stream.
#[derive(Debug, Clone)]
pub struct QueueEntry {
    pub entry_id: String,
    pub message: OutboundMessage,
}

/// Parse failures surface the raw field bytes so the caller can still
/// write something useful to the dead-letter stream.
#[derive(Debug, Clone)]
pub struct UnparseableEntry {
    pub entry_id: String,
    pub raw: String,
}

pub enum Delivered {
    Parsed(QueueEntry),
    Unparseable(UnparseableEntry),
}

/// Append-only per-instance stream with consumer-group pending tracking,
/// backed directly by Redis Streams.
pub struct RedisQueue {
    conn: ConnectionManager,
    stream_max_len: usize,
}

impl RedisQueue {
    pub fn new(conn: ConnectionManager, stream_max_len: usize) -> Self {
        Self { conn, stream_max_len }
    }

    /// Creates the stream and the consumer group if absent. The group's
    /// initial read position is the stream tail: anything already on the
    /// stream before the group existed is picked up via `claim_orphans`
    /// instead, not by `read_new`.
    pub async fn ensure_group(&mut self, instance: &str) -> QueueResult<()> {
        let stream = keys::outbound_stream(instance);
        let result: Result<(), RedisError> = redis::cmd("XGROUP")
            .arg("CREATE")
            .arg(&stream)
            .arg(CONSUMER_GROUP)
            .arg("$")
            .arg("MKSTREAM")
            .query_async(&mut self.conn)
            .await;

        match result {
            Ok(()) => Ok(()),
            Err(e) if is_busygroup(&e) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn enqueue(&mut self, instance: &str, message: &OutboundMessage) -> QueueResult<String> {
        let stream = keys::outbound_stream(instance);
        let payload = message.to_json()?;

        let entry_id: String = redis::cmd("XADD")
            .arg(&stream)
            .arg("MAXLEN")
            .arg("~")
            .arg(self.stream_max_len)
            .arg("*")
            .arg(FIELD)
            .arg(payload)
            .query_async(&mut self.conn)
            .await?;

        debug!(instance, message_id = %message.message_id, "📤 enqueued message {}", entry_id);
        Ok(entry_id)
    }

    /// Registers the caller as a consumer without blocking and without
    /// consuming a real entry. Reads from ID `0` (the consumer's own
    /// pending-entries list) rather than `>` (the "new messages" cursor
    /// `read_new` uses) — a fresh consumer has nothing pending, so this
    /// always returns immediately with no results, but it still causes
    /// Redis to create the consumer, so it shows up in `XINFO CONSUMERS`
    /// before its first real delivery. No `BLOCK` argument is sent: unlike
    /// `COUNT`, `BLOCK 0` means "block forever", not "don't block".
    pub async fn register_as_consumer(&mut self, instance: &str, consumer: &str) -> QueueResult<()> {
        let stream = keys::outbound_stream(instance);
        let _: Value = redis::cmd("XREADGROUP")
            .arg("GROUP")
            .arg(CONSUMER_GROUP)
            .arg(consumer)
            .arg("COUNT")
            .arg(1)
            .arg("STREAMS")
            .arg(&stream)
            .arg("0")
            .query_async(&mut self.conn)
            .await?;
        Ok(())
    }

    pub async fn read_new(
        &mut self,
        instance: &str,
        consumer: &str,
        count: usize,
        block_ms: u64,
    ) -> QueueResult<Vec<Delivered>> {
        let stream = keys::outbound_stream(instance);

        let mut cmd = redis::cmd("XREADGROUP");
        cmd.arg("GROUP")
            .arg(CONSUMER_GROUP)
            .arg(consumer)
            .arg("COUNT")
            .arg(count.max(1))
            .arg("BLOCK")
            .arg(block_ms)
            .arg("STREAMS")
            .arg(&stream)
            .arg(">");

        let reply: Value = cmd.query_async(&mut self.conn).await?;
        parse_stream_reply(reply)
    }

    /// Reassigns entries idle for at least `min_idle_ms` to `consumer`.
    /// Tolerates both the two-tuple (cursor, entries) and three-tuple
    /// (cursor, entries, deleted_ids) XAUTOCLAIM reply shapes.
    pub async fn claim_orphans(
        &mut self,
        instance: &str,
        consumer: &str,
        min_idle_ms: u64,
        cursor: &str,
    ) -> QueueResult<(Vec<Delivered>, String)> {
        let stream = keys::outbound_stream(instance);

        let reply: Value = redis::cmd("XAUTOCLAIM")
            .arg(&stream)
            .arg(CONSUMER_GROUP)
            .arg(consumer)
            .arg(min_idle_ms)
            .arg(cursor)
            .arg("COUNT")
            .arg(50)
            .query_async(&mut self.conn)
            .await?;

        let Value::Array(parts) = reply else {
            return Err(QueueError::Redis(protocol_error("unexpected XAUTOCLAIM reply shape")));
        };

        // Two-tuple: (next_cursor, entries). Three-tuple (Redis >= 7.0)
        // additionally reports ids deleted from the PEL, which this
        // caller doesn't need.
        if parts.len() < 2 {
            return Err(QueueError::Redis(protocol_error("XAUTOCLAIM reply missing fields")));
        }

        let next_cursor = match &parts[0] {
            Value::BulkString(bytes) => String::from_utf8_lossy(bytes).to_string(),
            Value::SimpleString(s) => s.clone(),
            other => return Err(QueueError::Redis(protocol_error(&format!("unexpected cursor value: {other:?}")))),
        };

        let entries = parse_entries(parts[1].clone())?;

        Ok((entries, next_cursor))
    }

    pub async fn ack(&mut self, instance: &str, entry_id: &str) -> QueueResult<()> {
        let stream = keys::outbound_stream(instance);
        let _: i64 = redis::cmd("XACK")
            .arg(&stream)
            .arg(CONSUMER_GROUP)
            .arg(entry_id)
            .query_async(&mut self.conn)
            .await?;
        Ok(())
    }

    pub async fn delete(&mut self, instance: &str, entry_id: &str) -> QueueResult<()> {
        let stream = keys::outbound_stream(instance);
        let _: i64 = redis::cmd("XDEL")
            .arg(&stream)
            .arg(entry_id)
            .query_async(&mut self.conn)
            .await?;
        Ok(())
    }

    /// Acks and deletes in one step — the pairing the worker always uses,
    /// both on successful delivery and before a requeue.
    pub async fn ack_and_delete(&mut self, instance: &str, entry_id: &str) -> QueueResult<()> {
        self.ack(instance, entry_id).await?;
        self.delete(instance, entry_id).await
    }

    /// Appends to the sibling dead-letter stream. The live stream and the
    /// dead-letter stream never share an entry: callers must `delete` the
    /// original live entry themselves.
    pub async fn move_to_dlq(&mut self, instance: &str, payload: &[u8]) -> QueueResult<()> {
        let dlq = keys::dead_letter_stream(instance);
        let _: String = redis::cmd("XADD")
            .arg(&dlq)
            .arg("*")
            .arg(FIELD)
            .arg(payload)
            .query_async(&mut self.conn)
            .await?;
        warn!(instance, "💀 entry moved to dead-letter stream");
        Ok(())
    }
}

fn is_busygroup(err: &RedisError) -> bool {
    err.to_string().contains("BUSYGROUP")
}

fn protocol_error(msg: &str) -> RedisError {
    RedisError::from((ErrorKind::TypeError, "unexpected stream reply", msg.to_string()))
}

/// `XREADGROUP`'s top-level reply is `[[stream_name, [[id, [field,
/// value, ...]], ...]], ...]` — one element per requested stream. We
/// always request exactly one stream.
fn parse_stream_reply(reply: Value) -> QueueResult<Vec<Delivered>> {
    let Value::Array(streams) = reply else {
        // BLOCK timed out with no data: server replies with a nil.
        if matches!(reply, Value::Nil) {
            return Ok(Vec::new());
        }
        return Err(QueueError::Redis(protocol_error("unexpected XREADGROUP reply shape")));
    };

    let Some(Value::Array(first_stream)) = streams.into_iter().next() else {
        return Ok(Vec::new());
    };

    let Some(entries_value) = first_stream.into_iter().nth(1) else {
        return Ok(Vec::new());
    };

    parse_entries(entries_value)
}

/// `[[id, [field, value, ...]], ...]` shared shape used by both
/// XREADGROUP's per-stream entry list and XAUTOCLAIM's claimed-entry
/// list.
fn parse_entries(value: Value) -> QueueResult<Vec<Delivered>> {
    let Value::Array(raw_entries) = value else {
        return Ok(Vec::new());
    };

    let mut out = Vec::with_capacity(raw_entries.len());
    for raw in raw_entries {
        let Value::Array(pair) = raw else { continue };
        let mut iter = pair.into_iter();
        let Some(id_value) = iter.next() else { continue };
        let Some(fields_value) = iter.next() else { continue };

        let entry_id = match id_value {
            Value::BulkString(bytes) => String::from_utf8_lossy(&bytes).to_string(),
            Value::SimpleString(s) => s,
            _ => continue,
        };

        let Value::Array(fields) = fields_value else { continue };
        let mut raw_payload: Option<Vec<u8>> = None;
        let mut field_iter = fields.into_iter();
        while let (Some(k), Some(v)) = (field_iter.next(), field_iter.next()) {
            if let Value::BulkString(key_bytes) = &k {
                if key_bytes == FIELD.as_bytes() {
                    if let Value::BulkString(value_bytes) = v {
                        raw_payload = Some(value_bytes);
                    }
                }
            }
        }

        let Some(raw_payload) = raw_payload else { continue };

        match common::OutboundMessage::from_json(&raw_payload) {
            Ok(message) => out.push(Delivered::Parsed(QueueEntry { entry_id, message })),
            Err(err) => {
                warn!(entry_id, error = %err, "failed to parse queue entry, will be dropped to DLQ");
                out.push(Delivered::Unparseable(UnparseableEntry {
                    entry_id,
                    raw: String::from_utf8_lossy(&raw_payload).to_string(),
                }));
            }
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn busygroup_error_is_detected() {
        let err = RedisError::from((ErrorKind::ExtensionError, "BUSYGROUP", "already exists".to_string()));
        assert!(is_busygroup(&err));
    }

    #[test]
    fn empty_reply_parses_to_no_entries() {
        let parsed = parse_entries(Value::Array(vec![])).unwrap();
        assert!(parsed.is_empty());
    }
}
