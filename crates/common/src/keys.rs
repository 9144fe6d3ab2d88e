//! KV key layout, exactly as laid out in the system's external interface
//! contract. Centralized here so `queue`, `registry`, and `worker` never
//! hand-format a key independently and drift.

pub fn outbound_stream(instance: &str) -> String {
    format!("wa:{instance}:stream")
}

pub fn dead_letter_stream(instance: &str) -> String {
    format!("wa:{instance}:dlq")
}

pub fn enqueue_idempotency(message_id: &str) -> String {
    format!("wa:msg:{message_id}")
}

pub fn ingress_idempotency(gateway_message_id: &str) -> String {
    format!("wa:in:{gateway_message_id}")
}

pub fn rate_bucket(instance: &str) -> String {
    format!("wa:{instance}:bucket")
}

pub fn rate_bucket_timestamp(instance: &str) -> String {
    format!("wa:{instance}:bucket:ts")
}

pub fn cache_by_instance(instance_name: &str) -> String {
    format!("whatsapp:instance:{instance_name}")
}

pub fn cache_by_token(webhook_token: &str) -> String {
    format!("whatsapp:token:{webhook_token}")
}

pub const INBOUND_STREAM: &str = "wa:inbound:stream";

pub const INSTANCES_ADDED_CHANNEL: &str = "wa:instances:added";
pub const INSTANCES_REMOVED_CHANNEL: &str = "wa:instances:removed";

pub const CONSUMER_GROUP: &str = "wa_workers";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_match_the_documented_layout() {
        assert_eq!(outbound_stream("inst-a"), "wa:inst-a:stream");
        assert_eq!(dead_letter_stream("inst-a"), "wa:inst-a:dlq");
        assert_eq!(enqueue_idempotency("m1"), "wa:msg:m1");
        assert_eq!(ingress_idempotency("wamid.123"), "wa:in:wamid.123");
        assert_eq!(rate_bucket("inst-a"), "wa:inst-a:bucket");
        assert_eq!(rate_bucket_timestamp("inst-a"), "wa:inst-a:bucket:ts");
        assert_eq!(cache_by_instance("inst-a"), "whatsapp:instance:inst-a");
        assert_eq!(cache_by_token("tok123"), "whatsapp:token:tok123");
    }
}
