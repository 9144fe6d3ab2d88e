use futures::StreamExt;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use common::keys::{INSTANCES_ADDED_CHANNEL, INSTANCES_REMOVED_CHANNEL};

use crate::errors::RegistryResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceEvent {
    pub instance_name: String,
    pub organization_id: Uuid,
}

/// Publishes instance lifecycle events on a shared pub/sub channel so
/// workers can warm or tear down local state without polling the
/// registry.
pub struct InstanceNotifier {
    conn: ConnectionManager,
}

impl InstanceNotifier {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    pub async fn notify_added(&mut self, instance_name: &str, organization_id: Uuid) -> RegistryResult<()> {
        let event = InstanceEvent {
            instance_name: instance_name.to_string(),
            organization_id,
        };
        let payload = serde_json::to_string(&event)?;
        let _: i64 = self.conn.publish(INSTANCES_ADDED_CHANNEL, payload).await?;
        Ok(())
    }

    pub async fn notify_removed(&mut self, instance_name: &str, organization_id: Uuid) -> RegistryResult<()> {
        let event = InstanceEvent {
            instance_name: instance_name.to_string(),
            organization_id,
        };
        let payload = serde_json::to_string(&event)?;
        let _: i64 = self.conn.publish(INSTANCES_REMOVED_CHANNEL, payload).await?;
        Ok(())
    }
}

/// Subscriber side, used by `worker`'s supervisor to react to lifecycle
/// events. Runs on the dedicated pub/sub connection a `redis::Client`
/// hands out — separate from the shared `ConnectionManager` used for
/// regular commands.
pub async fn subscribe(
    client: &redis::Client,
    mut on_added: impl FnMut(InstanceEvent) + Send + 'static,
    mut on_removed: impl FnMut(InstanceEvent) + Send + 'static,
) -> RegistryResult<()> {
    let mut pubsub = client.get_async_pubsub().await?;
    pubsub.subscribe(INSTANCES_ADDED_CHANNEL).await?;
    pubsub.subscribe(INSTANCES_REMOVED_CHANNEL).await?;

    let mut stream = pubsub.into_on_message();
    while let Some(msg) = stream.next().await {
        let channel = msg.get_channel_name().to_string();
        let payload: String = match msg.get_payload() {
            Ok(p) => p,
            Err(err) => {
                warn!(error = %err, "failed to decode pub/sub payload");
                continue;
            }
        };

        let event: InstanceEvent = match serde_json::from_str(&payload) {
            Ok(e) => e,
            Err(err) => {
                warn!(error = %err, "failed to parse instance event");
                continue;
            }
        };

        if channel == INSTANCES_ADDED_CHANNEL {
            on_added(event);
        } else if channel == INSTANCES_REMOVED_CHANNEL {
            on_removed(event);
        }
    }

    Ok(())
}
