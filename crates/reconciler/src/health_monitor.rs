use tokio::time::{interval, Duration};
use tracing::{info, warn};

use gateway_client::{ConnectionState, GatewayClient};
use registry::{InstanceRegistry, InstanceStatus};

/// Every `interval`, checks each registered instance's upstream
/// connection state and reconciles the registry's `status`/`last_seen_at`
/// on mismatch. Never deletes rows — that's the orphan reaper's job.
pub async fn run(registry: InstanceRegistry, gateway: GatewayClient, interval_seconds: u64) {
    let mut ticker = interval(Duration::from_secs(interval_seconds));

    loop {
        ticker.tick().await;
        if let Err(err) = run_once(&registry, &gateway).await {
            warn!(error = %err, "health check pass failed");
        }
    }
}

async fn run_once(registry: &InstanceRegistry, gateway: &GatewayClient) -> anyhow::Result<()> {
    let instances = registry.list_all_instance_names().await?;
    info!(count = instances.len(), "running health check pass");

    for instance in instances {
        let status = match gateway.instance_connection_state(&instance).await {
            ConnectionState::Open => InstanceStatus::Active,
            ConnectionState::Connecting => InstanceStatus::Connecting,
            ConnectionState::Closed | ConnectionState::Unknown => InstanceStatus::Disconnected,
        };

        if let Err(err) = registry.update_status(&instance, status, None).await {
            warn!(instance, error = %err, "failed to update registry status");
        }
    }

    Ok(())
}
