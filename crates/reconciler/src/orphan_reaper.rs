use std::collections::HashSet;

use redis::aio::ConnectionManager;
use tokio::time::{interval, Duration};
use tracing::{info, warn};

use gateway_client::GatewayClient;
use registry::{InstanceCache, InstanceRegistry};

/// Every `interval`, diffs the upstream gateway's instance list against
/// the registry in both directions. Both passes are required — the two
/// stores drift independently, not just one way.
pub async fn run(
    registry: InstanceRegistry,
    gateway: GatewayClient,
    redis_manager: ConnectionManager,
    interval_seconds: u64,
) {
    let mut cache = InstanceCache::new(redis_manager);
    let mut ticker = interval(Duration::from_secs(interval_seconds));

    loop {
        ticker.tick().await;
        if let Err(err) = run_once(&registry, &gateway, &mut cache).await {
            warn!(error = %err, "orphan reap pass failed");
        }
    }
}

async fn run_once(registry: &InstanceRegistry, gateway: &GatewayClient, cache: &mut InstanceCache) -> anyhow::Result<()> {
    let upstream: HashSet<String> = gateway.fetch_all_instances().await?.into_iter().collect();
    let registered: HashSet<String> = registry.list_all_instance_names().await?.into_iter().collect();

    info!(upstream = upstream.len(), registered = registered.len(), "running orphan reap pass");

    for instance in upstream.difference(&registered) {
        info!(instance, "deleting upstream instance with no registry row");
        if let Err(err) = gateway.delete_instance(instance).await {
            warn!(instance, error = %err, "failed to delete orphaned upstream instance");
        }
    }

    for instance in registered.difference(&upstream) {
        info!(instance, "deleting registry row with no upstream instance");
        let Ok(Some(reg)) = registry.find_by_instance(instance).await else {
            continue;
        };

        if let Err(err) = cache.invalidate(instance, &reg.webhook_token).await {
            warn!(instance, error = %err, "failed to invalidate cache for orphaned registry row");
        }
        if let Err(err) = registry.delete(instance).await {
            warn!(instance, error = %err, "failed to delete orphaned registry row");
        }
    }

    Ok(())
}
