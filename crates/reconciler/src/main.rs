use anyhow::Result;
use redis::aio::ConnectionManager;
use tracing::{error, info};

use gateway_client::GatewayClient;
use reconciler::{config::ReconcilerConfig, health_monitor, orphan_reaper};
use registry::InstanceRegistry;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("reconciler=info").init();

    let config = ReconcilerConfig::from_env();

    let registry = InstanceRegistry::connect(&config.database_url).await?;
    let redis_client = redis::Client::open(config.redis_url.clone())?;
    let manager = ConnectionManager::new(redis_client).await?;

    let health_gateway = GatewayClient::new(config.gateway_config())?;
    let reaper_gateway = GatewayClient::new(config.gateway_config())?;

    let health_registry = registry.clone();
    let reaper_registry = registry.clone();
    let health_interval = config.health_check_interval_seconds;
    let reap_interval = config.orphan_reap_interval_seconds;
    let reaper_manager = manager.clone();

    let health_task = tokio::spawn(async move {
        health_monitor::run(health_registry, health_gateway, health_interval).await;
    });
    let reaper_task = tokio::spawn(async move {
        orphan_reaper::run(reaper_registry, reaper_gateway, reaper_manager, reap_interval).await;
    });

    let ctrl_c = tokio::signal::ctrl_c();

    tokio::select! {
        result = health_task => {
            if let Err(e) = result {
                error!("health monitor task panicked: {e}");
            }
        }
        result = reaper_task => {
            if let Err(e) = result {
                error!("orphan reaper task panicked: {e}");
            }
        }
        _ = ctrl_c => {
            info!("received Ctrl+C, shutting down reconciler");
        }
    }

    Ok(())
}
