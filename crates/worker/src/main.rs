use anyhow::Result;
use tracing::{error, info};

use gateway_client::GatewayClient;
use registry::InstanceRegistry;
use worker::{Supervisor, WorkerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("worker=info").init();

    let config = WorkerConfig::from_env();

    let registry = InstanceRegistry::connect(&config.database_url).await?;
    let gateway = GatewayClient::new(config.gateway_config())?;
    let redis_client = redis::Client::open(config.redis_url.clone())?;

    let mut supervisor = Supervisor::new(config, gateway, redis_client);

    let ctrl_c = tokio::signal::ctrl_c();

    tokio::select! {
        result = supervisor.run(&registry) => {
            if let Err(e) = result {
                error!("supervisor exited with error: {e}");
            }
        }
        _ = ctrl_c => {
            info!("received Ctrl+C, shutting down workers");
            supervisor.shutdown().await;
            info!("shutdown complete");
        }
    }

    Ok(())
}
