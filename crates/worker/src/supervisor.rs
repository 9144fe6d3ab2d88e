use std::collections::HashMap;
use std::sync::Arc;

use redis::aio::ConnectionManager;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use gateway_client::GatewayClient;
use queue::RateLimiter;
use registry::{InstanceEvent, InstanceRegistry};

use crate::config::WorkerConfig;
use crate::instance_worker::InstanceWorker;

/// Owns one `InstanceWorker` task per registered instance. Reacts to
/// `notify_added`/`notify_removed` pub/sub events rather than polling the
/// registry, and fans a single shutdown signal out to every task it
/// manages.
pub struct Supervisor {
    config: WorkerConfig,
    gateway: Arc<GatewayClient>,
    redis_client: redis::Client,
    handles: HashMap<String, JoinHandle<()>>,
    shutdown_tx: watch::Sender<bool>,
}

impl Supervisor {
    pub fn new(config: WorkerConfig, gateway: GatewayClient, redis_client: redis::Client) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            config,
            gateway: Arc::new(gateway),
            redis_client,
            handles: HashMap::new(),
            shutdown_tx,
        }
    }

    /// Spins up a worker for every currently-registered instance, then
    /// blocks forever reacting to lifecycle notifications until shutdown
    /// is requested.
    pub async fn run(&mut self, registry: &InstanceRegistry) -> anyhow::Result<()> {
        for instance in registry.list_enabled_instance_names().await? {
            self.spawn_instance(&instance).await?;
        }

        let (event_tx, mut event_rx) = tokio::sync::mpsc::unbounded_channel::<(bool, InstanceEvent)>();

        let client = self.redis_client.clone();
        tokio::spawn(async move {
            let added_tx = event_tx.clone();
            let removed_tx = event_tx.clone();
            let result = registry::notifier::subscribe(
                &client,
                move |event| {
                    let _ = added_tx.send((true, event));
                },
                move |event| {
                    let _ = removed_tx.send((false, event));
                },
            )
            .await;
            if let Err(err) = result {
                warn!(error = %err, "instance notifier subscription ended");
            }
        });

        loop {
            match event_rx.recv().await {
                Some((true, event)) => {
                    if let Err(err) = self.spawn_instance(&event.instance_name).await {
                        warn!(instance = %event.instance_name, error = %err, "failed to spawn worker for added instance");
                    }
                }
                Some((false, event)) => {
                    self.despawn_instance(&event.instance_name);
                }
                None => return Ok(()),
            }
        }
    }

    async fn spawn_instance(&mut self, instance: &str) -> anyhow::Result<()> {
        if self.handles.contains_key(instance) {
            return Ok(());
        }

        let manager = ConnectionManager::new(self.redis_client.clone()).await?;
        let queue = queue::RedisQueue::new(manager.clone(), self.config.stream_max_len);
        let rate_limiter = RateLimiter::new(manager, self.config.tokens_per_second, self.config.bucket_capacity);

        let mut worker = InstanceWorker::new(
            instance.to_string(),
            queue,
            rate_limiter,
            self.gateway.clone(),
            self.config.clone(),
        );

        let shutdown_rx = self.shutdown_tx.subscribe();
        let instance_owned = instance.to_string();
        let handle = tokio::spawn(async move {
            worker.run(shutdown_rx).await;
            info!(instance = %instance_owned, "worker task exited");
        });

        self.handles.insert(instance.to_string(), handle);
        info!(instance, "worker spawned");
        Ok(())
    }

    fn despawn_instance(&mut self, instance: &str) {
        if let Some(handle) = self.handles.remove(instance) {
            handle.abort();
            info!(instance, "worker despawned");
        }
    }

    /// Signals every running worker to stop, then waits up to the
    /// configured shutdown budget for them to exit cleanly.
    pub async fn shutdown(&mut self) {
        let _ = self.shutdown_tx.send(true);

        let budget = std::time::Duration::from_secs(self.config.shutdown_budget_seconds);
        let deadline = tokio::time::Instant::now() + budget;

        for (instance, handle) in self.handles.drain() {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            match tokio::time::timeout(remaining, handle).await {
                Ok(_) => info!(instance, "✅ worker shut down cleanly"),
                Err(_) => warn!(instance, "💀 worker did not shut down within budget, abandoning"),
            }
        }

        info!("✅ supervisor shutdown completed");
    }
}
