use std::sync::Arc;

use redis::aio::ConnectionManager;
use tokio::sync::Mutex;

use gateway_client::GatewayClient;
use registry::{InstanceCache, InstanceRegistry};

use crate::config::AppConfig;

/// Shared state handed to every axum handler. `InstanceCache` and
/// `queue::IdempotencyStore` hold a `ConnectionManager`, which needs `&mut
/// self` for commands; wrapped in a `Mutex` since handlers run
/// concurrently but Redis round trips are short.
///
/// No `queue::RedisQueue` here: this binary only ever reads/writes the
/// shared inbound stream directly off `redis_manager` (see
/// `handlers::webhook::enqueue_inbound`) — outbound per-instance streams
/// are the worker's concern, not the webhook's.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub registry: InstanceRegistry,
    pub cache: Arc<Mutex<InstanceCache>>,
    pub notifier: Arc<Mutex<registry::InstanceNotifier>>,
    pub idempotency: Arc<Mutex<queue::IdempotencyStore>>,
    pub gateway: Arc<GatewayClient>,
    pub redis_manager: ConnectionManager,
}

impl AppState {
    pub async fn new(config: AppConfig) -> anyhow::Result<Self> {
        let registry = InstanceRegistry::connect(&config.database_url).await?;
        let redis_client = redis::Client::open(config.redis_url.clone())?;
        let manager = ConnectionManager::new(redis_client).await?;

        let cache = InstanceCache::new(manager.clone());
        let notifier = registry::InstanceNotifier::new(manager.clone());
        let idempotency = queue::IdempotencyStore::new(manager.clone());
        let gateway = GatewayClient::new(config.gateway_config())?;

        Ok(Self {
            config,
            registry,
            cache: Arc::new(Mutex::new(cache)),
            notifier: Arc::new(Mutex::new(notifier)),
            idempotency: Arc::new(Mutex::new(idempotency)),
            gateway: Arc::new(gateway),
            redis_manager: manager,
        })
    }
}
