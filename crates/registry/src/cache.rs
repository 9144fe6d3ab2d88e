use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::debug;

use common::keys;

use crate::errors::RegistryResult;
use crate::models::CacheEntry;
use crate::registry::InstanceRegistry;

const CACHE_TTL_SECONDS: u64 = 3600;

/// Read-through cache in front of the registry. Negative results (no
/// registration found) are never cached — a first lookup for a brand-new
/// instance is rare and must reflect fresh state rather than a cached
/// miss.
pub struct InstanceCache {
    conn: ConnectionManager,
}

impl InstanceCache {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    pub async fn resolve_by_token(
        &mut self,
        registry: &InstanceRegistry,
        token: &str,
    ) -> RegistryResult<Option<CacheEntry>> {
        let cache_key = keys::cache_by_token(token);
        if let Some(entry) = self.get(&cache_key).await? {
            return Ok(Some(entry));
        }

        let Some(reg) = registry.find_by_webhook_token(token).await? else {
            return Ok(None);
        };

        let entry = CacheEntry::from(&reg);
        self.put(&entry).await?;
        Ok(Some(entry))
    }

    pub async fn resolve_by_instance(
        &mut self,
        registry: &InstanceRegistry,
        instance_name: &str,
    ) -> RegistryResult<Option<CacheEntry>> {
        let cache_key = keys::cache_by_instance(instance_name);
        if let Some(entry) = self.get(&cache_key).await? {
            return Ok(Some(entry));
        }

        let Some(reg) = registry.find_by_instance(instance_name).await? else {
            return Ok(None);
        };

        let entry = CacheEntry::from(&reg);
        self.put(&entry).await?;
        Ok(Some(entry))
    }

    /// Clears both keyed views. Called on every registry mutation.
    pub async fn invalidate(&mut self, instance_name: &str, webhook_token: &str) -> RegistryResult<()> {
        let by_instance = keys::cache_by_instance(instance_name);
        let by_token = keys::cache_by_token(webhook_token);
        let _: () = self.conn.del(&[by_instance, by_token]).await?;
        debug!(instance_name, "cache invalidated");
        Ok(())
    }

    async fn get(&mut self, key: &str) -> RegistryResult<Option<CacheEntry>> {
        let raw: Option<String> = self.conn.get(key).await?;
        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn put(&mut self, entry: &CacheEntry) -> RegistryResult<()> {
        let json = serde_json::to_string(entry)?;
        let by_instance = keys::cache_by_instance(&entry.instance_name);
        let by_token = keys::cache_by_token(&entry.webhook_token);
        let _: () = self.conn.set_ex(&by_instance, &json, CACHE_TTL_SECONDS).await?;
        let _: () = self.conn.set_ex(&by_token, &json, CACHE_TTL_SECONDS).await?;
        Ok(())
    }
}
