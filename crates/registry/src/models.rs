use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceStatus {
    Pending,
    QrPending,
    Connecting,
    Active,
    Disconnected,
    Disabled,
    Error,
}

impl InstanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstanceStatus::Pending => "pending",
            InstanceStatus::QrPending => "qr_pending",
            InstanceStatus::Connecting => "connecting",
            InstanceStatus::Active => "active",
            InstanceStatus::Disconnected => "disconnected",
            InstanceStatus::Disabled => "disabled",
            InstanceStatus::Error => "error",
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct InstanceRegistration {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub clinic_id: Option<Uuid>,
    #[sqlx(rename = "type")]
    pub kind: String,
    pub provider: String,
    pub instance_name: String,
    pub webhook_token: String,
    pub webhook_url: String,
    pub phone_number: Option<String>,
    pub status: String,
    pub enabled: bool,
    pub connected_at: Option<DateTime<Utc>>,
    pub last_seen_at: Option<DateTime<Utc>>,
    pub config: serde_json::Value,
    pub credentials_vault_ref: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Lightweight projection stored in the cache — enough for the webhook
/// intake and worker to route without a round trip to Postgres.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub instance_name: String,
    pub organization_id: Uuid,
    pub webhook_token: String,
    pub enabled: bool,
    pub status: String,
}

impl From<&InstanceRegistration> for CacheEntry {
    fn from(reg: &InstanceRegistration) -> Self {
        Self {
            instance_name: reg.instance_name.clone(),
            organization_id: reg.organization_id,
            webhook_token: reg.webhook_token.clone(),
            enabled: reg.enabled,
            status: reg.status.clone(),
        }
    }
}
