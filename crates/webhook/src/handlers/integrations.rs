use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use registry::RegistryError;

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateIntegrationRequest {
    pub organization_id: Uuid,
    pub instance_name: String,
}

#[derive(Debug, Serialize)]
pub struct CreateIntegrationResponse {
    pub instance_name: String,
    pub webhook_token: String,
    pub webhook_url: String,
    pub reused: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

fn random_webhook_token() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 16] = rng.gen();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// `POST /integrations/evolution/create`.
///
/// Create-then-check is racy without the registry's unique partial
/// index, so on a unique-violation we check whether the loser can reuse
/// the winner's registration instead of surfacing a bare conflict.
pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateIntegrationRequest>,
) -> Result<Json<CreateIntegrationResponse>, (StatusCode, Json<ErrorBody>)> {
    let webhook_token = random_webhook_token();
    let webhook_url = format!(
        "{}/webhooks/evolution/{webhook_token}",
        state.config.gateway_base_url.trim_end_matches('/')
    );

    let result = state
        .registry
        .register(
            req.organization_id,
            None,
            &req.instance_name,
            &webhook_token,
            &webhook_url,
            serde_json::json!({}),
        )
        .await;

    match result {
        Ok(reg) => {
            if let Err(err) = state
                .gateway
                .create_instance(&reg.instance_name, &reg.webhook_url, &["MESSAGES_UPSERT"])
                .await
            {
                warn!(instance = %reg.instance_name, error = %err, "upstream instance create failed after registry insert");
            }

            info!(instance = %reg.instance_name, "integration created");
            Ok(Json(CreateIntegrationResponse {
                instance_name: reg.instance_name,
                webhook_token: reg.webhook_token,
                webhook_url: reg.webhook_url,
                reused: false,
            }))
        }
        Err(RegistryError::AlreadyEnabled { organization_id }) => {
            match state.registry.find_enabled_for_organization(organization_id).await {
                Ok(Some(existing)) => Ok(Json(CreateIntegrationResponse {
                    instance_name: existing.instance_name,
                    webhook_token: existing.webhook_token,
                    webhook_url: existing.webhook_url,
                    reused: true,
                })),
                _ => Err((
                    StatusCode::CONFLICT,
                    Json(ErrorBody {
                        error: format!("organization {organization_id} already has an enabled WhatsApp integration"),
                    }),
                )),
            }
        }
        Err(err) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorBody { error: err.to_string() }),
        )),
    }
}

#[derive(Debug, Serialize, Default)]
pub struct DeleteIntegrationResponse {
    pub upstream_deleted: bool,
    pub notified: bool,
    pub cache_invalidated: bool,
    pub registry_deleted: bool,
}

/// `DELETE /integrations/evolution/<instance_name>`.
///
/// Performs the four-step delete discipline in order: upstream delete,
/// removed-notification, cache invalidation, registry row delete.
/// Reversing this order orphans the upstream instance against the
/// per-phone device cap (see registry delete docs).
pub async fn delete(
    State(state): State<AppState>,
    Path(instance_name): Path<String>,
) -> (StatusCode, Json<DeleteIntegrationResponse>) {
    let mut outcome = DeleteIntegrationResponse::default();

    let Ok(Some(reg)) = state.registry.find_by_instance(&instance_name).await else {
        return (StatusCode::NOT_FOUND, Json(outcome));
    };

    match state.gateway.delete_instance(&instance_name).await {
        Ok(()) => outcome.upstream_deleted = true,
        Err(err) => {
            warn!(instance = %instance_name, error = %err, "upstream delete failed, aborting delete discipline");
            return (StatusCode::BAD_GATEWAY, Json(outcome));
        }
    }

    {
        let mut notifier = state.notifier.lock().await;
        match notifier.notify_removed(&instance_name, reg.organization_id).await {
            Ok(()) => outcome.notified = true,
            Err(err) => warn!(instance = %instance_name, error = %err, "removed-notification failed"),
        }
    }

    {
        let mut cache = state.cache.lock().await;
        match cache.invalidate(&instance_name, &reg.webhook_token).await {
            Ok(()) => outcome.cache_invalidated = true,
            Err(err) => warn!(instance = %instance_name, error = %err, "cache invalidation failed"),
        }
    }

    match state.registry.delete(&instance_name).await {
        Ok(()) => outcome.registry_deleted = true,
        Err(err) => warn!(instance = %instance_name, error = %err, "registry row delete failed"),
    }

    info!(instance = %instance_name, ?outcome, "integration delete discipline complete");
    (StatusCode::OK, Json(outcome))
}
