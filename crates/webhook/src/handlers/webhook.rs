use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::Value;
use tracing::{debug, warn};

use common::{keys, InboundEvent};

use crate::state::AppState;

/// `POST /webhooks/<provider>/<webhook_token>`.
///
/// Always returns 200 once the event is durably recorded (idempotency
/// claim + normalised-event enqueue); downstream processing errors are
/// never surfaced here, only logged.
pub async fn intake(
    State(state): State<AppState>,
    Path((_provider, webhook_token)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> StatusCode {
    let entry = {
        let mut cache = state.cache.lock().await;
        cache.resolve_by_token(&state.registry, &webhook_token).await
    };

    let entry = match entry {
        Ok(Some(entry)) => entry,
        Ok(None) => return StatusCode::NOT_FOUND,
        Err(err) => {
            warn!(error = %err, "failed to resolve webhook token");
            return StatusCode::NOT_FOUND;
        }
    };

    let Some(gateway_message_id) = extract_gateway_message_id(&body) else {
        warn!(instance = %entry.instance_name, "malformed webhook body, missing message id");
        return StatusCode::BAD_REQUEST;
    };

    let claimed = {
        let mut idempotency = state.idempotency.lock().await;
        idempotency
            .claim(&keys::ingress_idempotency(&gateway_message_id), state.config.idempotency_ttl_seconds)
            .await
    };

    match claimed {
        Ok(false) => {
            debug!(gateway_message_id, "duplicate webhook, already processed");
            return StatusCode::OK;
        }
        Err(err) => {
            warn!(error = %err, "idempotency claim failed");
            return StatusCode::OK;
        }
        Ok(true) => {}
    }

    let event = InboundEvent {
        from: extract_from(&body).unwrap_or_default(),
        text: extract_text(&body),
        instance: entry.instance_name.clone(),
        gateway_message_id,
        received_at: chrono::Utc::now(),
    };

    let mut manager = state.redis_manager.clone();
    if let Err(err) = enqueue_inbound(&mut manager, &event).await {
        warn!(error = %err, "failed to enqueue inbound event");
    }

    StatusCode::OK
}

/// The inbound stream is a single shared stream consumed by the AI
/// pipeline (out of scope here), not one of the per-instance outbound
/// streams `queue::RedisQueue` manages, so this issues the XADD directly.
async fn enqueue_inbound(manager: &mut redis::aio::ConnectionManager, event: &InboundEvent) -> anyhow::Result<()> {
    let payload = serde_json::to_vec(event)?;
    let _: String = redis::cmd("XADD")
        .arg(keys::INBOUND_STREAM)
        .arg("*")
        .arg("payload")
        .arg(payload)
        .query_async(manager)
        .await?;
    Ok(())
}

fn extract_gateway_message_id(body: &Value) -> Option<String> {
    body.pointer("/data/key/id")
        .or_else(|| body.pointer("/key/id"))
        .or_else(|| body.pointer("/message_id"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn extract_from(body: &Value) -> Option<String> {
    body.pointer("/data/key/remoteJid")
        .or_else(|| body.pointer("/key/remoteJid"))
        .or_else(|| body.pointer("/from"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn extract_text(body: &Value) -> Option<String> {
    body.pointer("/data/message/conversation")
        .or_else(|| body.pointer("/message/conversation"))
        .or_else(|| body.pointer("/text"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_evolution_style_payload() {
        let body = json!({
            "data": {
                "key": { "id": "ABC123", "remoteJid": "15551230000@s.whatsapp.net" },
                "message": { "conversation": "hello" }
            }
        });

        assert_eq!(extract_gateway_message_id(&body), Some("ABC123".to_string()));
        assert_eq!(extract_from(&body), Some("15551230000@s.whatsapp.net".to_string()));
        assert_eq!(extract_text(&body), Some("hello".to_string()));
    }

    #[test]
    fn missing_message_id_returns_none() {
        let body = json!({ "data": {} });
        assert_eq!(extract_gateway_message_id(&body), None);
    }
}
