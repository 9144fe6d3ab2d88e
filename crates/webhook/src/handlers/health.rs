use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use common::keys;

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct HealthQuery {
    pub instance: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub queue_depth: i64,
    pub dlq_depth: i64,
    pub upstream_connected: bool,
    pub status: HealthStatus,
}

/// `GET /health/whatsapp?instance=…`.
pub async fn whatsapp_health(
    State(state): State<AppState>,
    Query(query): Query<HealthQuery>,
) -> (StatusCode, Json<HealthResponse>) {
    let mut manager = state.redis_manager.clone();

    let queue_depth = stream_len(&mut manager, &keys::outbound_stream(&query.instance)).await;
    let dlq_depth = stream_len(&mut manager, &keys::dead_letter_stream(&query.instance)).await;

    let upstream_connected = state.gateway.instance_connection_state(&query.instance).await.is_open();

    let status = classify(
        queue_depth,
        upstream_connected,
        state.config.queue_depth_unhealthy,
        state.config.queue_depth_degraded,
    );

    (
        StatusCode::OK,
        Json(HealthResponse {
            queue_depth,
            dlq_depth,
            upstream_connected,
            status,
        }),
    )
}

fn classify(queue_depth: i64, upstream_connected: bool, unhealthy_at: i64, degraded_at: i64) -> HealthStatus {
    if queue_depth > unhealthy_at {
        HealthStatus::Unhealthy
    } else if queue_depth > degraded_at || !upstream_connected {
        HealthStatus::Degraded
    } else {
        HealthStatus::Healthy
    }
}

async fn stream_len(manager: &mut redis::aio::ConnectionManager, stream: &str) -> i64 {
    redis::cmd("XLEN").arg(stream).query_async(manager).await.unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_unhealthy_above_threshold() {
        assert_eq!(classify(1001, true, 1000, 100), HealthStatus::Unhealthy);
    }

    #[test]
    fn classifies_degraded_on_moderate_depth_or_disconnect() {
        assert_eq!(classify(150, true, 1000, 100), HealthStatus::Degraded);
        assert_eq!(classify(0, false, 1000, 100), HealthStatus::Degraded);
    }

    #[test]
    fn classifies_healthy_otherwise() {
        assert_eq!(classify(0, true, 1000, 100), HealthStatus::Healthy);
    }
}
