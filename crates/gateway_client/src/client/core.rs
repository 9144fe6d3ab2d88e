use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Client;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::client::responses::{ConnectionState, ConnectionStateResponse, FetchInstancesResponseEntry, InstanceStatus};
use crate::config::GatewayConfig;
use crate::errors::{GatewayError, GatewayResult};
use crate::jid::to_jid;

/// Thin, stateless HTTP client for the upstream gateway. Deliberately has
/// no retry logic of its own — the worker owns retry/backoff decisions,
/// this type only surfaces what happened on the wire.
pub struct GatewayClient {
    http: Client,
    config: GatewayConfig,
}

impl GatewayClient {
    pub fn new(config: GatewayConfig) -> GatewayResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(&config.api_key)
                .map_err(|e| GatewayError::Configuration(format!("invalid api key: {e}")))?,
        );

        let http = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_seconds))
            .default_headers(headers)
            .build()
            .map_err(GatewayError::Transport)?;

        Ok(Self { http, config })
    }

    /// Send a text message. Normalizes `to` into gateway JID form. Returns
    /// `false` on transport error or any HTTP status >= 400 rather than
    /// propagating — the caller (the worker) treats any `false` the same
    /// way regardless of cause.
    pub async fn send_text(&self, instance: &str, to: &str, text: &str) -> bool {
        let jid = to_jid(to);
        let body = json!({
            "number": jid,
            "text": text,
        });

        let result = self
            .http
            .post(self.config.send_text_url(instance))
            .json(&body)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                debug!(instance, %jid, "message sent");
                true
            }
            Ok(response) => {
                warn!(instance, %jid, status = %response.status(), "gateway rejected send_text");
                false
            }
            Err(err) => {
                warn!(instance, %jid, error = %err, "send_text transport error");
                false
            }
        }
    }

    /// Never propagates a failure: a transport error, a timeout, or a
    /// non-2xx/non-404 response is indistinguishable from a closed
    /// session to every caller of this method, so it is folded into
    /// `ConnectionState::Closed` here rather than at each call site.
    pub async fn instance_connection_state(&self, instance: &str) -> ConnectionState {
        match self.raw_connection_state(instance).await {
            Ok(state) => ConnectionState::from_wire(&state.instance.state),
            Err(err) => {
                warn!(instance, error = %err, "failed to check connection state, treating as closed");
                ConnectionState::Closed
            }
        }
    }

    /// Never propagates a failure: any error other than a clean 404 is
    /// folded into `exists: false` rather than surfaced to the caller.
    pub async fn get_instance_status(&self, instance: &str) -> InstanceStatus {
        match self.raw_connection_state(instance).await {
            Ok(state) => InstanceStatus {
                exists: true,
                status: Some(state.instance.state),
            },
            Err(GatewayError::Http { status: 404, .. }) => InstanceStatus {
                exists: false,
                status: None,
            },
            Err(err) => {
                warn!(instance, error = %err, "failed to check instance status, treating as absent");
                InstanceStatus {
                    exists: false,
                    status: None,
                }
            }
        }
    }

    async fn raw_connection_state(&self, instance: &str) -> GatewayResult<ConnectionStateResponse> {
        let response = self
            .http
            .get(self.config.connection_state_url(instance))
            .send()
            .await?;
        Self::decode(response).await
    }

    pub async fn create_instance(&self, instance: &str, webhook_url: &str, events: &[&str]) -> GatewayResult<()> {
        let body = json!({
            "instanceName": instance,
            "webhook": {
                "url": webhook_url,
                "events": events,
            },
        });

        let response = self
            .http
            .post(self.config.create_instance_url())
            .json(&body)
            .send()
            .await?;

        if response.status().is_success() {
            info!(instance, "instance created upstream");
            Ok(())
        } else {
            Err(Self::http_error(response).await)
        }
    }

    /// Deletes the upstream instance. Idempotent: deleting an instance
    /// that no longer exists upstream is treated as success, not an
    /// error.
    pub async fn delete_instance(&self, instance: &str) -> GatewayResult<()> {
        let response = self
            .http
            .delete(self.config.delete_instance_url(instance))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() || status.as_u16() == 404 {
            info!(instance, %status, "instance delete requested upstream");
            Ok(())
        } else {
            Err(Self::http_error(response).await)
        }
    }

    pub async fn fetch_all_instances(&self) -> GatewayResult<Vec<String>> {
        let response = self
            .http
            .get(self.config.fetch_instances_url())
            .send()
            .await?;

        let entries: Vec<FetchInstancesResponseEntry> = Self::decode(response).await?;
        Ok(entries.into_iter().map(|e| e.instance_name).collect())
    }

    async fn decode<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> GatewayResult<T> {
        let status = response.status();
        let body = response.text().await?;
        if status.is_success() {
            serde_json::from_str(&body).map_err(GatewayError::Decode)
        } else {
            Err(GatewayError::Http {
                status: status.as_u16(),
                body,
            })
        }
    }

    async fn http_error(response: reqwest::Response) -> GatewayError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        GatewayError::Http { status, body }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> GatewayConfig {
        GatewayConfig {
            base_url: "https://gateway.example.com".to_string(),
            api_key: "secret".to_string(),
            http_timeout_seconds: 15,
        }
    }

    #[test]
    fn builds_with_valid_config() {
        let client = GatewayClient::new(test_config());
        assert!(client.is_ok());
    }
}
