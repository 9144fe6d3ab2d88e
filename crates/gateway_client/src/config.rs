use serde::Deserialize;

/// Everything needed to reach the upstream WhatsApp gateway (Evolution
/// API). Endpoint path shape is operator-configured since self-hosted
/// Evolution deployments vary; defaults match the common install.
#[derive(Deserialize, Debug, Clone)]
pub struct GatewayConfig {
    pub base_url: String,
    pub api_key: String,
    pub http_timeout_seconds: u64,
}

impl GatewayConfig {
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        Self {
            base_url: std::env::var("GATEWAY_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            api_key: std::env::var("GATEWAY_API_KEY")
                .expect("GATEWAY_API_KEY environment variable must be set"),
            http_timeout_seconds: std::env::var("GATEWAY_HTTP_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| "15".to_string())
                .parse()
                .expect("GATEWAY_HTTP_TIMEOUT_SECONDS must be a valid number"),
        }
    }

    pub fn send_text_url(&self, instance: &str) -> String {
        format!("{}/message/sendText/{instance}", self.base_url)
    }

    pub fn create_instance_url(&self) -> String {
        format!("{}/instance/create", self.base_url)
    }

    pub fn delete_instance_url(&self, instance: &str) -> String {
        format!("{}/instance/delete/{instance}", self.base_url)
    }

    pub fn connection_state_url(&self, instance: &str) -> String {
        format!("{}/instance/connectionState/{instance}", self.base_url)
    }

    pub fn fetch_instances_url(&self) -> String {
        format!("{}/instance/fetchInstances", self.base_url)
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
    fn builds_send_text_url() {
        let config = test_config();
        assert_eq!(
            config.send_text_url("inst-a"),
            "https://gateway.example.com/message/sendText/inst-a"
        );
    }

    #[test]
    fn builds_delete_instance_url() {
        let config = test_config();
        assert_eq!(
            config.delete_instance_url("inst-a"),
            "https://gateway.example.com/instance/delete/inst-a"
        );
    }
}
