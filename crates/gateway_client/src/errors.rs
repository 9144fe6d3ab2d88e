use thiserror::Error;

/// Transport-level failures from talking to the upstream WhatsApp gateway.
///
/// This client does not classify errors into retryable/permanent — the
/// worker owns that decision (see its retry loop) and, per the gateway's
/// observed behaviour, retries both transient and 4xx failures uniformly
/// up to `max_deliveries`. This type only needs to carry enough detail to
/// log usefully.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("gateway request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("gateway returned {status}: {body}")]
    Http { status: u16, body: String },

    #[error("failed to decode gateway response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("gateway configuration error: {0}")]
    Configuration(String),
}

pub type GatewayResult<T> = Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_formats_status_and_body() {
        let err = GatewayError::Http {
            status: 503,
            body: "upstream unavailable".to_string(),
        };
        assert_eq!(err.to_string(), "gateway returned 503: upstream unavailable");
    }
}
