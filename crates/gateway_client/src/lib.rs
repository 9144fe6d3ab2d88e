pub mod client;
pub mod config;
pub mod errors;
pub mod jid;

pub use client::core::GatewayClient;
pub use client::responses::ConnectionState;
pub use config::GatewayConfig;
pub use errors::{GatewayError, GatewayResult};
