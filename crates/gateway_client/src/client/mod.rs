//! HTTP client for the upstream WhatsApp gateway (Evolution API).
//!
//! - `core.rs`: the client itself — `send_text`, instance lifecycle calls.
//! - `responses.rs`: response shapes for the gateway's JSON bodies.

pub mod core;
pub mod responses;
