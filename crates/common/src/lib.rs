pub mod backoff;
pub mod keys;
pub mod message;

pub use message::{DeadLetterEntry, InboundEvent, OutboundMessage};
