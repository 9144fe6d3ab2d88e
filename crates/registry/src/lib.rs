pub mod cache;
pub mod config;
pub mod errors;
pub mod models;
pub mod notifier;
pub mod registry;

pub use cache::InstanceCache;
pub use config::RegistryConfig;
pub use errors::{RegistryError, RegistryResult};
pub use models::{CacheEntry, InstanceRegistration, InstanceStatus};
pub use notifier::{InstanceEvent, InstanceNotifier};
pub use registry::InstanceRegistry;
