pub mod config;
pub mod instance_worker;
pub mod supervisor;

pub use config::WorkerConfig;
pub use instance_worker::InstanceWorker;
pub use supervisor::Supervisor;
