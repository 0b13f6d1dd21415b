pub mod api;
pub mod config;
pub mod core;
pub mod errors;

// Re-exports
pub use crate::api::routes::{create_router, AppState};
pub use crate::config::settings::Settings;
pub use crate::core::cluster::{ClusterConfig, ClusterMetadata};
pub use crate::core::provider::{PoolRegistry, ProviderClient};
pub use crate::core::provisioner::{ClusterProvisioner, ProvisionOutcome, ProvisionRequest};
pub use crate::core::template::{Credentials, TemplateBuilder};
pub type AsyncMutex<T> = tokio::sync::Mutex<T>;
