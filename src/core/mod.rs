pub mod cluster;
pub mod provider;
pub mod provisioner;
pub mod template;

pub use cluster::{ClusterConfig, ClusterMetadata};
pub use provider::{OneRpcClient, PoolRegistry, PoolSignalClient, ProviderClient};
pub use provisioner::{ClusterProvisioner, NodeRegistration, ProvisionOutcome, ProvisionRequest};
pub use template::{Credentials, TemplateBuilder};
