use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::core::cluster::ClusterConfig;
use crate::core::provider::{PoolRegistry, ProviderClient};
use crate::core::template::TemplateBuilder;
use crate::errors::{CommunicationFailure, ProvisionError};

/// The signal a worker interprets as "leave the pool and exit".
pub const DIE_SIGNAL: &str = "die";

/// One batch request: how many workers to start and the parameters they
/// need to rendezvous with the coordinator. Lives only for the call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionRequest {
    pub count: u32,
    pub election_name: String,
    pub pool_name: String,
    pub coordinator_address: String,
}

/// A live node the registry knows about: its logical location and the
/// instance id the provider assigned to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeRegistration {
    pub location: String,
    pub instance_id: String,
    pub registered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedAllocation {
    pub location: String,
    pub message: String,
}

/// Aggregate outcome of one batch. A partial failure is still a
/// success-shaped result: callers must check `failed`, not rely on errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionOutcome {
    pub started: u32,
    pub failed: u32,
    pub current_node_count: u32,
    pub failures: Vec<FailedAllocation>,
}

/// Orchestrates the provisioning control loop for one cluster: renders a
/// template per requested node, submits it to the provider, and keeps the
/// authoritative location → instance-id registry used for teardown.
pub struct ClusterProvisioner {
    config: ClusterConfig,
    template: TemplateBuilder,
    provider: Arc<dyn ProviderClient>,
    pool: Arc<dyn PoolRegistry>,
    registry: HashMap<String, NodeRegistration>,
    /// Cumulative successful allocations. Monotonic: hard teardown removes
    /// registry entries but never rolls this back, so a location is never
    /// minted twice within the cluster's lifetime.
    current_node_count: u32,
    /// Read from the environment-derived settings and logged, but not yet
    /// substituted into the coordinator address handed to workers. The
    /// coordinator binding has to move up the call tree before this can be
    /// applied safely.
    public_ip_override: Option<String>,
}

impl ClusterProvisioner {
    pub fn new(
        config: ClusterConfig,
        template: TemplateBuilder,
        provider: Arc<dyn ProviderClient>,
        pool: Arc<dyn PoolRegistry>,
        public_ip_override: Option<String>,
    ) -> Self {
        Self {
            config,
            template,
            provider,
            pool,
            registry: HashMap::new(),
            current_node_count: 0,
            public_ip_override,
        }
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    pub fn current_node_count(&self) -> u32 {
        self.current_node_count
    }

    pub fn nodes(&self) -> Vec<NodeRegistration> {
        let mut nodes: Vec<_> = self.registry.values().cloned().collect();
        nodes.sort_by(|a, b| a.location.cmp(&b.location));
        nodes
    }

    pub fn lookup(&self, location: &str) -> Option<&NodeRegistration> {
        self.registry.get(location)
    }

    /// Starts `request.count` workers. Per-node allocation failures are
    /// recorded and counted, never returned as a batch error.
    ///
    /// Sequence rule: attempt `i` uses `current_node_count + i - failed`,
    /// so a failed attempt's slot is reused by the next attempt and the
    /// issued locations stay dense (`node0`, `node1`, ...) across batches
    /// with arbitrary failure patterns.
    pub async fn start_nodes(&mut self, request: &ProvisionRequest) -> ProvisionOutcome {
        info!(
            count = request.count,
            alias = %self.config.alias,
            "starting workers"
        );

        if let Some(ip) = &self.public_ip_override {
            info!(
                coordinator = %request.coordinator_address,
                override_ip = %ip,
                "public-IP override present, not substituted"
            );
        }

        let mut failed: u32 = 0;
        let mut failures = Vec::new();

        for i in 0..request.count {
            let sequence = self.current_node_count + i - failed;
            let location = format!("node{}@{}", sequence, self.config.alias);

            let blob = self.template.build(
                &self.config,
                &location,
                &request.election_name,
                &request.pool_name,
                &request.coordinator_address,
            );

            match self.provider.allocate(&blob).await {
                Ok(instance_id) => {
                    info!(%location, %instance_id, "worker started");
                    self.registry.insert(
                        location.clone(),
                        NodeRegistration {
                            location,
                            instance_id,
                            registered_at: Utc::now(),
                        },
                    );
                }
                Err(e) => {
                    error!(%location, error = %e, "worker allocation failed");
                    failures.push(FailedAllocation {
                        location,
                        message: e.message.clone(),
                    });
                    failed += 1;
                }
            }
        }

        self.current_node_count += request.count - failed;

        ProvisionOutcome {
            started: request.count - failed,
            failed,
            current_node_count: self.current_node_count,
            failures,
        }
    }

    /// Soft termination: tells the worker to leave the pool voluntarily.
    /// Does not touch the registry or the provider; the instance stays
    /// allocated until it shuts itself down or is hard-deallocated.
    pub async fn terminate_node(&self, node_identity: &str) -> Result<(), CommunicationFailure> {
        self.pool.signal(node_identity, DIE_SIGNAL).await
    }

    /// Hard teardown: resolves the location through the registry and asks
    /// the provider to terminate the instance. The registry entry is only
    /// removed once the provider accepts the request.
    pub async fn deallocate(&mut self, location: &str) -> Result<(), ProvisionError> {
        let instance_id = self
            .registry
            .get(location)
            .map(|r| r.instance_id.clone())
            .ok_or_else(|| ProvisionError::UnknownLocation(location.to_string()))?;

        self.provider.terminate(&instance_id).await?;
        self.registry.remove(location);
        warn!(%location, %instance_id, "instance terminated and deregistered");
        Ok(())
    }
}
