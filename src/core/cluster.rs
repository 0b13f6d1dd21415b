use serde::{Deserialize, Serialize};

// Fallbacks applied when the cluster metadata leaves a field empty. The DNS
// and gateway values are placeholders the provider contextualization accepts;
// memory is in megabytes.
pub const DEFAULT_DNS: &str = "130.73.79.13";
pub const DEFAULT_GATEWAY: &str = "10.0.0.1";
pub const DEFAULT_MEM: &str = "400";

/// Immutable description of one cloud target. Constructed once, read-only
/// thereafter; the provisioner never mutates it.
///
/// `speed_factor` is the per-node compute weight. It is provider-specific
/// (number of CPUs on this provider) and passed through unmodified.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ClusterConfig {
    pub hostname: String,
    pub alias: String,
    /// Billing granularity used by the outer scheduler's economic model.
    pub time_unit: i64,
    pub cost_unit: f64,
    /// Tracked but not enforced here; capacity policy belongs to the caller.
    pub max_nodes: u32,
    pub speed_factor: String,
    pub image_id: i64,
    pub network_id: i64,
    pub mem: String,
    pub dns: String,
    pub gateway: String,
}

/// The same cluster description as a flat metadata record, the shape it has
/// in stored cluster catalogs. `ClusterConfig::from_metadata` and the scalar
/// constructor must agree field for field on equivalent inputs.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ClusterMetadata {
    pub hostname: String,
    pub alias: String,
    pub time_unit: i64,
    pub cost_unit: f64,
    pub max_nodes: u32,
    pub speed_factor: String,
    pub image_id: i64,
    pub network_id: i64,
    #[serde(default)]
    pub mem: String,
    #[serde(default)]
    pub dns: String,
    #[serde(default)]
    pub gateway: String,
}

fn or_default(value: &str, default: &str) -> String {
    if value.is_empty() {
        default.to_string()
    } else {
        value.to_string()
    }
}

impl ClusterConfig {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        hostname: &str,
        alias: &str,
        time_unit: i64,
        cost_unit: f64,
        max_nodes: u32,
        speed_factor: &str,
        image_id: i64,
        network_id: i64,
        mem: &str,
        dns: &str,
        gateway: &str,
    ) -> Self {
        Self {
            hostname: hostname.to_string(),
            alias: alias.to_string(),
            time_unit,
            cost_unit,
            max_nodes,
            speed_factor: speed_factor.to_string(),
            image_id,
            network_id,
            mem: or_default(mem, DEFAULT_MEM),
            dns: or_default(dns, DEFAULT_DNS),
            gateway: or_default(gateway, DEFAULT_GATEWAY),
        }
    }

    pub fn from_metadata(cm: &ClusterMetadata) -> Self {
        Self::new(
            &cm.hostname,
            &cm.alias,
            cm.time_unit,
            cm.cost_unit,
            cm.max_nodes,
            &cm.speed_factor,
            cm.image_id,
            cm.network_id,
            &cm.mem,
            &cm.dns,
            &cm.gateway,
        )
    }
}
