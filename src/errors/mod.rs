use thiserror::Error;

/// A single allocation attempt was rejected by the provider. Per-node and
/// non-fatal: the provisioning loop records it and moves on to the next slot.
#[derive(Error, Debug, Clone)]
#[error("allocation rejected: {message}")]
pub struct AllocationError {
    pub message: String,
}

impl AllocationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A signal could not be delivered through the communication pool.
/// Always propagated to the caller, never swallowed.
#[derive(Error, Debug)]
pub enum CommunicationFailure {
    #[error("node {0} is not a member of the communication pool")]
    UnknownMember(String),

    #[error("signal delivery to {node} failed: {message}")]
    Delivery { node: String, message: String },
}

#[derive(Error, Debug)]
pub enum ProvisionError {
    /// Fatal: the provider client could not be constructed. Aborts a batch
    /// before any allocation is attempted.
    #[error("provider configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Allocation(#[from] AllocationError),

    #[error(transparent)]
    Communication(#[from] CommunicationFailure),

    /// Hard teardown asked for a location the registry never recorded.
    #[error("no node registered at location {0}")]
    UnknownLocation(String),
}
