use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info};

use crate::errors::{AllocationError, CommunicationFailure, ProvisionError};

/// The backing infrastructure provider, reduced to the two calls the
/// provisioning loop needs. Injected at construction so the provisioner
/// never reaches into the environment to rebuild a client.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Submits a rendered startup template, returning the provider-assigned
    /// instance id for the new node.
    async fn allocate(&self, template: &str) -> Result<String, AllocationError>;

    /// Hard-terminates a previously allocated instance.
    async fn terminate(&self, instance_id: &str) -> Result<(), AllocationError>;
}

/// The distributed communication pool's membership registry, reduced to
/// signal delivery. Soft termination goes through here, not the provider.
#[async_trait]
pub trait PoolRegistry: Send + Sync {
    async fn signal(&self, node_identity: &str, message: &str)
        -> Result<(), CommunicationFailure>;
}

/// Minimal XML-RPC framing for the provider endpoint. Only the two calls
/// this adapter issues are encoded; responses are the provider's fixed
/// `[boolean, value, errno]` array shape.
pub mod wire {
    use crate::errors::AllocationError;

    pub fn escape(raw: &str) -> String {
        raw.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
    }

    pub fn allocate_call(session: &str, template: &str) -> String {
        format!(
            "<?xml version=\"1.0\"?>\
             <methodCall><methodName>one.vm.allocate</methodName><params>\
             <param><value><string>{}</string></value></param>\
             <param><value><string>{}</string></value></param>\
             </params></methodCall>",
            escape(session),
            escape(template)
        )
    }

    pub fn action_call(session: &str, action: &str, instance_id: i64) -> String {
        format!(
            "<?xml version=\"1.0\"?>\
             <methodCall><methodName>one.vm.action</methodName><params>\
             <param><value><string>{}</string></value></param>\
             <param><value><string>{}</string></value></param>\
             <param><value><i4>{}</i4></value></param>\
             </params></methodCall>",
            escape(session),
            escape(action),
            instance_id
        )
    }

    fn text_between<'a>(body: &'a str, open: &str, close: &str) -> Option<&'a str> {
        let start = body.find(open)? + open.len();
        let end = body[start..].find(close)? + start;
        Some(&body[start..end])
    }

    /// Extracts the payload value from a provider response. On success the
    /// payload is the new instance id (allocate) or empty (action); on
    /// failure it is the provider's error message.
    pub fn parse_response(body: &str) -> Result<String, AllocationError> {
        if body.contains("<boolean>1</boolean>") {
            // Success payload is the instance id, an i4 (or empty for actions).
            let payload = text_between(body, "<i4>", "</i4>")
                .or_else(|| text_between(body, "<int>", "</int>"))
                .or_else(|| text_between(body, "<string>", "</string>"))
                .unwrap_or("");
            Ok(payload.trim().to_string())
        } else {
            // Failure payload is the message string; the trailing i4 is errno.
            let message = text_between(body, "<string>", "</string>")
                .unwrap_or("malformed provider response");
            Err(AllocationError::new(message.trim()))
        }
    }
}

/// XML-RPC client for an OpenNebula-style provider endpoint. The session
/// token is the auth file content; every call carries it.
pub struct OneRpcClient {
    http: reqwest::Client,
    endpoint: reqwest::Url,
    session: String,
}

impl OneRpcClient {
    pub fn new(endpoint: &str, session: &str, timeout: Duration) -> Result<Self, ProvisionError> {
        if endpoint.is_empty() {
            return Err(ProvisionError::Configuration(
                "provider RPC endpoint is not set".to_string(),
            ));
        }
        let endpoint = reqwest::Url::parse(endpoint).map_err(|e| {
            ProvisionError::Configuration(format!("invalid provider endpoint {endpoint}: {e}"))
        })?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProvisionError::Configuration(e.to_string()))?;
        info!(endpoint = %endpoint, "provider client initialized");
        Ok(Self {
            http,
            endpoint,
            session: session.to_string(),
        })
    }

    async fn call(&self, body: String) -> Result<String, AllocationError> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .header("Content-Type", "text/xml")
            .body(body)
            .send()
            .await
            .map_err(|e| AllocationError::new(e.to_string()))?;
        let text = response
            .text()
            .await
            .map_err(|e| AllocationError::new(e.to_string()))?;
        debug!(bytes = text.len(), "provider response received");
        wire::parse_response(&text)
    }
}

#[async_trait]
impl ProviderClient for OneRpcClient {
    async fn allocate(&self, template: &str) -> Result<String, AllocationError> {
        self.call(wire::allocate_call(&self.session, template)).await
    }

    async fn terminate(&self, instance_id: &str) -> Result<(), AllocationError> {
        let id: i64 = instance_id
            .parse()
            .map_err(|_| AllocationError::new(format!("non-numeric instance id {instance_id}")))?;
        self.call(wire::action_call(&self.session, "terminate", id))
            .await
            .map(|_| ())
    }
}

/// Delivers signals to pool members over the coordinator's registry HTTP
/// surface. A 404 from the registry means the identity was never a member.
pub struct PoolSignalClient {
    http: reqwest::Client,
    registry_url: reqwest::Url,
}

impl PoolSignalClient {
    pub fn new(registry_url: &str, timeout: Duration) -> Result<Self, ProvisionError> {
        let registry_url = reqwest::Url::parse(registry_url).map_err(|e| {
            ProvisionError::Configuration(format!("invalid pool registry URL {registry_url}: {e}"))
        })?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProvisionError::Configuration(e.to_string()))?;
        Ok(Self { http, registry_url })
    }
}

#[async_trait]
impl PoolRegistry for PoolSignalClient {
    async fn signal(
        &self,
        node_identity: &str,
        message: &str,
    ) -> Result<(), CommunicationFailure> {
        let url = self
            .registry_url
            .join("signal")
            .map_err(|e| CommunicationFailure::Delivery {
                node: node_identity.to_string(),
                message: e.to_string(),
            })?;
        let response = self
            .http
            .post(url)
            .json(&json!({ "node": node_identity, "message": message }))
            .send()
            .await
            .map_err(|e| CommunicationFailure::Delivery {
                node: node_identity.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else if status == reqwest::StatusCode::NOT_FOUND {
            Err(CommunicationFailure::UnknownMember(
                node_identity.to_string(),
            ))
        } else {
            Err(CommunicationFailure::Delivery {
                node: node_identity.to_string(),
                message: format!("registry returned {status}"),
            })
        }
    }
}
