use std::fs;
use std::path::Path;

use tracing::warn;

use crate::core::cluster::ClusterConfig;

/// The two immutable credential artifacts embedded into every node template:
/// the provider auth token (first line of the auth file) and the hex-encoded
/// user-data payload the worker image executes at boot.
///
/// A missing or unreadable artifact degrades to an empty substitution — the
/// node still boots, it just cannot call back into the provider. Read
/// failures are logged once, at load time.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub auth_content: String,
    pub user_data_hex: String,
}

impl Credentials {
    pub fn load(auth_file: &Path, hex_file: &Path) -> Self {
        Self {
            auth_content: read_first_line(auth_file),
            user_data_hex: read_all(hex_file),
        }
    }
}

fn read_first_line(path: &Path) -> String {
    match fs::read_to_string(path) {
        Ok(content) => content.lines().next().unwrap_or("").to_string(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "auth file unreadable, rendering empty auth token");
            String::new()
        }
    }
}

fn read_all(path: &Path) -> String {
    match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "user-data file unreadable, rendering empty payload");
            String::new()
        }
    }
}

/// Renders the provider's key/value startup template for one node. Pure:
/// all inputs are captured at construction or passed in, so identical inputs
/// always produce an identical blob.
#[derive(Debug, Clone)]
pub struct TemplateBuilder {
    credentials: Credentials,
    /// RPC endpoint handed to the node so it can call the provider itself.
    endpoint: String,
    /// URL the worker mounts to fetch its task input files.
    mount_url: String,
}

impl TemplateBuilder {
    pub fn new(credentials: Credentials, endpoint: &str, mount_url: &str) -> Self {
        Self {
            credentials,
            endpoint: endpoint.to_string(),
            mount_url: mount_url.to_string(),
        }
    }

    /// `$VMID` is left for the provider to resolve at instantiation time;
    /// it becomes the node's own instance id inside the guest context.
    pub fn build(
        &self,
        config: &ClusterConfig,
        location: &str,
        election_name: &str,
        pool_name: &str,
        coordinator_address: &str,
    ) -> String {
        format!(
            "NAME = BoTSVM\n\
             CPU = {speed}\n\
             MEMORY = {mem}\n\n\
             OS     = [\n\
             arch = x86_64\n\
             ]\n\n\
             DISK   = [\n\
             IMAGE_ID  = {image_id},\n\
             target  = \"sda\"\n\
             ]\n\n\
             NIC    = [\n\
             NETWORK_ID = {network_id}\n\
             ]\n\n\
             GRAPHICS = [\n\
             TYPE    = \"vnc\",\n\
             LISTEN  = \"0.0.0.0\"\n\
             ]\n\n\
             FEATURES = [\n\
             acpi=\"yes\"\n\
             ]\n\n\
             RAW = [\n\
             type = \"kvm\",\n\
             data = \" <serial type='pty'> <source path='/dev/pts/3'/> <target port='1'/> </serial>\"\n\
             ]\n\n\
             CONTEXT = [\n\
             hostname   = \"$NAME\",\n\
             nameserver        = {dns},\n\
             ip_gateway    = {gateway},\n\
             ip_public  = \"$NIC[IP]\",\n\
             LOCATION=\"{location}\",\n\
             ELECTIONNAME=\"{election}\",\n\
             POOLNAME=\"{pool}\",\n\
             SERVERADDRESS=\"{coordinator}\",\n\
             SPEEDFACTOR=\"{speed}\",\n\
             MOUNTURL=\"{mount_url}\",\n\
             ONE_XMLRPC=\"{endpoint}\",\n\
             ONE_AUTH_CONTENT=\"{auth}\",\n\
             VM_ID = \"$VMID\",\n\
             USERDATA = \"{user_data}\",\n\
             target = \"sdb\"\n\
             ]\n",
            speed = config.speed_factor,
            mem = config.mem,
            image_id = config.image_id,
            network_id = config.network_id,
            dns = config.dns,
            gateway = config.gateway,
            location = location,
            election = election_name,
            pool = pool_name,
            coordinator = coordinator_address,
            mount_url = self.mount_url,
            endpoint = self.endpoint,
            auth = self.credentials.auth_content,
            user_data = self.credentials.user_data_hex,
        )
    }
}
