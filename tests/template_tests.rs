// Template builder, cluster config and wire codec tests. Everything here is
// pure, so no mocks and no runtime needed.

use std::io::Write;
use std::path::Path;

use anyhow::Result;

use bot_node_provisioner::core::cluster::{
    ClusterConfig, ClusterMetadata, DEFAULT_DNS, DEFAULT_GATEWAY, DEFAULT_MEM,
};
use bot_node_provisioner::core::provider::wire;
use bot_node_provisioner::core::template::{Credentials, TemplateBuilder};

fn metadata() -> ClusterMetadata {
    ClusterMetadata {
        hostname: "cloud.test".to_string(),
        alias: "one".to_string(),
        time_unit: 3600,
        cost_unit: 0.12,
        max_nodes: 5,
        speed_factor: "2".to_string(),
        image_id: 7,
        network_id: 9,
        mem: "1024".to_string(),
        dns: "8.8.8.8".to_string(),
        gateway: "10.1.0.1".to_string(),
    }
}

#[test]
fn test_scalar_and_metadata_construction_agree() -> Result<()> {
    let cm = metadata();
    let from_scalars = ClusterConfig::new(
        "cloud.test", "one", 3600, 0.12, 5, "2", 7, 9, "1024", "8.8.8.8", "10.1.0.1",
    );
    let from_metadata = ClusterConfig::from_metadata(&cm);

    // Field-for-field equivalence, via the serialized form.
    assert_eq!(
        serde_json::to_value(&from_scalars)?,
        serde_json::to_value(&from_metadata)?
    );
    Ok(())
}

#[test]
fn test_empty_fields_fall_back_to_defaults() {
    let config = ClusterConfig::new("h", "a", 1, 0.0, 0, "1", 1, 1, "", "", "");
    assert_eq!(config.mem, DEFAULT_MEM);
    assert_eq!(config.dns, DEFAULT_DNS);
    assert_eq!(config.gateway, DEFAULT_GATEWAY);
}

#[test]
fn test_speed_factor_passes_through_unmodified() {
    // Opaque to this layer: whatever the catalog says, the template gets.
    let config = ClusterConfig::new("h", "a", 1, 0.0, 0, "0.75", 1, 1, "", "", "");
    let builder = TemplateBuilder::new(Credentials::default(), "http://e", "http://m");
    let blob = builder.build(&config, "node0@a", "e1", "p1", "10.0.0.1:5000");
    assert!(blob.contains("CPU = 0.75\n"));
    assert!(blob.contains("SPEEDFACTOR=\"0.75\""));
}

#[test]
fn test_template_is_deterministic_and_complete() {
    let config = ClusterConfig::from_metadata(&metadata());
    let credentials = Credentials {
        auth_content: "user:token".to_string(),
        user_data_hex: "deadbeef\n".to_string(),
    };
    let builder = TemplateBuilder::new(
        credentials,
        "http://cloud.test:2633/RPC2",
        "http://files.test/bot",
    );

    let first = builder.build(&config, "node0@one", "e1", "p1", "10.0.0.1:5000");
    let second = builder.build(&config, "node0@one", "e1", "p1", "10.0.0.1:5000");
    assert_eq!(first, second);

    for expected in [
        "MEMORY = 1024",
        "IMAGE_ID  = 7,",
        "NETWORK_ID = 9",
        "nameserver        = 8.8.8.8,",
        "ip_gateway    = 10.1.0.1,",
        "LOCATION=\"node0@one\"",
        "ELECTIONNAME=\"e1\"",
        "POOLNAME=\"p1\"",
        "SERVERADDRESS=\"10.0.0.1:5000\"",
        "MOUNTURL=\"http://files.test/bot\"",
        "ONE_XMLRPC=\"http://cloud.test:2633/RPC2\"",
        "ONE_AUTH_CONTENT=\"user:token\"",
        // Resolved by the provider at instantiation time.
        "VM_ID = \"$VMID\"",
        "USERDATA = \"deadbeef\n\"",
    ] {
        assert!(first.contains(expected), "template missing {expected:?}");
    }
}

#[test]
fn test_missing_credential_files_render_empty() {
    let credentials = Credentials::load(
        Path::new("/nonexistent/one_auth"),
        Path::new("/nonexistent/user_data.hex"),
    );
    assert_eq!(credentials.auth_content, "");
    assert_eq!(credentials.user_data_hex, "");

    let config = ClusterConfig::from_metadata(&metadata());
    let builder = TemplateBuilder::new(credentials, "http://e", "http://m");
    let blob = builder.build(&config, "node0@one", "e1", "p1", "10.0.0.1:5000");
    assert!(blob.contains("ONE_AUTH_CONTENT=\"\""));
    assert!(blob.contains("USERDATA = \"\""));
}

#[test]
fn test_auth_file_contributes_first_line_only() -> Result<()> {
    let mut auth = tempfile::NamedTempFile::new()?;
    writeln!(auth, "user:token")?;
    writeln!(auth, "trailing junk")?;
    let mut hex = tempfile::NamedTempFile::new()?;
    write!(hex, "cafe\nbabe\n")?;

    let credentials = Credentials::load(auth.path(), hex.path());
    assert_eq!(credentials.auth_content, "user:token");
    assert_eq!(credentials.user_data_hex, "cafe\nbabe\n");
    Ok(())
}

#[test]
fn test_wire_escapes_template_payload() {
    let call = wire::allocate_call("user:token", "DATA = \"<x & y>\"");
    assert!(call.contains("one.vm.allocate"));
    assert!(call.contains("&lt;x &amp; y&gt;"));
    assert!(!call.contains("<x & y>"));
}

#[test]
fn test_wire_parses_allocate_success() {
    let body = "<?xml version=\"1.0\"?><methodResponse><params><param><value><array><data>\
                <value><boolean>1</boolean></value>\
                <value><i4>42</i4></value>\
                <value><i4>0</i4></value>\
                </data></array></value></param></params></methodResponse>";
    assert_eq!(wire::parse_response(body).unwrap(), "42");
}

#[test]
fn test_wire_parses_provider_rejection() {
    let body = "<?xml version=\"1.0\"?><methodResponse><params><param><value><array><data>\
                <value><boolean>0</boolean></value>\
                <value><string>quota exceeded</string></value>\
                <value><i4>255</i4></value>\
                </data></array></value></param></params></methodResponse>";
    let err = wire::parse_response(body).unwrap_err();
    assert_eq!(err.message, "quota exceeded");
}
