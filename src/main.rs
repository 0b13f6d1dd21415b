use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::Mutex;
use tracing::info;

use bot_node_provisioner::config::Settings;
use bot_node_provisioner::core::cluster::ClusterConfig;
use bot_node_provisioner::core::provider::{OneRpcClient, PoolSignalClient};
use bot_node_provisioner::core::provisioner::ClusterProvisioner;
use bot_node_provisioner::core::template::{Credentials, TemplateBuilder};
use bot_node_provisioner::{create_router, AppState};

#[derive(Parser, Debug)]
#[command(name = "bot-node-provisioner")]
#[command(about = "Node-provisioning adapter for an elastic bag-of-tasks worker pool")]
struct Args {
    /// Configuration directory (overrides CONFIG_PATH)
    #[arg(long)]
    config: Option<String>,

    /// Listen port (overrides server.port from the settings)
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();
    info!("Starting BoT node provisioner");

    let args = Args::parse();
    if let Some(path) = &args.config {
        std::env::set_var("CONFIG_PATH", path);
    }

    let settings = Settings::new()?;
    let config = ClusterConfig::from_metadata(&settings.cluster);
    let timeout = Duration::from_secs(settings.provider.request_timeout_secs);

    // Credentials are read once here; the template builder never touches
    // the filesystem again.
    let credentials = Credentials::load(
        &settings.provider.auth_file,
        &settings.provider.user_data_file,
    );
    let template = TemplateBuilder::new(
        credentials.clone(),
        &settings.provider.endpoint,
        &settings.provider.files_location_url,
    );

    let provider = Arc::new(OneRpcClient::new(
        &settings.provider.endpoint,
        &credentials.auth_content,
        timeout,
    )?);
    let pool = Arc::new(PoolSignalClient::new(&settings.pool.registry_url, timeout)?);

    let provisioner = ClusterProvisioner::new(
        config,
        template,
        provider,
        pool,
        settings.provider.public_ip_override.clone(),
    );

    let state = Arc::new(AppState {
        provisioner: Arc::new(Mutex::new(provisioner)),
    });

    let app = create_router(state);

    let port = args.port.unwrap_or(settings.server.port);
    let addr = format!("{}:{}", settings.server.host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
