use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, post};
use axum::{Json, Router};
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::error::ErrorResponse;
use crate::core::provisioner::{
    ClusterProvisioner, NodeRegistration, ProvisionOutcome, ProvisionRequest,
};

#[derive(Clone)]
pub struct AppState {
    pub provisioner: Arc<Mutex<ClusterProvisioner>>,
}

/// POST   /api/v1/nodes                        - provision a batch of workers
/// GET    /api/v1/nodes                        - list the registry
/// POST   /api/v1/nodes/{identity}/terminate   - soft-kill via the pool
/// DELETE /api/v1/nodes/{location}             - hard-deallocate the instance
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/api/v1/nodes",
            post(provision_nodes).get(list_nodes),
        )
        .route("/api/v1/nodes/{identity}/terminate", post(terminate_node))
        .route("/api/v1/nodes/{location}", delete(deallocate_node))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn provision_nodes(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ProvisionRequest>,
) -> Json<ProvisionOutcome> {
    let mut provisioner = state.provisioner.lock().await;
    let outcome = provisioner.start_nodes(&request).await;
    info!(
        started = outcome.started,
        failed = outcome.failed,
        "provision batch finished"
    );
    Json(outcome)
}

async fn list_nodes(State(state): State<Arc<AppState>>) -> Json<Vec<NodeRegistration>> {
    let provisioner = state.provisioner.lock().await;
    Json(provisioner.nodes())
}

async fn terminate_node(
    State(state): State<Arc<AppState>>,
    Path(identity): Path<String>,
) -> Result<StatusCode, ErrorResponse> {
    let provisioner = state.provisioner.lock().await;
    provisioner.terminate_node(&identity).await?;
    Ok(StatusCode::ACCEPTED)
}

async fn deallocate_node(
    State(state): State<Arc<AppState>>,
    Path(location): Path<String>,
) -> Result<StatusCode, ErrorResponse> {
    let mut provisioner = state.provisioner.lock().await;
    provisioner.deallocate(&location).await?;
    Ok(StatusCode::NO_CONTENT)
}
