pub mod apis;
pub mod config;

use std::sync::Arc;

use regulator::{
    poseidon::Poseidon,
    registry::{FileLedger, Registry, SharedRegistry},
    RegistryError,
};
use tokio::net::TcpListener;

use crate::apis::{router, AppState};
use crate::config::RegulatorConfig;

/// Opens the registry described by `config`, rebuilding the tree from its file when one exists.
pub fn open_registry(config: &RegulatorConfig) -> Result<SharedRegistry, RegistryError> {
    let registry = Registry::open(
        config.tree,
        Arc::new(Poseidon),
        FileLedger::new(&config.ledger_path),
        &config.tree_path,
    )?;
    Ok(SharedRegistry::new(registry))
}

/// Serves the HTTP API on `listener` until the process stops.
pub async fn serve(listener: TcpListener, registry: SharedRegistry) -> std::io::Result<()> {
    let app = router(AppState::new(registry));
    axum::serve(listener, app).await
}
