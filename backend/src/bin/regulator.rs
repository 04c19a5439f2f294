use regulator_backend::{config::RegulatorConfig, open_registry, serve};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = RegulatorConfig::from_env()?;
    let registry = open_registry(&config)?;
    tracing::info!(
        leaves = registry.size(),
        ledger = %config.ledger_path.display(),
        tree = %config.tree_path.display(),
        "registry ready"
    );

    let listener = TcpListener::bind(config.addr()).await?;
    tracing::info!("Started listening on {}", listener.local_addr()?);

    serve(listener, registry).await?;
    Ok(())
}
