use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use regulator::merkle_tree::{TreeConfig, TREE_DEPTH};
use thiserror::Error;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 9789;
pub const DEFAULT_LEDGER_PATH: &str = "registered_users.txt";
pub const DEFAULT_TREE_PATH: &str = "merkle_tree.json";

#[derive(Debug, Clone)]
pub struct RegulatorConfig {
    pub host: IpAddr,
    pub port: u16,
    /// Append-only record of registrations, one `name pid leaf_index` line each.
    pub ledger_path: PathBuf,
    /// JSON snapshot of the tree, rewritten after every registration.
    pub tree_path: PathBuf,
    pub tree: TreeConfig,
}

impl RegulatorConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let host_str = env_or("REGULATOR_HOST", DEFAULT_HOST);
        let host = host_str
            .parse()
            .map_err(|e| ConfigError::InvalidHost(format!("{}: {}", host_str, e)))?;

        let port_str = env_or("REGULATOR_PORT", &DEFAULT_PORT.to_string());
        let port = port_str
            .parse()
            .map_err(|e| ConfigError::InvalidPort(format!("{}: {}", port_str, e)))?;

        let depth_str = env_or("REGULATOR_TREE_DEPTH", &TREE_DEPTH.to_string());
        let depth = depth_str
            .parse()
            .map_err(|e| ConfigError::InvalidTreeDepth(format!("{}: {}", depth_str, e)))?;
        let tree = TreeConfig::new(depth)
            .map_err(|e| ConfigError::InvalidTreeDepth(e.to_string()))?;

        let config = Self {
            host,
            port,
            ledger_path: env_or("REGULATOR_LEDGER_PATH", DEFAULT_LEDGER_PATH).into(),
            tree_path: env_or("REGULATOR_TREE_PATH", DEFAULT_TREE_PATH).into(),
            tree,
        };

        tracing::info!(
            addr = %config.addr(),
            depth = config.tree.depth(),
            "regulator config loaded from env"
        );
        Ok(config)
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl Default for RegulatorConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: DEFAULT_PORT,
            ledger_path: DEFAULT_LEDGER_PATH.into(),
            tree_path: DEFAULT_TREE_PATH.into(),
            tree: TreeConfig::default(),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid REGULATOR_HOST: {0}")]
    InvalidHost(String),
    #[error("invalid REGULATOR_PORT: {0}")]
    InvalidPort(String),
    #[error("invalid REGULATOR_TREE_DEPTH: {0}")]
    InvalidTreeDepth(String),
}
