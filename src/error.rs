use thiserror::Error;

use crate::merkle_tree::MAX_DEPTH;

/// Errors surfaced by the tree and the registry.
///
/// A duplicate registration is not an error: the registry returns the existing index instead.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("the tree is full, it holds at most {capacity} leaves")]
    CapacityExceeded { capacity: usize },

    #[error("no leaf has been assigned to index {index}, the tree holds {size} leaves")]
    IndexOutOfRange { index: usize, size: usize },

    #[error("{field} is not a valid field element: {reason}")]
    InputOutOfField { field: &'static str, reason: String },

    #[error("the tree depth must be between 1 and {max}, got {depth}", max = MAX_DEPTH)]
    InvalidDepth { depth: usize },

    #[error("persistence failure: {0}")]
    Persistence(#[from] PersistenceError),
}

/// Errors raised while writing or reading the ledger and the tree file.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("tree file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("ledger error: {0}")]
    Ledger(#[from] csv::Error),

    #[error("malformed record: {0}")]
    Malformed(String),

    #[error("the stored tree has depth {stored} but the registry is configured with depth {configured}")]
    DepthMismatch { stored: usize, configured: usize },

    #[error("the stored root {stored} does not match the root {computed} rebuilt from the stored leaves")]
    RootMismatch { stored: String, computed: String },
}

impl RegistryError {
    pub(crate) fn out_of_field(field: &'static str, reason: impl Into<String>) -> Self {
        RegistryError::InputOutOfField {
            field,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RegistryError>;
