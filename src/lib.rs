//! This crate contains the accumulator engine of the identity regulator.
//! Registered identities are committed as leaves of a fixed-depth Poseidon Merkle tree over the BN256 scalar field,
//! and every registration yields an inclusion proof that a downstream zk circuit can consume.

/// Field hash used by the tree. Poseidon over BN256 by default.
pub mod poseidon;
/// Errors returned by the accumulator, the registry and the persistence layer.
pub mod error;
/// The incremental Merkle tree, leaf derivation and proof verification. No I/O in here.
pub mod merkle_tree;
/// Deduplication ledger, tree persistence and the registry that ties them to the tree.
pub mod registry;

pub use error::{PersistenceError, RegistryError};
