use std::sync::Arc;

use halo2_proofs::halo2curves::bn256::Fr as Fp;
use parking_lot::{RwLock, RwLockReadGuard};

use super::{FileLedger, Ledger, Registration, Registry};
use crate::error::Result;
use crate::merkle_tree::{Entry, MerkleProof};

/// Thread-safe handle to a [`Registry`].
///
/// Registrations run one at a time under the write lock, covering the ledger lookup, the insertion,
/// the save and the ledger append. Proofs and roots are served under the read lock.
pub struct SharedRegistry<L: Ledger = FileLedger> {
    inner: Arc<RwLock<Registry<L>>>,
}

impl<L: Ledger> SharedRegistry<L> {
    pub fn new(registry: Registry<L>) -> Self {
        SharedRegistry {
            inner: Arc::new(RwLock::new(registry)),
        }
    }

    pub fn register_entry(&self, entry: Entry) -> Result<Registration> {
        self.inner.write().register_entry(entry)
    }

    pub fn proof_for(&self, index: usize) -> Result<MerkleProof> {
        self.inner.read().proof_for(index)
    }

    pub fn root(&self) -> Fp {
        self.inner.read().root()
    }

    pub fn size(&self) -> usize {
        self.inner.read().size()
    }

    pub fn persist(&self) -> Result<()> {
        self.inner.write().persist()
    }

    /// Read access to the whole registry, for reads that must see a single state.
    pub fn read(&self) -> RwLockReadGuard<'_, Registry<L>> {
        self.inner.read()
    }
}

impl<L: Ledger> Clone for SharedRegistry<L> {
    fn clone(&self) -> Self {
        SharedRegistry {
            inner: Arc::clone(&self.inner),
        }
    }
}
