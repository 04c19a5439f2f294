use halo2_proofs::halo2curves::bn256::Fr as Fp;
use num_bigint::BigUint;
use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::merkle_tree::utils::{big_uint_to_fp, decimal_to_fp, digest_to_fp};
use crate::poseidon::FieldHasher;

/// An identity submitted to the regulator.
/// It contains the name, the personal identification number (PID) and the public key of the user.
///
/// The name may be arbitrarily long: it enters the leaf through its SHA-256 digest, reduced into the field,
/// so that the field hash only ever sees four field elements.
#[derive(Clone, Debug)]
pub struct Entry {
    name: String,
    name_digest: Fp,
    pid: u64,
    pub_x: Fp,
    pub_y: Fp,
}

impl Entry {
    /// Fails with `InputOutOfField` when a public key coordinate is not below the field modulus.
    pub fn new(name: String, pid: u64, pub_x: &BigUint, pub_y: &BigUint) -> Result<Self> {
        Ok(Entry {
            name_digest: name_to_fp(&name)?,
            pid,
            pub_x: big_uint_to_fp(pub_x, "pub_x")?,
            pub_y: big_uint_to_fp(pub_y, "pub_y")?,
            name,
        })
    }

    /// Same as [`Entry::new`] with the public key coordinates given as base 10 strings.
    pub fn from_decimal(name: String, pid: u64, pub_x: &str, pub_y: &str) -> Result<Self> {
        Ok(Entry {
            name_digest: name_to_fp(&name)?,
            pid,
            pub_x: decimal_to_fp(pub_x, "pub_x")?,
            pub_y: decimal_to_fp(pub_y, "pub_y")?,
            name,
        })
    }

    /// H(sha256(name), pid, pub_x, pub_y)
    pub fn compute_leaf<H: FieldHasher + ?Sized>(&self, hasher: &H) -> Fp {
        hasher.hash_entry([self.name_digest, Fp::from(self.pid), self.pub_x, self.pub_y])
    }

    // Getters
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn name_digest(&self) -> &Fp {
        &self.name_digest
    }

    pub fn pid(&self) -> u64 {
        self.pid
    }

    pub fn pub_x(&self) -> &Fp {
        &self.pub_x
    }

    pub fn pub_y(&self) -> &Fp {
        &self.pub_y
    }
}

fn name_to_fp(name: &str) -> Result<Fp> {
    digest_to_fp(&Sha256::digest(name.as_bytes()))
}
