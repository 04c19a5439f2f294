mod build_tree;
mod operation_helpers;
mod proof_verification;

pub use build_tree::{build_levels, compute_root, zero_hashes};
pub use operation_helpers::*;
pub use proof_verification::verify_proof;
