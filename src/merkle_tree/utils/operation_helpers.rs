use std::sync::LazyLock;

use halo2_proofs::halo2curves::{bn256::Fr as Fp, group::ff::PrimeField};
use num_bigint::BigUint;

use crate::error::{RegistryError, Result};

static MODULUS: LazyLock<BigUint> = LazyLock::new(|| fp_to_big_uint(&-Fp::from(1)) + 1u32);

/// The order of the BN256 scalar field
pub fn field_modulus() -> &'static BigUint {
    &MODULUS
}

pub fn fp_to_big_uint(value: &Fp) -> BigUint {
    BigUint::from_bytes_le(value.to_repr().as_ref())
}

/// Converts a BigUint to a Field Element. Values at or above the modulus are rejected, never reduced.
pub fn big_uint_to_fp(value: &BigUint, field: &'static str) -> Result<Fp> {
    if value >= field_modulus() {
        return Err(RegistryError::out_of_field(
            field,
            format!("{value} is not below the field modulus"),
        ));
    }

    let bytes = value.to_bytes_le();
    let mut repr = <Fp as PrimeField>::Repr::default();
    repr.as_mut()[..bytes.len()].copy_from_slice(&bytes);

    Option::<Fp>::from(Fp::from_repr(repr))
        .ok_or_else(|| RegistryError::out_of_field(field, "non canonical encoding"))
}

/// Parses a base 10 integer string into a Field Element
pub fn decimal_to_fp(value: &str, field: &'static str) -> Result<Fp> {
    let big_uint = BigUint::parse_bytes(value.trim().as_bytes(), 10)
        .ok_or_else(|| RegistryError::out_of_field(field, format!("{value:?} is not a decimal integer")))?;
    big_uint_to_fp(&big_uint, field)
}

/// Interprets a big endian digest as an integer and reduces it into the field.
pub fn digest_to_fp(digest: &[u8]) -> Result<Fp> {
    big_uint_to_fp(&(BigUint::from_bytes_be(digest) % field_modulus()), "digest")
}

/// Canonical text encoding: lowercase hex, no prefix, no leading zeros.
pub fn fp_to_hex(value: &Fp) -> String {
    let mut bytes = value.to_repr().as_ref().to_vec();
    bytes.reverse();

    let encoded = hex::encode(bytes);
    match encoded.trim_start_matches('0') {
        "" => "0".to_string(),
        digits => digits.to_string(),
    }
}

/// Decodes a hex numeral, with or without a `0x` prefix, into a Field Element
pub fn hex_to_fp(value: &str, field: &'static str) -> Result<Fp> {
    let digits = value.strip_prefix("0x").unwrap_or(value);
    if digits.is_empty() {
        return Err(RegistryError::out_of_field(field, "empty hex string"));
    }

    let padded = if digits.len() % 2 == 1 {
        format!("0{digits}")
    } else {
        digits.to_string()
    };
    let bytes = hex::decode(padded)
        .map_err(|e| RegistryError::out_of_field(field, format!("{value:?} is not hex: {e}")))?;

    big_uint_to_fp(&BigUint::from_bytes_be(&bytes), field)
}
