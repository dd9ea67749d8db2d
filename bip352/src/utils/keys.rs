//! Scalar and point arithmetic on secp256k1.
//!
//! Every function takes its operands by value or shared reference and returns a
//! fresh key. Callers that need the original keep their copy.
use bitcoin::secp256k1::{
    Parity, PublicKey, Scalar, Secp256k1, SecretKey, Signing, Verification, XOnlyPublicKey,
};

use crate::{Error, Result};

/// `a + b mod n`. Fails if the sum is zero.
pub fn scalar_add(a: &SecretKey, b: &SecretKey) -> Result<SecretKey> {
    Ok(a.add_tweak(&Scalar::from(*b))?)
}

/// `a * b mod n`. Fails if `b` is zero.
pub fn scalar_mul(a: &SecretKey, b: &Scalar) -> Result<SecretKey> {
    Ok(a.mul_tweak(b)?)
}

/// Returns `sk` if `pk` has an even y coordinate, `n - sk` otherwise.
pub fn negate_if_odd_y(sk: SecretKey, pk: &PublicKey) -> SecretKey {
    match pk.x_only_public_key().1 {
        Parity::Even => sk,
        Parity::Odd => sk.negate(),
    }
}

/// `P + Q`. Fails if the result is the point at infinity.
pub fn point_add(P: &PublicKey, Q: &PublicKey) -> Result<PublicKey> {
    Ok(P.combine(Q)?)
}

pub fn point_negate<C: Verification>(secp: &Secp256k1<C>, P: &PublicKey) -> PublicKey {
    P.negate(secp)
}

/// `k·G`
pub fn point_from_scalar<C: Signing>(secp: &Secp256k1<C>, k: &SecretKey) -> PublicKey {
    k.public_key(secp)
}

/// Parse a compressed point, or an x-only point lifted to even y.
pub fn parse_point(bytes: &[u8]) -> Result<PublicKey> {
    match bytes.len() {
        33 => Ok(PublicKey::from_slice(bytes)?),
        32 => Ok(XOnlyPublicKey::from_slice(bytes)?.public_key(Parity::Even)),
        len => Err(Error::InvalidPointLength(len)),
    }
}

pub fn serialize_point(P: &PublicKey) -> [u8; 33] {
    P.serialize()
}

/// Sum of secret keys, `a_sum` on the sending side.
pub fn sum_secret_keys(keys: &[SecretKey]) -> Result<SecretKey> {
    let (first, rest) = keys.split_first().ok_or(Error::NoEligibleInputs)?;

    rest.iter().try_fold(*first, |acc, sk| scalar_add(&acc, sk))
}

/// Sum of public keys, `A_sum` on the receiving side.
pub fn sum_public_keys(keys: &[PublicKey]) -> Result<PublicKey> {
    if keys.is_empty() {
        return Err(Error::NoEligibleInputs);
    }

    let refs: Vec<&PublicKey> = keys.iter().collect();
    Ok(PublicKey::combine_keys(&refs)?)
}
