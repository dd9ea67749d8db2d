use bitcoin::secp256k1::{
    PublicKey, Scalar, Secp256k1, SecretKey, Signing, Verification, XOnlyPublicKey,
};

use super::hash::{label_hash, shared_secret_hash};
use super::keys::{point_add, point_from_scalar, scalar_mul};
use crate::{Error, Result};

/// ECDH with an optional input hash folded into the secret side.
///
/// Sender: `(B_scan, a_sum)`. Receiver: `(A_sum, b_scan)`, or `(tweak, b_scan)`
/// with no input hash when the tweak already includes it.
pub fn shared_secret<C: Verification>(
    secp: &Secp256k1<C>,
    public_component: &PublicKey,
    secret_component: &SecretKey,
    input_hash: Option<&Scalar>,
) -> Result<PublicKey> {
    let secret = match input_hash {
        Some(input_hash) => scalar_mul(secret_component, input_hash)?,
        None => *secret_component,
    };

    Ok(public_component.mul_tweak(secp, &Scalar::from(secret))?)
}

/// `t_k = hash_BIP0352/SharedSecret(ser(shared_secret) || ser32(k))`
pub fn calculate_t_n(ecdh_shared_secret: &PublicKey, k: u32) -> Result<SecretKey> {
    let hash = shared_secret_hash(ecdh_shared_secret, k);

    SecretKey::from_slice(&hash).map_err(|_| Error::InvalidTweak("output"))
}

/// `P_k = B_spend + t_k·G`
pub fn calculate_P_n<C: Verification>(
    secp: &Secp256k1<C>,
    B_spend: &PublicKey,
    t_n: &SecretKey,
) -> Result<PublicKey> {
    Ok(B_spend.add_exp_tweak(secp, &Scalar::from(*t_n))?)
}

/// x-only output key for index `k`.
pub fn output_pubkey<C: Verification>(
    secp: &Secp256k1<C>,
    ecdh_shared_secret: &PublicKey,
    B_spend: &PublicKey,
    k: u32,
) -> Result<XOnlyPublicKey> {
    let t_k = calculate_t_n(ecdh_shared_secret, k)?;
    let P_k = calculate_P_n(secp, B_spend, &t_k)?;

    Ok(P_k.x_only_public_key().0)
}

/// `hash_BIP0352/Label(ser256(b_scan) || ser32(m))`
pub fn label_tweak(b_scan: &SecretKey, m: u32) -> Result<SecretKey> {
    SecretKey::from_slice(&label_hash(b_scan, m)).map_err(|_| Error::InvalidTweak("label"))
}

pub fn label_pubkey<C: Signing>(secp: &Secp256k1<C>, tweak: &SecretKey) -> PublicKey {
    point_from_scalar(secp, tweak)
}

/// `B_m = B_spend + label·G`
pub fn labeled_spend_pubkey(B_spend: &PublicKey, label_pubkey: &PublicKey) -> Result<PublicKey> {
    point_add(B_spend, label_pubkey)
}
