//! BIP340 style tagged hashes used by BIP352.
use bitcoin::secp256k1::{PublicKey, SecretKey};
use bitcoin_hashes::{hash160, sha256, Hash, HashEngine};

use crate::constants::{INPUTS_TAG, LABEL_TAG, OUTPOINT_SIZE, SHARED_SECRET_TAG};

fn tagged_engine(tag: &str) -> sha256::HashEngine {
    let tag_hash = sha256::Hash::hash(tag.as_bytes());

    let mut engine = sha256::Hash::engine();
    engine.input(tag_hash.as_ref());
    engine.input(tag_hash.as_ref());
    engine
}

/// `SHA256(SHA256(tag) || SHA256(tag) || data)`
pub fn tagged_hash(tag: &str, data: &[u8]) -> [u8; 32] {
    let mut engine = tagged_engine(tag);
    engine.input(data);
    sha256::Hash::from_engine(engine).to_byte_array()
}

/// `hash_BIP0352/Inputs(outpoint_L || ser(A_sum))`
pub(crate) fn inputs_hash(smallest_outpoint: &[u8; OUTPOINT_SIZE], A_sum: &PublicKey) -> [u8; 32] {
    let mut engine = tagged_engine(INPUTS_TAG);
    engine.input(smallest_outpoint);
    engine.input(&A_sum.serialize());
    sha256::Hash::from_engine(engine).to_byte_array()
}

/// `hash_BIP0352/SharedSecret(ser(ecdh_shared_secret) || ser32(k))`
pub(crate) fn shared_secret_hash(ecdh_shared_secret: &PublicKey, k: u32) -> [u8; 32] {
    let mut engine = tagged_engine(SHARED_SECRET_TAG);
    engine.input(&ecdh_shared_secret.serialize());
    engine.input(&k.to_be_bytes());
    sha256::Hash::from_engine(engine).to_byte_array()
}

/// `hash_BIP0352/Label(ser256(b_scan) || ser32(m))`
pub(crate) fn label_hash(b_scan: &SecretKey, m: u32) -> [u8; 32] {
    let mut engine = tagged_engine(LABEL_TAG);
    engine.input(&b_scan.secret_bytes());
    engine.input(&m.to_be_bytes());
    sha256::Hash::from_engine(engine).to_byte_array()
}

pub(crate) fn hash160(data: &[u8]) -> [u8; 20] {
    hash160::Hash::hash(data).to_byte_array()
}
