//! Transaction inputs and the values derived from the whole input set.
use bitcoin::consensus::serialize;
use bitcoin::secp256k1::{PublicKey, Scalar, Secp256k1, SecretKey, Verification};
use bitcoin::{OutPoint, ScriptBuf, Witness};
use log::debug;

use crate::constants::OUTPOINT_SIZE;
use crate::utils::hash::inputs_hash;
use crate::utils::keys::sum_public_keys;
use crate::utxo::{classify_input, Eligibility, InputKey, SkipReason};
use crate::{Error, Result};

/// An input of the transaction being built or scanned.
#[derive(Debug, Clone)]
pub struct Vin {
    pub outpoint: OutPoint,
    /// Script of the output this input spends.
    pub script_pubkey: ScriptBuf,
    pub script_sig: ScriptBuf,
    pub witness: Witness,
    pub public_key: Option<PublicKey>,
    /// Only known to the sender.
    pub secret_key: Option<SecretKey>,
    pub taproot: bool,
}

impl Vin {
    pub fn new(
        outpoint: OutPoint,
        script_pubkey: ScriptBuf,
        script_sig: ScriptBuf,
        witness: Witness,
    ) -> Self {
        Self {
            outpoint,
            script_pubkey,
            script_sig,
            witness,
            public_key: None,
            secret_key: None,
            taproot: false,
        }
    }

    /// An input whose key is already known, for callers that vetted it themselves.
    pub fn from_key(outpoint: OutPoint, public_key: PublicKey, taproot: bool) -> Self {
        Self {
            public_key: Some(public_key),
            taproot,
            ..Self::new(outpoint, ScriptBuf::new(), ScriptBuf::new(), Witness::new())
        }
    }

    pub fn with_secret_key(mut self, secret_key: SecretKey) -> Self {
        self.secret_key = Some(secret_key);
        self
    }

    pub fn classify(&self) -> Eligibility<InputKey> {
        classify_input(&self.script_pubkey, &self.script_sig, &self.witness)
    }

    /// Copy of this input with the classification result recorded on it.
    pub fn classified(&self) -> Option<Vin> {
        let key = self.classify().eligible()?;

        Some(Vin {
            public_key: Some(key.pubkey),
            taproot: key.is_taproot(),
            ..self.clone()
        })
    }
}

/// `txid || vout` with the txid in internal byte order and `vout` little-endian.
pub fn serialize_outpoint(outpoint: &OutPoint) -> [u8; OUTPOINT_SIZE] {
    let mut res = [0u8; OUTPOINT_SIZE];
    res.copy_from_slice(&serialize(outpoint));
    res
}

/// The lexicographically smallest serialized outpoint.
pub fn smallest_outpoint(outpoints: &[OutPoint]) -> Result<[u8; OUTPOINT_SIZE]> {
    outpoints
        .iter()
        .map(serialize_outpoint)
        .min()
        .ok_or(Error::EmptyInputs)
}

/// `input_hash` over all outpoints of the transaction and the sum of the eligible keys.
pub fn input_hash(outpoints: &[OutPoint], A_sum: &PublicKey) -> Result<Scalar> {
    let outpoint_L = smallest_outpoint(outpoints)?;
    let hash = inputs_hash(&outpoint_L, A_sum);

    Scalar::from_be_bytes(hash).map_err(|_| Error::InvalidInputHash)
}

/// What a receiver needs from a transaction's inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputData {
    pub pubkey_sum: PublicKey,
    pub input_hash: Scalar,
}

impl InputData {
    /// `input_hash·A_sum`, usable as the public component of a shared secret
    /// without passing the input hash again.
    pub fn tweak<C: Verification>(&self, secp: &Secp256k1<C>) -> Result<PublicKey> {
        Ok(self.pubkey_sum.mul_tweak(secp, &self.input_hash)?)
    }
}

/// Classify `vins`, sum the eligible public keys and hash the input set.
pub fn compute_input_data(vins: &[Vin]) -> Result<Eligibility<InputData>> {
    let pubkeys: Vec<PublicKey> = vins
        .iter()
        .filter_map(|vin| vin.classify().eligible())
        .map(|key| key.pubkey)
        .collect();

    debug!("{} of {} inputs eligible", pubkeys.len(), vins.len());

    if pubkeys.is_empty() {
        return Ok(Eligibility::Skip(SkipReason::NoEligibleInputs));
    }

    let pubkey_sum = sum_public_keys(&pubkeys)?;
    let outpoints: Vec<OutPoint> = vins.iter().map(|vin| vin.outpoint).collect();
    let input_hash = input_hash(&outpoints, &pubkey_sum)?;

    Ok(Eligibility::Eligible(InputData {
        pubkey_sum,
        input_hash,
    }))
}
