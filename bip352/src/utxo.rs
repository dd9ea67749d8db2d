//! Classification of spent outputs.
//!
//! Only inputs spending one of four output types contribute a key to the shared
//! secret. Everything else is skipped, which is not an error.
use bitcoin::secp256k1::{Parity, PublicKey, XOnlyPublicKey};
use bitcoin::{Script, ScriptBuf, Witness};
use log::trace;

use crate::constants::{ANNEX_TAG, NUMS_H};
use crate::utils::hash::hash160;

const COMPRESSED_KEY_SIZE: usize = 33;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UtxoType {
    /// `OP_1 <32 bytes>`
    Taproot,
    /// `OP_0 <20 bytes>`
    WitnessV0KeyHash,
    /// `OP_DUP OP_HASH160 <20 bytes> OP_EQUALVERIFY OP_CHECKSIG`
    LegacyKeyHash,
    /// `OP_HASH160 <20 bytes> OP_EQUAL` wrapping a witness v0 key hash
    NestedWitnessKeyHash,
}

/// The signing key extracted from an eligible input.
///
/// Taproot keys are the x-only output key lifted to even y.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputKey {
    pub utxo_type: UtxoType,
    pub pubkey: PublicKey,
}

impl InputKey {
    pub fn is_taproot(&self) -> bool {
        self.utxo_type == UtxoType::Taproot
    }
}

/// Why an input or input set contributes nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NonStandardScript,
    MissingWitness,
    UncompressedKey,
    NumsScriptPath,
    KeyNotFound,
    InvalidKey,
    NoEligibleInputs,
}

/// Outcome of a step that may legitimately have nothing to offer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Eligibility<T> {
    Eligible(T),
    Skip(SkipReason),
}

impl<T> Eligibility<T> {
    pub fn is_eligible(&self) -> bool {
        matches!(self, Eligibility::Eligible(_))
    }

    pub fn eligible(self) -> Option<T> {
        match self {
            Eligibility::Eligible(value) => Some(value),
            Eligibility::Skip(_) => None,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Eligibility<U> {
        match self {
            Eligibility::Eligible(value) => Eligibility::Eligible(f(value)),
            Eligibility::Skip(reason) => Eligibility::Skip(reason),
        }
    }
}

/// Classify the output spent by an input and extract its public key.
pub fn classify_input(
    script_pubkey: &Script,
    script_sig: &Script,
    witness: &Witness,
) -> Eligibility<InputKey> {
    let res = if script_pubkey.is_p2tr() {
        taproot_key(script_pubkey, witness)
    } else if script_pubkey.is_p2wpkh() {
        witness_key(witness, UtxoType::WitnessV0KeyHash)
    } else if script_pubkey.is_p2pkh() {
        legacy_key(script_pubkey, script_sig)
    } else if script_pubkey.is_p2sh() {
        let redeem_script = script_sig.as_bytes().get(1..).unwrap_or_default();
        // exactly a single push of a 22 byte p2wpkh program
        if script_sig.len() == 23
            && script_sig.as_bytes()[0] == 0x16
            && ScriptBuf::from_bytes(redeem_script.to_vec()).is_p2wpkh()
        {
            witness_key(witness, UtxoType::NestedWitnessKeyHash)
        } else {
            Eligibility::Skip(SkipReason::NonStandardScript)
        }
    } else {
        Eligibility::Skip(SkipReason::NonStandardScript)
    };

    if let Eligibility::Skip(reason) = &res {
        trace!("skipping input with script {}: {:?}", script_pubkey, reason);
    }

    res
}

fn taproot_key(script_pubkey: &Script, witness: &Witness) -> Eligibility<InputKey> {
    let mut stack: Vec<&[u8]> = witness.iter().collect();

    if stack.is_empty() {
        return Eligibility::Skip(SkipReason::MissingWitness);
    }

    if stack.len() > 1 && stack.last().and_then(|item| item.first()) == Some(&ANNEX_TAG) {
        stack.pop();
    }

    if stack.len() > 1 {
        // script path spend, the last item is the control block
        let control_block = stack[stack.len() - 1];
        if control_block.len() >= 33 && control_block[1..33] == NUMS_H {
            return Eligibility::Skip(SkipReason::NumsScriptPath);
        }
    }

    match XOnlyPublicKey::from_slice(&script_pubkey.as_bytes()[2..34]) {
        Ok(xonly) => Eligibility::Eligible(InputKey {
            utxo_type: UtxoType::Taproot,
            pubkey: xonly.public_key(Parity::Even),
        }),
        Err(_) => Eligibility::Skip(SkipReason::InvalidKey),
    }
}

fn witness_key(witness: &Witness, utxo_type: UtxoType) -> Eligibility<InputKey> {
    let Some(last) = witness.last() else {
        return Eligibility::Skip(SkipReason::MissingWitness);
    };

    if last.len() != COMPRESSED_KEY_SIZE {
        return Eligibility::Skip(SkipReason::UncompressedKey);
    }

    match PublicKey::from_slice(last) {
        Ok(pubkey) => Eligibility::Eligible(InputKey { utxo_type, pubkey }),
        Err(_) => Eligibility::Skip(SkipReason::InvalidKey),
    }
}

fn legacy_key(script_pubkey: &Script, script_sig: &Script) -> Eligibility<InputKey> {
    let pubkey_hash = &script_pubkey.as_bytes()[3..23];
    let script_sig = script_sig.as_bytes();

    // the key is normally the last push, so search from the end
    for end in (COMPRESSED_KEY_SIZE..=script_sig.len()).rev() {
        let candidate = &script_sig[end - COMPRESSED_KEY_SIZE..end];
        if hash160(candidate).as_slice() != pubkey_hash {
            continue;
        }

        return match PublicKey::from_slice(candidate) {
            Ok(pubkey) => Eligibility::Eligible(InputKey {
                utxo_type: UtxoType::LegacyKeyHash,
                pubkey,
            }),
            Err(_) => Eligibility::Skip(SkipReason::InvalidKey),
        };
    }

    Eligibility::Skip(SkipReason::KeyNotFound)
}
