use bitcoin::secp256k1::{PublicKey, Secp256k1, SecretKey, XOnlyPublicKey};
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;

use crate::constants::CHANGE_LABEL;
use crate::utils::common::{label_pubkey, label_tweak};
use crate::Result;
use sp_address::SilentPaymentAddress;

/// A label `m`, its tweak `hash_BIP0352/Label(b_scan || m)` and the public key of that tweak.
///
/// Once added to a [`Receiver`](super::Receiver) the label also carries the
/// address it is published as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "LabelRepr", into = "LabelRepr")]
pub struct Label {
    tweak: SecretKey,
    pubkey: PublicKey,
    m: u32,
    address: Option<SilentPaymentAddress>,
}

impl Label {
    pub fn new(b_scan: &SecretKey, m: u32) -> Result<Self> {
        let secp = Secp256k1::signing_only();
        let tweak = label_tweak(b_scan, m)?;

        Ok(Label {
            tweak,
            pubkey: label_pubkey(&secp, &tweak),
            m,
            address: None,
        })
    }

    /// The label reserved for change outputs, `m = 0`.
    pub fn change(b_scan: &SecretKey) -> Result<Self> {
        Self::new(b_scan, CHANGE_LABEL)
    }

    pub fn tweak(&self) -> SecretKey {
        self.tweak
    }

    pub fn pubkey(&self) -> PublicKey {
        self.pubkey
    }

    pub fn as_xonly(&self) -> XOnlyPublicKey {
        self.pubkey.x_only_public_key().0
    }

    pub fn m(&self) -> u32 {
        self.m
    }

    pub fn is_change(&self) -> bool {
        self.m == CHANGE_LABEL
    }

    pub fn address(&self) -> Option<SilentPaymentAddress> {
        self.address
    }

    pub(crate) fn with_address(self, address: SilentPaymentAddress) -> Self {
        Label {
            address: Some(address),
            ..self
        }
    }
}

#[derive(Serialize, Deserialize)]
struct LabelRepr {
    pub_key: String,
    tweak: String,
    address: Option<SilentPaymentAddress>,
    m: u32,
}

impl From<Label> for LabelRepr {
    fn from(label: Label) -> Self {
        LabelRepr {
            pub_key: hex::encode(label.pubkey.serialize()),
            tweak: hex::encode(label.tweak.secret_bytes()),
            address: label.address,
            m: label.m,
        }
    }
}

impl TryFrom<LabelRepr> for Label {
    type Error = String;

    fn try_from(repr: LabelRepr) -> std::result::Result<Self, Self::Error> {
        let tweak = hex::decode(&repr.tweak).map_err(|e| e.to_string())?;
        let tweak = SecretKey::from_slice(&tweak).map_err(|e| e.to_string())?;

        let pubkey = hex::decode(&repr.pub_key).map_err(|e| e.to_string())?;
        let pubkey = PublicKey::from_slice(&pubkey).map_err(|e| e.to_string())?;

        if pubkey != label_pubkey(&Secp256k1::signing_only(), &tweak) {
            return Err(format!("pub_key does not match tweak for label {}", repr.m));
        }

        Ok(Label {
            tweak,
            pubkey,
            m: repr.m,
            address: repr.address,
        })
    }
}
