use bitcoin::secp256k1::{Parity, PublicKey, Secp256k1, SecretKey, Verification, XOnlyPublicKey};
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::Label;
use crate::utils::common::{calculate_P_n, calculate_t_n};
use crate::utils::keys::{point_add, point_negate, scalar_add};
use crate::Result;

/// An output that belongs to the receiver.
///
/// The private key for `output` is `b_spend + tweak`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoundOutput {
    output: XOnlyPublicKey,
    tweak: SecretKey,
    label: Option<Label>,
}

impl FoundOutput {
    pub fn output(&self) -> XOnlyPublicKey {
        self.output
    }

    pub fn tweak(&self) -> SecretKey {
        self.tweak
    }

    pub fn label(&self) -> Option<&Label> {
        self.label.as_ref()
    }

    /// The one-time private key of the output.
    pub fn spend_key(&self, b_spend: &SecretKey) -> Result<SecretKey> {
        scalar_add(b_spend, &self.tweak)
    }
}

/// The 32-byte taproot output keys of a transaction that are valid x-only keys.
///
/// Output scripts carry arbitrary bytes, and an x coordinate without a point on
/// the curve can never be a silent payment output, so such outputs are dropped.
pub fn output_keys(outputs: &[[u8; 32]]) -> Vec<XOnlyPublicKey> {
    outputs
        .iter()
        .filter_map(|output| match XOnlyPublicKey::from_slice(output) {
            Ok(key) => Some(key),
            Err(_) => {
                trace!("skipping output {} off the curve", hex::encode(output));
                None
            }
        })
        .collect()
}

/// Find the outputs paid to `B_spend`, directly or through one of `labels`.
///
/// `k` starts at 0 and only advances when an output matches, so the loop ends
/// at the first `k` without a match. Matched outputs leave the candidate set.
pub(crate) fn scan_outputs<C: Verification>(
    secp: &Secp256k1<C>,
    ecdh_shared_secret: &PublicKey,
    B_spend: &PublicKey,
    labels: &HashMap<XOnlyPublicKey, Label>,
    outputs: Vec<XOnlyPublicKey>,
) -> Result<Vec<FoundOutput>> {
    let mut candidates = outputs;
    let mut found: Vec<FoundOutput> = vec![];
    let mut k: u32 = 0;

    while !candidates.is_empty() {
        let t_k = calculate_t_n(ecdh_shared_secret, k)?;
        let P_k = calculate_P_n(secp, B_spend, &t_k)?;

        match match_candidates(secp, &candidates, &P_k, &t_k, labels)? {
            Some((i, output)) => {
                trace!("k = {} matched {}", k, output.output);
                candidates.remove(i);
                found.push(output);
                k += 1;
            }
            None => break,
        }
    }

    debug!("found {} outputs", found.len());

    Ok(found)
}

fn match_candidates<C: Verification>(
    secp: &Secp256k1<C>,
    candidates: &[XOnlyPublicKey],
    P_k: &PublicKey,
    t_k: &SecretKey,
    labels: &HashMap<XOnlyPublicKey, Label>,
) -> Result<Option<(usize, FoundOutput)>> {
    let (P_k_xonly, _) = P_k.x_only_public_key();
    // -P_k, taking P_k with even y as the outputs do
    let neg_P_k = point_negate(secp, &P_k_xonly.public_key(Parity::Even));

    for (i, output) in candidates.iter().enumerate() {
        if *output == P_k_xonly {
            return Ok(Some((
                i,
                FoundOutput {
                    output: *output,
                    tweak: *t_k,
                    label: None,
                },
            )));
        }

        if labels.is_empty() {
            continue;
        }

        let output_point = output.public_key(Parity::Even);

        // output - P_k
        let candidate = point_add(&output_point, &neg_P_k)?;
        if let Some(label) = labels.get(&candidate.x_only_public_key().0) {
            return Ok(Some((i, labeled(*output, t_k, label)?)));
        }

        // -output - P_k
        let negated_output = point_negate(secp, &output_point);
        let candidate = point_add(&negated_output, &neg_P_k)?;
        if let Some(label) = labels.get(&candidate.x_only_public_key().0) {
            let (output, _) = negated_output.x_only_public_key();
            return Ok(Some((i, labeled(output, t_k, label)?)));
        }
    }

    Ok(None)
}

fn labeled(output: XOnlyPublicKey, t_k: &SecretKey, label: &Label) -> Result<FoundOutput> {
    Ok(FoundOutput {
        output,
        tweak: scalar_add(t_k, &label.tweak())?,
        label: Some(label.clone()),
    })
}
