//! Silent payment output generation for sending.
//!
//! [`create_outputs`] fills in the output key of every [`Recipient`] of a
//! transaction from the transaction's inputs. The lower level
//! [`calculate_partial_secret`] and [`generate_recipient_pubkeys`] are available
//! for callers that aggregate the input keys themselves.
use bitcoin::secp256k1::{PublicKey, Secp256k1, SecretKey, Verification, XOnlyPublicKey};
use bitcoin::OutPoint;
use log::{debug, trace};
use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::inputs::{input_hash, Vin};
use crate::utils::common::{calculate_P_n, calculate_t_n, shared_secret};
use crate::utils::keys::{negate_if_odd_y, scalar_mul, sum_secret_keys};
use crate::{Error, Result};
use sp_address::{Network, SilentPaymentAddress};

/// A payment to a silent payment address.
///
/// `output` is filled in by [`create_outputs`]. `data` is left untouched and can
/// carry whatever the caller needs to build the transaction output, such as the
/// amount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient<T> {
    pub address: SilentPaymentAddress,
    pub output: Option<XOnlyPublicKey>,
    pub data: T,
}

impl<T> Recipient<T> {
    pub fn new(address: SilentPaymentAddress, data: T) -> Self {
        Self {
            address,
            output: None,
            data,
        }
    }

    /// Decode `address`, which must be encoded for `network`.
    pub fn from_address_str(address: &str, network: Network, data: T) -> Result<Self> {
        let address = SilentPaymentAddress::decode(address, network)?;
        Ok(Self::new(address, data))
    }
}

/// How [`create_outputs`] treats the inputs it is given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFilter {
    /// Classify every input and use only the eligible ones.
    Classify,
    /// Every input is eligible, `public_key` and `taproot` are already set.
    Prevetted,
}

/// Compute the output key of every recipient.
///
/// Recipients sharing a scan key share one ECDH computation and get consecutive
/// `k` values in the order they appear. On error no recipient is modified.
///
/// The input hash always covers the outpoints of all `vins`, eligible or not.
pub fn create_outputs<T>(
    recipients: &mut [Recipient<T>],
    vins: &[Vin],
    filter: InputFilter,
) -> Result<()> {
    let eligible: Vec<Vin> = match filter {
        InputFilter::Classify => vins.iter().filter_map(Vin::classified).collect(),
        InputFilter::Prevetted => vins.to_vec(),
    };

    debug!(
        "creating {} outputs from {} of {} inputs",
        recipients.len(),
        eligible.len(),
        vins.len()
    );

    if eligible.is_empty() {
        return Err(Error::NoEligibleInputs);
    }

    let input_keys = eligible
        .iter()
        .map(|vin| -> Result<(SecretKey, bool)> {
            let sk = vin.secret_key.ok_or(Error::MissingSecretKey(vin.outpoint))?;
            Ok((sk, vin.taproot))
        })
        .collect::<Result<Vec<_>>>()?;

    let outpoints: Vec<OutPoint> = vins.iter().map(|vin| vin.outpoint).collect();
    let partial_secret = calculate_partial_secret(&input_keys, &outpoints)?;

    let secp = Secp256k1::verification_only();
    let addresses: Vec<&SilentPaymentAddress> = recipients.iter().map(|r| &r.address).collect();
    let outputs = derive_outputs(&secp, &addresses, &partial_secret)?;

    for (recipient, output) in recipients.iter_mut().zip(outputs) {
        recipient.output = Some(output);
    }

    Ok(())
}

/// `a_sum·input_hash`, the part of the shared secret owned by the sender.
///
/// `input_keys` pairs each eligible input's secret key with whether it spends a
/// taproot output. Taproot keys are negated where needed so that their public
/// key has even y.
pub fn calculate_partial_secret(
    input_keys: &[(SecretKey, bool)],
    outpoints: &[OutPoint],
) -> Result<SecretKey> {
    let secp = Secp256k1::signing_only();

    let keys: Vec<SecretKey> = input_keys
        .iter()
        .map(|(sk, is_taproot)| {
            if *is_taproot {
                negate_if_odd_y(*sk, &sk.public_key(&secp))
            } else {
                *sk
            }
        })
        .collect();

    let a_sum = sum_secret_keys(&keys)?;
    let A_sum = a_sum.public_key(&secp);
    let input_hash = input_hash(outpoints, &A_sum)?;

    scalar_mul(&a_sum, &input_hash)
}

/// Create outputs for a given set of silent payment recipients and the partial secret.
///
/// This function should only be used once per transaction! If used multiple
/// times, address reuse may occur.
///
/// The returned map holds, per address, the outputs in the order the address
/// appeared in `recipients`.
pub fn generate_recipient_pubkeys(
    recipients: Vec<SilentPaymentAddress>,
    partial_secret: SecretKey,
) -> Result<HashMap<SilentPaymentAddress, Vec<XOnlyPublicKey>>> {
    let secp = Secp256k1::verification_only();

    let addresses: Vec<&SilentPaymentAddress> = recipients.iter().collect();
    let outputs = derive_outputs(&secp, &addresses, &partial_secret)?;

    let mut result: HashMap<SilentPaymentAddress, Vec<XOnlyPublicKey>> = HashMap::new();
    for (address, output) in recipients.into_iter().zip(outputs) {
        result.entry(address).or_default().push(output);
    }

    Ok(result)
}

/// One output per address, in the order of `addresses`.
fn derive_outputs<C: Verification>(
    secp: &Secp256k1<C>,
    addresses: &[&SilentPaymentAddress],
    partial_secret: &SecretKey,
) -> Result<Vec<XOnlyPublicKey>> {
    // B_scan -> (ecdh_shared_secret, next k)
    let mut groups: HashMap<PublicKey, (PublicKey, u32)> = HashMap::new();
    let mut outputs = Vec::with_capacity(addresses.len());

    for address in addresses {
        let B_scan = address.get_scan_key();

        let (ecdh_shared_secret, k) = match groups.entry(B_scan) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let ecdh_shared_secret = shared_secret(secp, &B_scan, partial_secret, None)?;
                entry.insert((ecdh_shared_secret, 0))
            }
        };

        let t_k = calculate_t_n(ecdh_shared_secret, *k)?;
        let P_k = calculate_P_n(secp, &address.get_spend_key(), &t_k)?;
        trace!("output {} for {}", *k, address);

        outputs.push(P_k.x_only_public_key().0);
        *k += 1;
    }

    debug!("{} outputs for {} scan keys", outputs.len(), groups.len());

    Ok(outputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::common::output_pubkey;
    use bitcoin::secp256k1::Parity;
    use bitcoin::{ScriptBuf, Txid, Witness};
    use std::str::FromStr;

    const ADDRESS: &str = "sp1qqgste7k9hx0qftg6qmwlkqtwuy6cycyavzmzj85c6qdfhjdpdjtdgqjuexzk6murw56suy3e0rd2cgqvycxttddwsvgxe2usfpxumr70xc9pkqwv";

    fn recipient<T>(data: T) -> Recipient<T> {
        Recipient::from_address_str(ADDRESS, Network::Mainnet, data).unwrap()
    }

    fn simple_send_vins() -> Vec<Vin> {
        let secp = Secp256k1::new();
        [
            (
                "f4184fc596403b9d638783cf57adfe4c75c605f6356fbc91338530e9831e9e16",
                "eadc78165ff1f8ea94ad7cfdc54990738a4c53f6e0507b42154201b8e5dff3b1",
            ),
            (
                "a1075db55d416d3ca199f55b6084e2115b9345e16c5cf302fc80e9d5fbf5d48d",
                "93f5ed907ad5b2bdbbdcb5d9116ebc0a4e1f92f910d5260237fa45a9408aad16",
            ),
        ]
        .iter()
        .map(|(txid, sk)| {
            let sk = SecretKey::from_str(sk).unwrap();
            let outpoint = OutPoint::new(Txid::from_str(txid).unwrap(), 0);
            Vin::from_key(outpoint, sk.public_key(&secp), false).with_secret_key(sk)
        })
        .collect()
    }

    #[test]
    fn simple_send() {
        let mut recipients = vec![recipient(42u64)];

        create_outputs(&mut recipients, &simple_send_vins(), InputFilter::Prevetted).unwrap();

        assert_eq!(
            recipients[0].output.unwrap().to_string(),
            "3e9fce73d4e77a4809908e3c3a2e54ee147b9312dc5044a193d1fc85de46e3c1"
        );
        assert_eq!(recipients[0].data, 42);
    }

    #[test]
    fn wrong_network_address() {
        let err = Recipient::from_address_str(ADDRESS, Network::Testnet, ()).unwrap_err();
        assert_eq!(err.stage(), crate::Stage::Decoding);
    }

    #[test]
    fn shared_scan_key_gets_consecutive_k() {
        let vins = simple_send_vins();
        let address = SilentPaymentAddress::try_from(ADDRESS).unwrap();
        let mut recipients = vec![
            Recipient::new(address, "first"),
            Recipient::new(address, "second"),
        ];

        create_outputs(&mut recipients, &vins, InputFilter::Prevetted).unwrap();

        let input_keys: Vec<(SecretKey, bool)> =
            vins.iter().map(|vin| (vin.secret_key.unwrap(), false)).collect();
        let outpoints: Vec<OutPoint> = vins.iter().map(|vin| vin.outpoint).collect();
        let partial_secret = calculate_partial_secret(&input_keys, &outpoints).unwrap();

        let secp = Secp256k1::new();
        let ecdh = shared_secret(&secp, &address.get_scan_key(), &partial_secret, None).unwrap();
        for (k, recipient) in recipients.iter().enumerate() {
            assert_eq!(
                recipient.output,
                Some(output_pubkey(&secp, &ecdh, &address.get_spend_key(), k as u32).unwrap())
            );
        }
        assert_eq!(recipients[1].data, "second");

        let map = generate_recipient_pubkeys(vec![address, address], partial_secret).unwrap();
        assert_eq!(
            map[&address],
            vec![recipients[0].output.unwrap(), recipients[1].output.unwrap()]
        );
    }

    #[test]
    fn taproot_keys_are_normalized() {
        let secp = Secp256k1::new();
        let outpoints = [OutPoint::null()];
        let odd = (1u8..)
            .map(|seed| SecretKey::from_slice(&[seed; 32]).unwrap())
            .find(|sk| sk.public_key(&secp).x_only_public_key().1 == Parity::Odd)
            .unwrap();

        assert_eq!(
            calculate_partial_secret(&[(odd, true)], &outpoints).unwrap(),
            calculate_partial_secret(&[(odd.negate(), false)], &outpoints).unwrap()
        );
        assert_ne!(
            calculate_partial_secret(&[(odd, true)], &outpoints).unwrap(),
            calculate_partial_secret(&[(odd, false)], &outpoints).unwrap()
        );
    }

    #[test]
    fn no_eligible_inputs() {
        let vin = Vin::new(
            OutPoint::null(),
            ScriptBuf::from_bytes(vec![0x6a]),
            ScriptBuf::new(),
            Witness::new(),
        )
        .with_secret_key(SecretKey::from_slice(&[0x01; 32]).unwrap());
        let mut recipients = vec![recipient(())];

        let err = create_outputs(&mut recipients, &[vin], InputFilter::Classify).unwrap_err();
        assert!(matches!(err, Error::NoEligibleInputs));
        assert_eq!(err.stage(), crate::Stage::Precondition);
        assert_eq!(recipients[0].output, None);
    }

    #[test]
    fn missing_secret_key() {
        let secp = Secp256k1::new();
        let pk = SecretKey::from_slice(&[0x01; 32]).unwrap().public_key(&secp);
        let vin = Vin::from_key(OutPoint::null(), pk, false);
        let mut recipients = vec![recipient(())];

        let err = create_outputs(&mut recipients, &[vin], InputFilter::Prevetted).unwrap_err();
        assert!(matches!(err, Error::MissingSecretKey(_)));
        assert_eq!(recipients[0].output, None);
    }
}
