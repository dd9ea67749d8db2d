//! Scanning transactions for silent payment outputs.
//!
//! A [`Receiver`] holds the public half of a silent payment wallet and the labels
//! it listens on. Given the ECDH shared secret of a transaction, it finds which
//! of the transaction's taproot outputs it can spend.
use bitcoin::secp256k1::{PublicKey, Scalar, Secp256k1, SecretKey, Signing, XOnlyPublicKey};
use log::debug;
use std::collections::HashMap;

use crate::utils::common::{calculate_P_n, calculate_t_n, labeled_spend_pubkey, shared_secret};
use crate::{Error, Result};
use sp_address::{Network, SilentPaymentAddress};

mod label;
mod scan;

pub use label::Label;
pub use scan::{output_keys, FoundOutput};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receiver {
    version: u8,
    scan_pubkey: PublicKey,
    spend_pubkey: PublicKey,
    /// Keyed by the x-only label public key, as that is what scanning recovers.
    labels: HashMap<XOnlyPublicKey, Label>,
    network: Network,
}

impl Receiver {
    pub fn new(
        version: u8,
        scan_pubkey: PublicKey,
        spend_pubkey: PublicKey,
        network: Network,
    ) -> Result<Self> {
        // rejects versions we cannot encode
        SilentPaymentAddress::new(scan_pubkey, spend_pubkey, network, version)?;

        Ok(Receiver {
            version,
            scan_pubkey,
            spend_pubkey,
            labels: HashMap::new(),
            network,
        })
    }

    pub fn get_scan_pubkey(&self) -> PublicKey {
        self.scan_pubkey
    }

    pub fn get_spend_pubkey(&self) -> PublicKey {
        self.spend_pubkey
    }

    pub fn get_network(&self) -> Network {
        self.network
    }

    /// Start listening on `label`. Returns the label with its address filled in.
    ///
    /// A label with the same `m` is replaced.
    pub fn add_label(&mut self, label: Label) -> Result<Label> {
        let address = self.get_labeled_address(&label)?;
        let label = label.with_address(address);

        self.labels.retain(|_, existing| existing.m() != label.m());
        self.labels.insert(label.as_xonly(), label.clone());

        Ok(label)
    }

    pub fn get_label(&self, m: u32) -> Option<&Label> {
        self.labels.values().find(|label| label.m() == m)
    }

    /// Labels ordered by `m`.
    pub fn list_labels(&self) -> Vec<&Label> {
        let mut labels: Vec<&Label> = self.labels.values().collect();
        labels.sort_by_key(|label| label.m());
        labels
    }

    pub fn get_receiving_address(&self) -> SilentPaymentAddress {
        self.address_with_spend_key(self.spend_pubkey)
    }

    /// Address for `label`, with spend key `B_m = B_spend + label·G`.
    pub fn get_labeled_address(&self, label: &Label) -> Result<SilentPaymentAddress> {
        let B_m = labeled_spend_pubkey(&self.spend_pubkey, &label.pubkey())?;
        Ok(self.address_with_spend_key(B_m))
    }

    fn address_with_spend_key(&self, spend_pubkey: PublicKey) -> SilentPaymentAddress {
        SilentPaymentAddress::new(self.scan_pubkey, spend_pubkey, self.network, self.version)
            .expect("version is checked on construction")
    }

    /// Scan `outputs` of a transaction whose ECDH shared secret is `ecdh_shared_secret`.
    pub fn scan_transaction(
        &self,
        ecdh_shared_secret: &PublicKey,
        outputs: Vec<XOnlyPublicKey>,
    ) -> Result<Vec<FoundOutput>> {
        let secp = Secp256k1::verification_only();

        scan::scan_outputs(
            &secp,
            ecdh_shared_secret,
            &self.spend_pubkey,
            &self.labels,
            outputs,
        )
    }

    /// Scan the raw 32-byte taproot output keys of a transaction.
    ///
    /// Values that are not valid x-only keys are dropped before scanning, see
    /// [`output_keys`].
    pub fn scan_raw_outputs(
        &self,
        ecdh_shared_secret: &PublicKey,
        outputs: &[[u8; 32]],
    ) -> Result<Vec<FoundOutput>> {
        self.scan_transaction(ecdh_shared_secret, output_keys(outputs))
    }

    /// Derive the shared secret from `b_scan` and the transaction's public
    /// component, then scan.
    ///
    /// `public_component` is `A_sum` together with `input_hash`, or an already
    /// tweaked `input_hash·A_sum` with no input hash.
    pub fn scan_transaction_with_secret(
        &self,
        b_scan: &SecretKey,
        public_component: &PublicKey,
        input_hash: Option<&Scalar>,
        outputs: Vec<XOnlyPublicKey>,
    ) -> Result<Vec<FoundOutput>> {
        let secp = Secp256k1::new();
        self.check_scan_key(&secp, b_scan)?;

        let ecdh_shared_secret = shared_secret(&secp, public_component, b_scan, input_hash)?;
        self.scan_transaction(&ecdh_shared_secret, outputs)
    }

    /// Scan independent transactions, each given as its tweak `input_hash·A_sum`
    /// and its taproot outputs. Results are in the order of `transactions`.
    pub fn scan_transactions(
        &self,
        b_scan: &SecretKey,
        transactions: Vec<(PublicKey, Vec<XOnlyPublicKey>)>,
    ) -> Result<Vec<Vec<FoundOutput>>> {
        let secp = Secp256k1::new();
        self.check_scan_key(&secp, b_scan)?;

        debug!("scanning {} transactions", transactions.len());

        let scan_one = |(tweak, outputs): (PublicKey, Vec<XOnlyPublicKey>)| {
            let ecdh_shared_secret = shared_secret(&secp, &tweak, b_scan, None)?;
            scan::scan_outputs(
                &secp,
                &ecdh_shared_secret,
                &self.spend_pubkey,
                &self.labels,
                outputs,
            )
        };

        #[cfg(all(not(target_arch = "wasm32"), feature = "parallel"))]
        let found: Result<Vec<Vec<FoundOutput>>> = {
            use rayon::prelude::*;
            transactions.into_par_iter().map(scan_one).collect()
        };

        #[cfg(not(all(not(target_arch = "wasm32"), feature = "parallel")))]
        let found: Result<Vec<Vec<FoundOutput>>> =
            transactions.into_iter().map(scan_one).collect();

        let found = found?;
        debug!(
            "found outputs in {} transactions",
            found.iter().filter(|outputs| !outputs.is_empty()).count()
        );

        Ok(found)
    }

    /// The P2TR scripts of the first output (`k = 0`) this receiver could get in a
    /// transaction with `ecdh_shared_secret`, unlabeled first and then per label by `m`.
    ///
    /// Useful to test a block filter before fetching full transactions.
    pub fn get_spks_from_shared_secret(
        &self,
        ecdh_shared_secret: &PublicKey,
    ) -> Result<Vec<[u8; 34]>> {
        let secp = Secp256k1::verification_only();
        let t_0 = calculate_t_n(ecdh_shared_secret, 0)?;
        let P_0 = calculate_P_n(&secp, &self.spend_pubkey, &t_0)?;

        let mut spks = vec![p2tr_script(&P_0)];
        for label in self.list_labels() {
            let P_0m = labeled_spend_pubkey(&P_0, &label.pubkey())?;
            spks.push(p2tr_script(&P_0m));
        }

        Ok(spks)
    }

    fn check_scan_key<C: Signing>(&self, secp: &Secp256k1<C>, b_scan: &SecretKey) -> Result<()> {
        if b_scan.public_key(secp) != self.scan_pubkey {
            return Err(Error::ScanKeyMismatch);
        }
        Ok(())
    }
}

fn p2tr_script(output: &PublicKey) -> [u8; 34] {
    let mut spk = [0u8; 34];
    spk[0] = 0x51;
    spk[1] = 0x20;
    spk[2..].copy_from_slice(&output.x_only_public_key().0.serialize());
    spk
}
