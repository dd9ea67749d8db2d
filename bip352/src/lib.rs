//! BIP352 Silent Payments derivation engine.
//!
//! This crate provides the protocol primitives for sending and receiving
//! silent payments according to [BIP352](https://github.com/bitcoin/bips/blob/master/bip-0352.mediawiki).
//!
//! ## Module Organization
//!
//! - [`utxo`] - Classify spent outputs and extract their signing keys
//! - [`inputs`] - Smallest outpoint, `input_hash` and receiver input data
//! - [`sending`] - Assign silent payment outputs to recipients
//! - [`receiving`] - Scan transaction outputs, labels
//! - [`utils`] - Key arithmetic, tagged hashes and tweak derivation
//! - [`witness`] - Witness stack decoding
//!
//! ## Feature Flags
//!
//! - **`sending`** - Enables [`sending`] (default)
//! - **`receiving`** - Enables [`receiving`] (default, implies `serde`)
//! - **`serde`** - Serialization for labels, found outputs and addresses
//! - **`parallel`** - Batch scanning with rayon, ignored on wasm
//!
//! ## Examples
//!
//! ### Sending to a Silent Payment Address
//!
//! ```ignore
//! use bip352::sending::{create_outputs, InputFilter, Recipient};
//!
//! let mut recipients = vec![Recipient::from_address_str(addr, Network::Mainnet, ())?];
//! create_outputs(&mut recipients, &vins, InputFilter::Classify)?;
//! let output = recipients[0].output;
//! ```
//!
//! ### Scanning for Received Outputs
//!
//! ```ignore
//! use bip352::receiving::Receiver;
//!
//! let receiver = Receiver::new(0, scan_pubkey, spend_pubkey, Network::Mainnet)?;
//! let found = receiver.scan_transaction(&shared_secret, outputs)?;
//! ```
#![allow(non_snake_case)]
pub mod constants;
pub mod error;
pub mod inputs;
#[cfg(feature = "receiving")]
pub mod receiving;
#[cfg(feature = "sending")]
pub mod sending;
pub mod utils;
pub mod utxo;
pub mod witness;

pub use bitcoin;
pub use bitcoin::secp256k1;
pub use sp_address::{self, Network, SilentPaymentAddress};

pub use error::{Error, Stage};
pub use inputs::{compute_input_data, InputData, Vin};
pub use utxo::{classify_input, Eligibility, InputKey, SkipReason, UtxoType};

pub type Result<T> = std::result::Result<T, Error>;
