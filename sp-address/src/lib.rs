//! Silent payment address codec.
//!
//! A silent payment address is the bech32m encoding of a version field element
//! followed by the receiver's compressed scan and spend public keys.
use bech32::primitives::decode::{CheckedHrpstring, CheckedHrpstringError};
use bech32::primitives::iter::{ByteIterExt, Fe32IterExt};
use bech32::{Bech32m, Fe32, Hrp};
use secp256k1::PublicKey;
use std::convert::TryFrom;
use std::fmt;
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Size of the payload of a version 0 address: `B_scan || B_spend`.
pub const ADDRESS_PAYLOAD_LENGTH: usize = 66;
/// BIP352 recommends refusing to decode anything longer than this.
pub const MAX_ADDRESS_LENGTH: usize = 1023;
/// Highest version this codec can produce or read.
pub const MAX_SUPPORTED_VERSION: u8 = 30;

const HRP_MAINNET: Hrp = Hrp::parse_unchecked("sp");
const HRP_TESTNET: Hrp = Hrp::parse_unchecked("tsp");

/// Error types for silent payment address operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid network: {0}")]
    InvalidNetwork(String),
    #[error("address of {0} characters exceeds the 1023 character limit")]
    TooLong(usize),
    #[error("wrong prefix, expected \"sp\" or \"tsp\", got \"{0}\"")]
    UnknownHrp(String),
    #[error("address is for {found:?} but {expected:?} was expected")]
    NetworkMismatch { expected: Network, found: Network },
    #[error("unsupported version: {0}")]
    UnsupportedVersion(u8),
    #[error("missing version")]
    MissingVersion,
    #[error("wrong payload length, expected 66, got {0}")]
    InvalidPayloadLength(usize),
    #[error("bech32m decode error: {0}")]
    Bech32(#[from] CheckedHrpstringError),
    #[error(transparent)]
    Secp256k1(#[from] secp256k1::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// The network format used for this silent payment address.
///
/// Mainnet addresses start with `sp1`, everything else (testnet, signet,
/// regtest) uses `tsp1`.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub enum Network {
    Mainnet,
    Testnet,
}

impl Network {
    fn hrp(self) -> Hrp {
        match self {
            Network::Mainnet => HRP_MAINNET,
            Network::Testnet => HRP_TESTNET,
        }
    }

    fn from_hrp(hrp: &Hrp) -> Result<Self> {
        if *hrp == HRP_MAINNET {
            Ok(Network::Mainnet)
        } else if *hrp == HRP_TESTNET {
            Ok(Network::Testnet)
        } else {
            Err(Error::UnknownHrp(hrp.to_lowercase()))
        }
    }
}

impl From<Network> for &str {
    fn from(value: Network) -> Self {
        match value {
            Network::Mainnet => "bitcoin", // we use the same string as rust-bitcoin for compatibility
            Network::Testnet => "testnet",
        }
    }
}

impl TryFrom<&str> for Network {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        let res = match value {
            "bitcoin" | "main" => Self::Mainnet, // We also take the core style argument
            "testnet" | "signet" | "regtest" | "test" => Self::Testnet,
            _ => return Err(Error::InvalidNetwork(value.to_string())),
        };
        Ok(res)
    }
}

/// A decoded silent payment address.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct SilentPaymentAddress {
    version: u8,
    scan_pubkey: PublicKey,
    spend_pubkey: PublicKey,
    network: Network,
}

#[cfg(feature = "serde")]
impl Serialize for SilentPaymentAddress {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let encoded: String = (*self).into();
        serializer.serialize_str(&encoded)
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for SilentPaymentAddress {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let addr_str: String = Deserialize::deserialize(deserializer)?;

        SilentPaymentAddress::try_from(addr_str.as_str()).map_err(serde::de::Error::custom)
    }
}

impl SilentPaymentAddress {
    pub fn new(
        scan_pubkey: PublicKey,
        spend_pubkey: PublicKey,
        network: Network,
        version: u8,
    ) -> Result<Self> {
        if version > MAX_SUPPORTED_VERSION {
            return Err(Error::UnsupportedVersion(version));
        }

        Ok(SilentPaymentAddress {
            scan_pubkey,
            spend_pubkey,
            network,
            version,
        })
    }

    /// Decode `addr`, rejecting it unless it was encoded for `network`.
    pub fn decode(addr: &str, network: Network) -> Result<Self> {
        let address = SilentPaymentAddress::try_from(addr)?;

        if address.network != network {
            return Err(Error::NetworkMismatch {
                expected: network,
                found: address.network,
            });
        }

        Ok(address)
    }

    /// Get the scan public key.
    pub fn get_scan_key(&self) -> PublicKey {
        self.scan_pubkey
    }

    /// Get the spend public key. For a labeled address this is `B_m`.
    pub fn get_spend_key(&self) -> PublicKey {
        self.spend_pubkey
    }

    /// Get the network.
    pub fn get_network(&self) -> Network {
        self.network
    }

    /// Get the version.
    pub fn get_version(&self) -> u8 {
        self.version
    }
}

impl fmt::Display for SilentPaymentAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", <SilentPaymentAddress as Into<String>>::into(*self))
    }
}

impl TryFrom<&str> for SilentPaymentAddress {
    type Error = Error;

    fn try_from(addr: &str) -> Result<Self> {
        // the bech32 crate allows longer strings than the BIP recommends
        if addr.len() > MAX_ADDRESS_LENGTH {
            return Err(Error::TooLong(addr.len()));
        }

        let checked = CheckedHrpstring::new::<Bech32m>(addr)?;
        let network = Network::from_hrp(&checked.hrp())?;

        let mut payload = checked.fe32_iter::<&mut dyn Iterator<Item = u8>>();
        let version = payload.next().ok_or(Error::MissingVersion)?.to_u8();
        let data = payload.fes_to_bytes().collect::<Vec<u8>>();

        let data = match version {
            0 if data.len() == ADDRESS_PAYLOAD_LENGTH => &data[..],
            // later versions may append data, only the keys are read
            1..=MAX_SUPPORTED_VERSION if data.len() >= ADDRESS_PAYLOAD_LENGTH => {
                &data[..ADDRESS_PAYLOAD_LENGTH]
            }
            0..=MAX_SUPPORTED_VERSION => return Err(Error::InvalidPayloadLength(data.len())),
            _ => return Err(Error::UnsupportedVersion(version)),
        };

        let scan_pubkey = PublicKey::from_slice(&data[..33])?;
        let spend_pubkey = PublicKey::from_slice(&data[33..])?;

        SilentPaymentAddress::new(scan_pubkey, spend_pubkey, network, version)
    }
}

impl TryFrom<String> for SilentPaymentAddress {
    type Error = Error;

    fn try_from(addr: String) -> Result<Self> {
        addr.as_str().try_into()
    }
}

impl From<SilentPaymentAddress> for String {
    fn from(val: SilentPaymentAddress) -> Self {
        let mut data = [0; ADDRESS_PAYLOAD_LENGTH];
        data[..33].copy_from_slice(&val.scan_pubkey.serialize());
        data[33..].copy_from_slice(&val.spend_pubkey.serialize());

        let version = Fe32::try_from(val.version).expect("version is checked on construction");

        data.iter()
            .copied()
            .bytes_to_fes()
            .with_checksum::<Bech32m>(&val.network.hrp())
            .with_witness_version(version)
            .chars()
            .collect()
    }
}

/// Whether `address` looks like a version 0 address: the length and prefix of one
/// and a valid bech32m checksum. The keys themselves are not parsed.
pub fn is_silent_payment_address(address: &str) -> bool {
    let shape = (address.len() == 116 && address.starts_with("sp1"))
        || (address.len() == 117 && address.starts_with("tsp1"));

    shape && CheckedHrpstring::new::<Bech32m>(address).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDRESS: &str = "sp1qqgste7k9hx0qftg6qmwlkqtwuy6cycyavzmzj85c6qdfhjdpdjtdgqjuexzk6murw56suy3e0rd2cgqvycxttddwsvgxe2usfpxumr70xc9pkqwv";
    const TESTNET_ADDRESS: &str = "tsp1qqgste7k9hx0qftg6qmwlkqtwuy6cycyavzmzj85c6qdfhjdpdjtdgqjuexzk6murw56suy3e0rd2cgqvycxttddwsvgxe2usfpxumr70xc3wk4yh";
    const SCAN_KEY: &str = "0220bcfac5b99e04ad1a06ddfb016ee13582609d60b6291e98d01a9bc9a16c96d4";
    const SPEND_KEY: &str = "025cc9856d6f8375350e123978daac200c260cb5b5ae83106cab90484dcd8fcf36";

    fn keys() -> (PublicKey, PublicKey) {
        (
            PublicKey::from_slice(&hex::decode(SCAN_KEY).unwrap()).unwrap(),
            PublicKey::from_slice(&hex::decode(SPEND_KEY).unwrap()).unwrap(),
        )
    }

    #[test]
    fn decode_address_to_keys() {
        let (scan, spend) = keys();
        let address = SilentPaymentAddress::decode(ADDRESS, Network::Mainnet).unwrap();

        assert_eq!(address.get_scan_key(), scan);
        assert_eq!(address.get_spend_key(), spend);
        assert_eq!(address.get_version(), 0);
        assert_eq!(address.get_network(), Network::Mainnet);
    }

    #[test]
    fn encode_address() {
        let (scan, spend) = keys();

        let mainnet = SilentPaymentAddress::new(scan, spend, Network::Mainnet, 0).unwrap();
        assert_eq!(mainnet.to_string(), ADDRESS);

        let testnet = SilentPaymentAddress::new(scan, spend, Network::Testnet, 0).unwrap();
        assert_eq!(testnet.to_string(), TESTNET_ADDRESS);
        assert!(is_silent_payment_address(ADDRESS));
        assert!(is_silent_payment_address(TESTNET_ADDRESS));
    }

    #[test]
    fn shape_check_needs_a_checksum() {
        let filler = format!("sp1{}", "q".repeat(113));
        assert!(!is_silent_payment_address(&filler));

        let mut corrupted = ADDRESS.to_string();
        corrupted.replace_range(20..21, if &ADDRESS[20..21] == "q" { "p" } else { "q" });
        assert!(!is_silent_payment_address(&corrupted));

        assert!(!is_silent_payment_address(&ADDRESS[..115]));
    }

    #[test]
    fn round_trip_all_versions() {
        let (scan, spend) = keys();

        for network in [Network::Mainnet, Network::Testnet] {
            for version in 0..=MAX_SUPPORTED_VERSION {
                let address = SilentPaymentAddress::new(scan, spend, network, version).unwrap();
                let encoded: String = address.into();
                let decoded = SilentPaymentAddress::decode(&encoded, network).unwrap();
                assert_eq!(decoded, address);
            }
        }
    }

    #[test]
    fn network_mismatch() {
        let err = SilentPaymentAddress::decode(ADDRESS, Network::Testnet).unwrap_err();
        assert!(matches!(
            err,
            Error::NetworkMismatch {
                expected: Network::Testnet,
                found: Network::Mainnet
            }
        ));

        let err = SilentPaymentAddress::decode(TESTNET_ADDRESS, Network::Mainnet).unwrap_err();
        assert!(matches!(err, Error::NetworkMismatch { .. }));
    }

    #[test]
    fn version_31_is_rejected() {
        let (scan, spend) = keys();
        assert!(matches!(
            SilentPaymentAddress::new(scan, spend, Network::Mainnet, 31),
            Err(Error::UnsupportedVersion(31))
        ));
    }

    #[test]
    fn too_long_is_rejected_before_decoding() {
        let long = format!("sp1q{}", "q".repeat(MAX_ADDRESS_LENGTH));
        assert!(matches!(
            SilentPaymentAddress::try_from(long.as_str()),
            Err(Error::TooLong(_))
        ));
    }

    #[test]
    fn wrong_payload_length() {
        // version 0 with only the scan key as payload
        let (scan, _) = keys();
        let short = scan
            .serialize()
            .iter()
            .copied()
            .bytes_to_fes()
            .with_checksum::<Bech32m>(&HRP_MAINNET)
            .with_witness_version(Fe32::Q)
            .chars()
            .collect::<String>();

        assert!(matches!(
            SilentPaymentAddress::try_from(short.as_str()),
            Err(Error::InvalidPayloadLength(33))
        ));
    }

    #[test]
    fn corrupted_checksum() {
        let mut corrupted = ADDRESS.to_string();
        corrupted.pop();
        corrupted.push('q');
        assert!(matches!(
            SilentPaymentAddress::try_from(corrupted.as_str()),
            Err(Error::Bech32(_))
        ));
    }

    #[test]
    fn unknown_prefix() {
        let (scan, spend) = keys();
        let mut data = scan.serialize().to_vec();
        data.extend_from_slice(&spend.serialize());
        let encoded = data
            .iter()
            .copied()
            .bytes_to_fes()
            .with_checksum::<Bech32m>(&Hrp::parse_unchecked("bc"))
            .with_witness_version(Fe32::Q)
            .chars()
            .collect::<String>();

        assert!(matches!(
            SilentPaymentAddress::try_from(encoded.as_str()),
            Err(Error::UnknownHrp(_))
        ));
    }

    #[test]
    fn network_strings() {
        assert_eq!(Network::try_from("signet").unwrap(), Network::Testnet);
        assert_eq!(Network::try_from("main").unwrap(), Network::Mainnet);
        assert!(Network::try_from("mainnet").is_err());
        assert_eq!(<&str>::from(Network::Mainnet), "bitcoin");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_as_string() {
        let address = SilentPaymentAddress::try_from(ADDRESS).unwrap();
        let json = serde_json::to_string(&address).unwrap();
        assert_eq!(json, format!("\"{}\"", ADDRESS));
        let back: SilentPaymentAddress = serde_json::from_str(&json).unwrap();
        assert_eq!(back, address);
    }
}
