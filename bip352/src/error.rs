use bitcoin::OutPoint;
use thiserror::Error;

/// The part of the derivation an [`Error`] comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Bad address text or witness bytes supplied by the caller.
    Decoding,
    /// A point failed to parse or a tweak fell outside the curve order.
    Curve,
    /// Nothing to derive from, or the caller's keys do not fit together.
    Precondition,
}

#[derive(Debug, Error)]
pub enum Error {
    // Decoding
    #[error(transparent)]
    Address(#[from] sp_address::Error),
    #[error("invalid witness: {0}")]
    Witness(String),

    // Curve arithmetic
    #[error("invalid point encoding of {0} bytes")]
    InvalidPointLength(usize),
    #[error("{0} tweak is zero or not below the curve order")]
    InvalidTweak(&'static str),
    #[error("input hash is not below the curve order")]
    InvalidInputHash,
    #[error(transparent)]
    Secp256k1(#[from] bitcoin::secp256k1::Error),

    // Preconditions
    #[error("cannot compute the smallest outpoint of an empty input set")]
    EmptyInputs,
    #[error("no eligible inputs")]
    NoEligibleInputs,
    #[error("secret key not available for input {0}")]
    MissingSecretKey(OutPoint),
    #[error("scan secret key does not match the receiver's scan public key")]
    ScanKeyMismatch,
}

impl Error {
    pub fn stage(&self) -> Stage {
        match self {
            Error::Address(_) | Error::Witness(_) => Stage::Decoding,
            Error::InvalidPointLength(_)
            | Error::InvalidTweak(_)
            | Error::InvalidInputHash
            | Error::Secp256k1(_) => Stage::Curve,
            Error::EmptyInputs
            | Error::NoEligibleInputs
            | Error::MissingSecretKey(_)
            | Error::ScanKeyMismatch => Stage::Precondition,
        }
    }
}
