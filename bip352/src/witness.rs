use bitcoin::consensus::deserialize;
use bitcoin::Witness;

use crate::{Error, Result};

/// Decode a consensus serialized witness stack.
///
/// Empty input is an empty witness, as carried by inputs without one.
/// Truncated or trailing data is an error.
pub fn parse_witness(bytes: &[u8]) -> Result<Witness> {
    if bytes.is_empty() {
        return Ok(Witness::new());
    }

    deserialize::<Witness>(bytes).map_err(|e| Error::Witness(e.to_string()))
}
