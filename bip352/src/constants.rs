/// x-coordinate of the BIP341 NUMS point `H`, an internal key with no known discrete log.
pub const NUMS_H: [u8; 32] = [
    0x50, 0x92, 0x9b, 0x74, 0xc1, 0xa0, 0x49, 0x54, 0xb7, 0x8b, 0x4b, 0x60, 0x35, 0xe9, 0x7a, 0x5e,
    0x07, 0x8a, 0x5a, 0x0f, 0x28, 0xec, 0x96, 0xd5, 0x47, 0xbf, 0xee, 0x9a, 0xce, 0x80, 0x3a, 0xc0,
];

pub const INPUTS_TAG: &str = "BIP0352/Inputs";
pub const SHARED_SECRET_TAG: &str = "BIP0352/SharedSecret";
pub const LABEL_TAG: &str = "BIP0352/Label";

/// First byte of a taproot annex.
pub const ANNEX_TAG: u8 = 0x50;

/// Serialized outpoint: txid in internal byte order followed by the little-endian vout.
pub const OUTPOINT_SIZE: usize = 36;

/// Label index reserved for change.
pub const CHANGE_LABEL: u32 = 0;
