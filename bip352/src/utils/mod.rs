pub mod common;
pub mod hash;
pub mod keys;

pub use common::{
    calculate_P_n, calculate_t_n, label_pubkey, label_tweak, labeled_spend_pubkey, output_pubkey,
    shared_secret,
};
pub use hash::tagged_hash;
pub use keys::{
    negate_if_odd_y, parse_point, point_add, point_from_scalar, point_negate, scalar_add,
    scalar_mul, serialize_point, sum_public_keys, sum_secret_keys,
};
