pub mod normalizer;

pub use normalizer::{decode_transfer, format_utc, normalize_batch, normalize_transfer, scale_value};
