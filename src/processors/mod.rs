pub mod batcher;
pub mod key_tracker;
pub mod normalizer;

pub use batcher::{Batcher, Batches};
pub use key_tracker::{last_write_wins, KeyTracker};
pub use normalizer::{coerce_decimal, coerce_integer, RowNormalizer};
