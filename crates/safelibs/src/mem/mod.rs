//! Side-channel- and optimizer-resistant memory primitives.
//!
//! `zero` writes cannot be removed as dead stores, `compare` runs in time
//! independent of where the inputs differ, and `search` confirms every
//! candidate match through `compare`.

pub mod compare;
pub mod search;
pub mod zero;

pub use compare::{compare, compare_raw};
pub use search::{find, find_raw};
pub use zero::{fill, fill_raw, zero, zero_raw};
