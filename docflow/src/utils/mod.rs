//! Small shared helpers.

mod digest;
mod timestamps;

pub use digest::short_digest;
pub use timestamps::{iso_timestamp, now_utc, Timestamp};
