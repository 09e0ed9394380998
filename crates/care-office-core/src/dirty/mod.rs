//! Field comparison and dirty tracking.
//!
//! Form values are compared loosely: empty strings, `null` and missing keys
//! are the same "blank" value, numbers compare numerically even when one side
//! arrived as text, and ISO dates compare as dates.

mod diff;
mod tracker;

pub use diff::*;
pub use tracker::*;
