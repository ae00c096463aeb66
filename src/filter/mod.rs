//! Stateless page and posting filters
//!
//! - `antibot`: classifies fetched bodies as block/challenge pages
//! - `age`: decides whether a posted date falls within the requested window

pub mod age;
pub mod antibot;

pub use age::{elapsed_days, is_within_age, is_within_age_at, AgeWindow};
pub use antibot::{detect_block, is_blocked, BLOCK_MARKERS};
