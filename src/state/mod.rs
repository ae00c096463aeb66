//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `Stage`: which half of the two-stage pipeline a target belongs to
//! - `PageOutcome`: how the processing of a fetched target ended
//! - `CrawlBudget`: run-scoped counters checked against the target count and page budget
//! - `SeenSet`: normalized URLs already scheduled, used for deduplication

mod budget;
mod seen;
mod stage;

pub use budget::CrawlBudget;
pub use seen::SeenSet;
pub use stage::{PageOutcome, Stage};
