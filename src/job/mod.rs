//! Job data model
//!
//! `PartialJobRecord` is what extractors produce, `JobRecord` is what the
//! sink receives, and `CrawlTarget` is one pending fetch.

mod record;
mod target;

pub use record::{JobRecord, PartialJobRecord, SOURCE};
pub use target::CrawlTarget;
