//! Output module for emitted records and run summaries
//!
//! This module handles:
//! - The `ItemSink` trait records are pushed through
//! - A JSON Lines file sink and an in-memory sink
//! - Run summary counters and their display

mod jsonl;
mod memory;
pub mod stats;
mod traits;

pub use jsonl::JsonLinesSink;
pub use memory::MemorySink;
pub use stats::{print_summary, RunSummary};
pub use traits::{ItemSink, SinkError, SinkResult};
