//! In-memory sink, for tests and embedding

use crate::job::JobRecord;
use crate::output::traits::{ItemSink, SinkResult};
use std::sync::{Arc, Mutex};

/// Collects records in a shared vector
///
/// Clones share the same storage, so a handle kept by the caller sees what
/// the coordinator pushed into its own clone.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<JobRecord>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the records pushed so far
    pub fn records(&self) -> Vec<JobRecord> {
        self.records
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap_or_else(|p| p.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ItemSink for MemorySink {
    fn push(&mut self, record: &JobRecord) -> SinkResult<()> {
        self.records
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(record.clone());
        Ok(())
    }

    fn flush(&mut self) -> SinkResult<()> {
        Ok(())
    }
}
