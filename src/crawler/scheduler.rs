//! Scheduler for the crawl frontier, worker bound and pacing
//!
//! This module handles:
//! - Priority queue of pending targets (detail pages before listing pages,
//!   FIFO within a stage)
//! - Global concurrency limiting via a semaphore
//! - Jittered pacing delays applied by workers before each fetch

use crate::job::CrawlTarget;
use crate::state::Stage;
use rand::Rng;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// A target waiting in the frontier
#[derive(Debug, Clone)]
pub struct QueuedTarget {
    pub target: CrawlTarget,

    /// Priority value (lower is higher priority)
    pub priority: u32,

    /// Insertion order, for FIFO within a priority
    seq: u64,
}

impl QueuedTarget {
    fn priority_of(stage: Stage) -> u32 {
        match stage {
            Stage::Detail => 0,
            Stage::List => 10,
        }
    }
}

// Lower priority values pop first from the max-heap, then older entries
impl Ord for QueuedTarget {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for QueuedTarget {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for QueuedTarget {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.seq == other.seq
    }
}

impl Eq for QueuedTarget {}

/// A target cleared for dispatch, holding one worker slot
pub struct ScheduledTarget {
    pub target: CrawlTarget,

    /// Released when the worker task finishes
    pub permit: OwnedSemaphorePermit,
}

/// Frontier plus worker bound
///
/// Dispatch never waits: [`Scheduler::try_next`] returns None when the
/// frontier is empty or every worker slot is taken, and the coordinator goes
/// back to collecting finished work.
pub struct Scheduler {
    semaphore: Arc<Semaphore>,
    concurrency: usize,
    frontier: BinaryHeap<QueuedTarget>,
    next_seq: u64,
}

impl Scheduler {
    pub fn new(concurrency: usize) -> Self {
        let concurrency = concurrency.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(concurrency)),
            concurrency,
            frontier: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    /// Adds a target to the frontier
    pub fn push(&mut self, target: CrawlTarget) {
        let priority = QueuedTarget::priority_of(target.stage);
        let seq = self.next_seq;
        self.next_seq += 1;
        self.frontier.push(QueuedTarget {
            target,
            priority,
            seq,
        });
    }

    /// Pops the highest-priority target if a worker slot is free
    pub fn try_next(&mut self) -> Option<ScheduledTarget> {
        if self.frontier.is_empty() {
            return None;
        }

        let permit = self.semaphore.clone().try_acquire_owned().ok()?;
        let queued = self.frontier.pop()?;
        tracing::trace!("Dispatching {} target {}", queued.target.stage, queued.target.url);

        Some(ScheduledTarget {
            target: queued.target,
            permit,
        })
    }

    /// Drops every pending target, returning how many were dropped
    pub fn clear(&mut self) -> usize {
        let dropped = self.frontier.len();
        self.frontier.clear();
        dropped
    }

    /// Returns the number of targets in the frontier
    pub fn frontier_size(&self) -> usize {
        self.frontier.len()
    }

    /// Returns whether the frontier is empty
    pub fn is_empty(&self) -> bool {
        self.frontier.is_empty()
    }

    /// Number of worker slots currently taken
    pub fn in_flight(&self) -> usize {
        self.concurrency - self.semaphore.available_permits()
    }
}

/// Uniformly random delay between two bounds
#[derive(Debug, Clone, Copy)]
pub struct Pacing {
    pub min: Duration,
    pub max: Duration,
}

impl Pacing {
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        Self {
            min: Duration::from_millis(min_ms.min(max_ms)),
            max: Duration::from_millis(max_ms.max(min_ms)),
        }
    }

    /// No delay at all
    pub fn none() -> Self {
        Self::new(0, 0)
    }

    pub fn next_delay(&self) -> Duration {
        if self.max <= self.min {
            return self.min;
        }
        let min = self.min.as_millis() as u64;
        let max = self.max.as_millis() as u64;
        Duration::from_millis(rand::thread_rng().gen_range(min..=max))
    }
}
