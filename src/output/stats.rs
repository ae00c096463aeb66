//! Run summary counters and display
//!
//! The coordinator records every finished target here; the summary is
//! returned from a run and printed by the CLI.

use crate::state::{PageOutcome, Stage};
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;

/// Counters describing one crawl run
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    /// Hash of the configuration the run used
    pub config_hash: Option<String>,

    /// Finished targets per stage and outcome
    #[serde(skip)]
    pub outcomes: HashMap<(Stage, PageOutcome), u64>,

    /// Records handed to the sink
    pub items_saved: u64,

    /// Detail targets created
    pub details_queued: u64,

    /// Cards skipped because their URL was already scheduled
    pub duplicates_skipped: u64,

    /// Records dropped by the age window
    pub age_filtered: u64,

    /// Cards dropped because they had no usable URL
    pub cards_without_url: u64,

    /// Listing pages that needed the anchor-scan parse
    pub secondary_parses: u64,

    /// Fetch calls issued, identity refetches included
    pub requests: u64,

    /// Pending targets dropped once the target count was reached
    pub targets_dropped: u64,

    /// Wall-clock duration of the run
    pub elapsed: Duration,

    /// True when a hard ceiling stopped the run
    pub terminated_early: bool,
}

impl RunSummary {
    pub fn new(config_hash: Option<String>) -> Self {
        Self {
            config_hash,
            ..Default::default()
        }
    }

    /// Counts one finished target
    pub fn record(&mut self, stage: Stage, outcome: PageOutcome) {
        *self.outcomes.entry((stage, outcome)).or_insert(0) += 1;
    }

    /// Finished targets with this stage and outcome
    pub fn count(&self, stage: Stage, outcome: PageOutcome) -> u64 {
        self.outcomes.get(&(stage, outcome)).copied().unwrap_or(0)
    }

    /// Finished targets of a stage, any outcome
    pub fn pages(&self, stage: Stage) -> u64 {
        self.outcomes
            .iter()
            .filter(|((s, _), _)| *s == stage)
            .map(|(_, count)| count)
            .sum()
    }

    pub fn total_pages(&self) -> u64 {
        self.outcomes.values().sum()
    }

    /// Targets skipped because of a block page
    pub fn blocked_pages(&self) -> u64 {
        [Stage::List, Stage::Detail]
            .into_iter()
            .map(|stage| self.count(stage, PageOutcome::Blocked))
            .sum()
    }

    /// Targets that ended in any failure, blocks included
    pub fn failed_pages(&self) -> u64 {
        self.outcomes
            .iter()
            .filter(|((_, outcome), _)| outcome.is_failure())
            .map(|(_, count)| count)
            .sum()
    }

    /// Share of finished targets whose content was usable, in percent
    pub fn success_rate(&self) -> f64 {
        let total = self.total_pages();
        if total == 0 {
            return 0.0;
        }
        (total - self.failed_pages()) as f64 / total as f64 * 100.0
    }

    /// Share of queued details that became saved records, in percent
    pub fn detail_yield(&self) -> f64 {
        if self.details_queued == 0 {
            return 0.0;
        }
        self.count(Stage::Detail, PageOutcome::Processed) as f64 / self.details_queued as f64
            * 100.0
    }

    pub fn items_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs <= 0.0 {
            return 0.0;
        }
        self.items_saved as f64 / secs
    }
}

/// Prints a run summary to stdout
pub fn print_summary(summary: &RunSummary) {
    println!("=== Crawl Summary ===\n");

    println!("Overview:");
    println!("  Items saved: {}", summary.items_saved);
    println!("  Listing pages: {}", summary.pages(Stage::List));
    println!("  Detail pages: {}", summary.pages(Stage::Detail));
    println!("  Requests issued: {}", summary.requests);
    println!(
        "  Elapsed: {:.1}s ({:.2} items/sec)",
        summary.elapsed.as_secs_f64(),
        summary.items_per_second()
    );
    if let Some(hash) = &summary.config_hash {
        println!("  Config hash: {}", &hash[..hash.len().min(12)]);
    }
    println!();

    println!("Pages by Outcome:");
    let total = summary.total_pages();
    for stage in [Stage::List, Stage::Detail] {
        for outcome in PageOutcome::all() {
            let count = summary.count(stage, outcome);
            if count == 0 {
                continue;
            }
            let percentage = if total > 0 {
                (count as f64 / total as f64) * 100.0
            } else {
                0.0
            };
            println!("  {} {}: {} ({:.1}%)", stage, outcome, count, percentage);
        }
    }
    println!();

    println!("Filtering:");
    println!("  Duplicates skipped: {}", summary.duplicates_skipped);
    println!("  Outside age window: {}", summary.age_filtered);
    println!("  Cards without URL: {}", summary.cards_without_url);
    println!("  Secondary parses: {}", summary.secondary_parses);
    if summary.details_queued > 0 {
        println!(
            "  Details queued: {} ({:.1}% saved)",
            summary.details_queued,
            summary.detail_yield()
        );
    }
    println!();

    if summary.terminated_early {
        println!("Run stopped early by a time or request ceiling.");
    } else if summary.targets_dropped > 0 {
        println!(
            "Target reached, {} pending targets dropped.",
            summary.targets_dropped
        );
    }

    println!(
        "Success Rate: {:.1}% ({} / {} pages usable)",
        summary.success_rate(),
        total - summary.failed_pages(),
        total
    );
}
