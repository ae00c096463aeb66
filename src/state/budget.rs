/// Run-scoped counters bounding a crawl
///
/// The budget is owned by the coordinator task, so every check-and-increment
/// below happens without interleaving from workers.
#[derive(Debug, Clone)]
pub struct CrawlBudget {
    /// Desired number of saved records; None means unbounded
    target_count: Option<u64>,

    /// Maximum number of listing pages for the whole run
    max_pages: u32,

    /// Listing pages reserved so far (start URLs included)
    pages_visited: u32,

    /// Records handed to the sink
    items_saved: u64,

    /// Detail targets created
    details_queued: u64,
}

impl CrawlBudget {
    /// Creates a fresh budget
    pub fn new(target_count: Option<u64>, max_pages: u32) -> Self {
        Self {
            target_count,
            max_pages,
            pages_visited: 0,
            items_saved: 0,
            details_queued: 0,
        }
    }

    pub fn target_count(&self) -> Option<u64> {
        self.target_count
    }

    pub fn max_pages(&self) -> u32 {
        self.max_pages
    }

    pub fn pages_visited(&self) -> u32 {
        self.pages_visited
    }

    pub fn items_saved(&self) -> u64 {
        self.items_saved
    }

    pub fn details_queued(&self) -> u64 {
        self.details_queued
    }

    /// Reserves one listing page if the page budget allows it
    pub fn try_reserve_page(&mut self) -> bool {
        if self.pages_visited >= self.max_pages {
            return false;
        }
        self.pages_visited += 1;
        true
    }

    /// Counts one saved record unless the target is already reached
    pub fn try_save_item(&mut self) -> bool {
        if self.reached(self.items_saved) {
            return false;
        }
        self.items_saved += 1;
        true
    }

    /// Counts one queued detail target unless the target is already reached
    pub fn try_queue_detail(&mut self) -> bool {
        if self.reached(self.details_queued) {
            return false;
        }
        self.details_queued += 1;
        true
    }

    /// Returns true once enough records have been saved
    pub fn is_satisfied(&self) -> bool {
        self.reached(self.items_saved)
    }

    /// Returns true while listing pages can still contribute items
    ///
    /// In two-stage mode the listing side is done once enough details are
    /// queued; in listing-only mode once enough items are saved.
    pub fn wants_more_listings(&self, collect_details: bool) -> bool {
        if collect_details {
            !self.reached(self.details_queued)
        } else {
            !self.reached(self.items_saved)
        }
    }

    fn reached(&self, count: u64) -> bool {
        self.target_count.is_some_and(|target| count >= target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_stops_at_target() {
        let mut budget = CrawlBudget::new(Some(2), 10);
        assert!(budget.try_save_item());
        assert!(budget.try_save_item());
        assert!(!budget.try_save_item());
        assert_eq!(budget.items_saved(), 2);
        assert!(budget.is_satisfied());
    }

    #[test]
    fn test_unbounded_target_never_satisfied() {
        let mut budget = CrawlBudget::new(None, 10);
        for _ in 0..1000 {
            assert!(budget.try_save_item());
        }
        assert!(!budget.is_satisfied());
        assert!(budget.wants_more_listings(false));
    }

    #[test]
    fn test_page_reservation() {
        let mut budget = CrawlBudget::new(None, 2);
        assert!(budget.try_reserve_page());
        assert!(budget.try_reserve_page());
        assert!(!budget.try_reserve_page());
        assert_eq!(budget.pages_visited(), 2);
    }

    #[test]
    fn test_detail_queue_limits_listing_demand() {
        let mut budget = CrawlBudget::new(Some(1), 5);
        assert!(budget.wants_more_listings(true));
        assert!(budget.try_queue_detail());
        assert!(!budget.try_queue_detail());
        assert!(!budget.wants_more_listings(true));
        // Nothing saved yet, so the run itself is not done
        assert!(!budget.is_satisfied());
    }
}
