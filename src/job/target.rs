use crate::job::PartialJobRecord;
use crate::state::Stage;
use url::Url;

/// One pending fetch
#[derive(Debug, Clone)]
pub struct CrawlTarget {
    /// The URL to fetch
    pub url: Url,

    /// Which stage handles the response
    pub stage: Stage,

    /// 1-based page number within its listing lineage (list targets only)
    pub page_number: Option<u32>,

    /// Fields collected on the listing page (detail targets only)
    pub carried: Option<PartialJobRecord>,
}

impl CrawlTarget {
    /// Creates a listing target
    pub fn list(url: Url, page_number: u32) -> Self {
        Self {
            url,
            stage: Stage::List,
            page_number: Some(page_number),
            carried: None,
        }
    }

    /// Creates a detail target carrying the listing-stage fields
    pub fn detail(url: Url, carried: PartialJobRecord) -> Self {
        Self {
            url,
            stage: Stage::Detail,
            page_number: None,
            carried: Some(carried),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_target() {
        let url = Url::parse("https://www.kariyer.net/is-ilanlari").unwrap();
        let target = CrawlTarget::list(url, 1);
        assert_eq!(target.stage, Stage::List);
        assert_eq!(target.page_number, Some(1));
        assert!(target.carried.is_none());
    }

    #[test]
    fn test_detail_target_carries_fields() {
        let url = Url::parse("https://www.kariyer.net/is-ilani/acme-1").unwrap();
        let carried = PartialJobRecord {
            title: Some("Developer".to_string()),
            ..Default::default()
        };
        let target = CrawlTarget::detail(url, carried);
        assert_eq!(target.stage, Stage::Detail);
        assert_eq!(target.page_number, None);
        assert_eq!(
            target.carried.and_then(|c| c.title).as_deref(),
            Some("Developer")
        );
    }
}
