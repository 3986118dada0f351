use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{Listing, ListingDetail, MediaItem, OwnerSummary};

/// Derived counters; not stored on the listing row itself
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingStats {
    pub views: u64,
    pub likes: u64,
}

/// A matched listing joined with its related records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedListing {
    #[serde(flatten)]
    pub listing: Listing,
    pub detail: Option<ListingDetail>,
    #[serde(default)]
    pub media: Vec<MediaItem>,
    pub owner: Option<OwnerSummary>,
    /// Whole days since creation
    pub days_listed: i64,
    #[serde(default)]
    pub stats: ListingStats,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
    pub total_pages: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Pagination {
    pub fn new(page: u32, per_page: u32, total: u64) -> Self {
        let per_page = per_page.max(1);
        let total_pages = total.div_ceil(u64::from(per_page));
        Self {
            page,
            per_page,
            total,
            total_pages,
            has_next: u64::from(page) < total_pages,
            has_prev: page > 1,
        }
    }

    /// Zero-based position of this page's first row in the whole result
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.per_page)
    }
}

/// Echo of the recognized, non-empty filters a page was computed from
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppliedFilters {
    pub applied: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultPage {
    pub data: Vec<EnrichedListing>,
    pub pagination: Pagination,
    pub filters: AppliedFilters,
}

impl ResultPage {
    pub fn empty(page: u32, per_page: u32, filters: AppliedFilters) -> Self {
        Self {
            data: Vec::new(),
            pagination: Pagination::new(page, per_page, 0),
            filters,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_flags() {
        let p = Pagination::new(1, 20, 45);
        assert_eq!(p.total_pages, 3);
        assert!(p.has_next);
        assert!(!p.has_prev);

        let last = Pagination::new(3, 20, 45);
        assert!(!last.has_next);
        assert!(last.has_prev);
    }

    #[test]
    fn empty_total_has_no_pages() {
        let p = Pagination::new(1, 20, 0);
        assert_eq!(p.total_pages, 0);
        assert!(!p.has_next);
        assert!(!p.has_prev);
    }

    #[test]
    fn offset_does_not_overflow_on_deep_pages() {
        assert_eq!(Pagination::new(1, 20, 45).offset(), 0);
        assert_eq!(Pagination::new(3, 20, 45).offset(), 40);
        let deep = Pagination::new(300_000_000, 50, 10);
        assert_eq!(deep.offset(), 14_999_999_950);
    }

    #[test]
    fn page_past_the_end_keeps_total() {
        let p = Pagination::new(9, 10, 25);
        assert_eq!(p.total, 25);
        assert_eq!(p.total_pages, 3);
        assert!(!p.has_next);
        assert!(p.has_prev);
    }
}
