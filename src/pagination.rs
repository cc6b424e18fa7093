//! Offset/limit paging shared by the listing endpoints.

use serde::{Deserialize, Serialize};

pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

/// Requested page, normalised so `page >= 1` and `1 <= limit <= MAX_LIMIT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: i64,
    pub limit: i64,
}

impl Page {
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    pub fn meta(&self, total: i64) -> PageMeta {
        PageMeta {
            page: self.page,
            limit: self.limit,
            total,
            last_page: (total + self.limit - 1) / self.limit,
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub last_page: i64,
}

/// One page of rows plus the metadata describing it.
#[derive(Debug, Clone)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub meta: PageMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_first_page_of_ten() {
        let page = Page::default();
        assert_eq!(page, Page { page: 1, limit: 10 });
        assert_eq!(page.offset(), 0);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        assert_eq!(Page::new(Some(0), Some(0)), Page { page: 1, limit: 1 });
        assert_eq!(Page::new(Some(-4), Some(5000)).limit, MAX_LIMIT);
    }

    #[test]
    fn offset_skips_previous_pages() {
        assert_eq!(Page::new(Some(3), Some(20)).offset(), 40);
    }

    #[test]
    fn last_page_rounds_up() {
        let page = Page::new(Some(1), Some(10));
        assert_eq!(page.meta(0).last_page, 0);
        assert_eq!(page.meta(10).last_page, 1);
        assert_eq!(page.meta(11).last_page, 2);
        assert_eq!(page.meta(25).last_page, 3);
    }

    #[test]
    fn meta_serializes_camel_case() {
        let json = serde_json::to_value(Page::default().meta(11)).unwrap();
        assert_eq!(json["lastPage"], 2);
        assert_eq!(json["total"], 11);
    }
}
