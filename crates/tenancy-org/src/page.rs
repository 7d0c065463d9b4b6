//! Offset/limit pagination shared by every listing.

use serde::{Deserialize, Serialize};

/// Default page size when none is requested.
pub const DEFAULT_LIMIT: usize = 10;

/// Upper bound for a single page.
pub const MAX_LIMIT: usize = 100;

/// Offset/limit request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Page {
    /// Number of items to skip
    pub offset: usize,
    /// Maximum number of items to return
    pub limit: usize,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl Page {
    pub fn new(offset: usize, limit: usize) -> Self {
        Self { offset, limit }
    }

    /// Limit clamped to `1..=MAX_LIMIT`.
    pub fn effective_limit(&self) -> usize {
        self.limit.clamp(1, MAX_LIMIT)
    }

    /// Cut one page out of an already sorted and filtered collection.
    ///
    /// ```
    /// use tenancy_org::{Page, Paged};
    ///
    /// let paged = Page::new(2, 2).slice((1..=5).collect::<Vec<_>>());
    /// assert_eq!(paged.items, vec![3, 4]);
    /// assert_eq!(paged.total, 5);
    /// ```
    pub fn slice<T>(&self, items: Vec<T>) -> Paged<T> {
        let total = items.len();
        let limit = self.effective_limit();
        let items = items.into_iter().skip(self.offset).take(limit).collect();
        Paged {
            items,
            total,
            offset: self.offset,
            limit,
        }
    }
}

/// One page of results plus the total number of matches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Paged<T> {
    /// Items of this page
    pub items: Vec<T>,
    /// Total number of matching items across all pages
    pub total: usize,
    /// Offset the page starts at
    pub offset: usize,
    /// Applied limit
    pub limit: usize,
}

impl<T> Paged<T> {
    /// Transform the items, keeping the paging data.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paged<U> {
        Paged {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            offset: self.offset,
            limit: self.limit,
        }
    }
}
