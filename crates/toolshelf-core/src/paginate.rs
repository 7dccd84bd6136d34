//! Fixed-size pagination over ranked results.
//!
//! Pages are 1-based. Out-of-range page numbers are clamped into
//! `[1, page_count]` instead of producing an error or an empty slice past
//! the end, and an empty result set still has one (empty) page.

use serde::Serialize;

/// Listing page size used when nothing else is configured.
pub const DEFAULT_PAGE_SIZE: usize = 12;

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    /// The page actually returned, after clamping.
    pub page: usize,
    pub page_count: usize,
    pub page_size: usize,
    /// Number of results across all pages.
    pub total: usize,
}

/// `max(1, ceil(total / page_size))`. A zero page size counts as 1.
pub fn page_count(total: usize, page_size: usize) -> usize {
    total.div_ceil(page_size.max(1)).max(1)
}

/// Clamp a requested 1-based page into `[1, page_count]`.
pub fn clamp_page(page: usize, page_count: usize) -> usize {
    page.clamp(1, page_count.max(1))
}

/// Slice `results` to the requested page.
pub fn paginate<T>(results: Vec<T>, page: usize, page_size: usize) -> Page<T> {
    let page_size = page_size.max(1);
    let total = results.len();
    let page_count = page_count(total, page_size);
    let page = clamp_page(page, page_count);

    let items = results
        .into_iter()
        .skip((page - 1) * page_size)
        .take(page_size)
        .collect();

    Page {
        items,
        page,
        page_count,
        page_size,
        total,
    }
}
