// models/src/page.rs

use serde::{Deserialize, Serialize};

/// One page of a listing plus the totals callers need to render paging
/// controls without a second query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    /// Slices `all` down to the requested page. Page numbers are 1-based;
    /// zero or missing values fall back to sane defaults.
    pub fn slice(all: Vec<T>, page: usize, per_page: usize) -> Self {
        let per_page = if per_page == 0 { 20 } else { per_page };
        let page = if page == 0 { 1 } else { page };
        let total = all.len();
        let total_pages = total.div_ceil(per_page).max(1);
        let items = all
            .into_iter()
            .skip((page - 1) * per_page)
            .take(per_page)
            .collect();
        Page {
            items,
            total,
            page,
            per_page,
            total_pages,
        }
    }
}
