//! Fixed-size pages over an ordered listing.
//!
//! Page numbers are 1-based. A page past the end is empty: it keeps the
//! requested number and the true total so the caller can still draw page
//! controls. The in-memory [`paginate`] and the SQL listings in the
//! repositories follow the same rules.

use serde::Serialize;

/// Number of books shown per page unless configured otherwise.
pub const DEFAULT_PAGE_SIZE: u32 = 5;

/// A requested page, normalised so that both page and size are at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    size: u32,
}
impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_SIZE)
    }
}
impl PageRequest {
    pub fn new(page: u32, size: u32) -> Self {
        Self { page: page.max(1), size: size.max(1) }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Number of items that come before this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.size)
    }

    pub fn limit(&self) -> u64 {
        u64::from(self.size)
    }
}

/// One page of a listing plus what is needed to draw page controls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
}
impl<T> Page<T> {
    pub(crate) fn new(items: Vec<T>, request: PageRequest, total: u64) -> Self {
        Self { items, page: request.page(), page_size: request.size(), total }
    }

    /// Total number of pages; an empty listing still has one (empty) page.
    pub fn pages(&self) -> u32 {
        let pages = self.total.div_ceil(u64::from(self.page_size.max(1))).max(1);
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.pages()
    }

    pub fn prev(&self) -> Option<u32> {
        self.has_prev().then(|| (self.page - 1).min(self.pages()))
    }

    pub fn next(&self) -> Option<u32> {
        self.has_next().then(|| self.page + 1)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            page_size: self.page_size,
            total: self.total,
        }
    }
}

/// Slice an already ordered listing into the requested page.
pub fn paginate<T>(items: impl IntoIterator<Item = T>, page: u32, page_size: u32) -> Page<T> {
    let request = PageRequest::new(page, page_size);
    let mut total = 0u64;
    let mut slice = Vec::with_capacity(request.size() as usize);
    for (index, item) in items.into_iter().enumerate() {
        total += 1;
        let index = index as u64;
        if index >= request.offset() && index < request.offset() + request.limit() {
            slice.push(item);
        }
    }
    Page::new(slice, request, total)
}
