//! Page-number pagination primitives for Postboard listings.
//!
//! Listings are sliced into fixed-size pages addressed by a 1-based page
//! number taken from the `?page=` query parameter. Parsing is lenient: a
//! missing or malformed number selects the first page and a number past the
//! end selects the last page, so a listing URL never fails because of its
//! page parameter.
//!
//! The flow is:
//! 1. parse the raw query value with [`PageRequest::parse`];
//! 2. count the matching rows and build a [`Paginator`];
//! 3. ask the paginator for a [`PageWindow`] and fetch `limit` rows from
//!    `offset`;
//! 4. wrap the rows in a [`Page`] for rendering.
//!
//! # Examples
//! ```
//! use pagination::{Page, PageRequest, Paginator};
//!
//! let paginator = Paginator::new(13, 10).expect("non-zero page size");
//! let window = paginator.window(PageRequest::parse(Some("2")));
//! assert_eq!((window.offset(), window.limit()), (10, 10));
//!
//! let items: Vec<u32> = (10..13).collect();
//! let page = Page::new(items, window, &paginator);
//! assert_eq!(page.len(), 3);
//! assert!(page.has_previous());
//! assert!(!page.has_next());
//! ```

use serde::Serialize;
use thiserror::Error;

/// Errors raised while configuring pagination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PaginationError {
    /// A paginator needs at least one item per page.
    #[error("page size must be at least 1")]
    ZeroPageSize,
}

/// Requested page number, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRequest(u64);

impl PageRequest {
    /// The first page.
    pub const FIRST: Self = Self(1);

    /// Parse a raw `page` query value.
    ///
    /// Missing, empty, non-numeric and zero values select the first page.
    ///
    /// # Examples
    /// ```
    /// use pagination::PageRequest;
    ///
    /// assert_eq!(PageRequest::parse(Some("3")).number(), 3);
    /// assert_eq!(PageRequest::parse(Some("abc")).number(), 1);
    /// assert_eq!(PageRequest::parse(None).number(), 1);
    /// ```
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        raw.map(str::trim)
            .and_then(|value| value.parse::<u64>().ok())
            .filter(|number| *number >= 1)
            .map_or(Self::FIRST, Self)
    }

    /// Requested page number.
    #[must_use]
    pub const fn number(self) -> u64 {
        self.0
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::FIRST
    }
}

/// Splits a listing of `total` items into pages of `per_page` items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    total: u64,
    per_page: u64,
}

impl Paginator {
    /// Build a paginator for `total` items.
    ///
    /// # Errors
    /// Returns [`PaginationError::ZeroPageSize`] when `per_page` is zero.
    pub const fn new(total: u64, per_page: u64) -> Result<Self, PaginationError> {
        if per_page == 0 {
            return Err(PaginationError::ZeroPageSize);
        }
        Ok(Self { total, per_page })
    }

    /// Total number of items across all pages.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.total
    }

    /// Number of items on a full page.
    #[must_use]
    pub const fn per_page(&self) -> u64 {
        self.per_page
    }

    /// Number of pages; an empty listing still has one (empty) page.
    #[must_use]
    pub const fn num_pages(&self) -> u64 {
        if self.total == 0 {
            return 1;
        }
        self.total.div_ceil(self.per_page)
    }

    /// Resolve a request into the slice of items to fetch.
    ///
    /// Requests beyond the last page are clamped to the last page.
    #[must_use]
    pub fn window(&self, request: PageRequest) -> PageWindow {
        let number = request.number().clamp(1, self.num_pages());
        PageWindow {
            number,
            offset: (number - 1) * self.per_page,
            limit: self.per_page,
        }
    }
}

/// Offset/limit slice selected for one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    number: u64,
    offset: u64,
    limit: u64,
}

impl PageWindow {
    /// Resolved 1-based page number.
    #[must_use]
    pub const fn number(&self) -> u64 {
        self.number
    }

    /// Number of items to skip.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.offset
    }

    /// Maximum number of items to fetch.
    #[must_use]
    pub const fn limit(&self) -> u64 {
        self.limit
    }
}

/// One page of items plus navigation metadata.
///
/// Serialises with the navigation fields flattened next to `items`, which is
/// the shape page templates consume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    items: Vec<T>,
    number: u64,
    num_pages: u64,
    total: u64,
    per_page: u64,
    has_next: bool,
    has_previous: bool,
    page_range: Vec<u64>,
}

impl<T> Page<T> {
    /// Assemble a page from the fetched items.
    #[must_use]
    pub fn new(items: Vec<T>, window: PageWindow, paginator: &Paginator) -> Self {
        let num_pages = paginator.num_pages();
        Self {
            items,
            number: window.number(),
            num_pages,
            total: paginator.total(),
            per_page: paginator.per_page(),
            has_next: window.number() < num_pages,
            has_previous: window.number() > 1,
            page_range: (1..=num_pages).collect(),
        }
    }

    /// Items on this page.
    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Consume the page, returning its items.
    #[must_use]
    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    /// Number of items on this page.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether this page holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// 1-based number of this page.
    #[must_use]
    pub const fn number(&self) -> u64 {
        self.number
    }

    /// Total number of pages.
    #[must_use]
    pub const fn num_pages(&self) -> u64 {
        self.num_pages
    }

    /// Number of items across every page.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.total
    }

    /// Whether a later page exists.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.has_next
    }

    /// Whether an earlier page exists.
    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.has_previous
    }

    /// Number of the next page, if any.
    #[must_use]
    pub const fn next_page_number(&self) -> Option<u64> {
        if self.has_next {
            Some(self.number + 1)
        } else {
            None
        }
    }

    /// Number of the previous page, if any.
    #[must_use]
    pub const fn previous_page_number(&self) -> Option<u64> {
        if self.has_previous {
            Some(self.number - 1)
        } else {
            None
        }
    }

    /// 1-based index of the first item on this page, or 0 when empty.
    #[must_use]
    pub fn start_index(&self) -> u64 {
        if self.items.is_empty() {
            return 0;
        }
        (self.number - 1) * self.per_page + 1
    }

    /// 1-based index of the last item on this page, or 0 when empty.
    #[must_use]
    pub fn end_index(&self) -> u64 {
        if self.items.is_empty() {
            return 0;
        }
        let len = u64::try_from(self.items.len()).unwrap_or(u64::MAX);
        self.start_index().saturating_add(len - 1)
    }

    /// Page numbers available for navigation links.
    #[must_use]
    pub fn page_range(&self) -> &[u64] {
        &self.page_range
    }

    /// Transform the items while keeping the navigation metadata.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            num_pages: self.num_pages,
            total: self.total,
            per_page: self.per_page,
            has_next: self.has_next,
            has_previous: self.has_previous,
            page_range: self.page_range,
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit coverage for page parsing, clamping and navigation metadata.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(None, 1)]
    #[case(Some(""), 1)]
    #[case(Some("abc"), 1)]
    #[case(Some("0"), 1)]
    #[case(Some("-2"), 1)]
    #[case(Some(" 2 "), 2)]
    #[case(Some("7"), 7)]
    fn parse_is_lenient(#[case] raw: Option<&str>, #[case] expected: u64) {
        assert_eq!(PageRequest::parse(raw).number(), expected);
    }

    #[rstest]
    fn zero_page_size_is_rejected() {
        assert_eq!(Paginator::new(5, 0), Err(PaginationError::ZeroPageSize));
    }

    #[rstest]
    #[case(0, 10, 1)]
    #[case(1, 10, 1)]
    #[case(10, 10, 1)]
    #[case(11, 10, 2)]
    #[case(13, 10, 2)]
    #[case(30, 10, 3)]
    fn num_pages_rounds_up(#[case] total: u64, #[case] per_page: u64, #[case] expected: u64) {
        let paginator = Paginator::new(total, per_page).expect("valid paginator");
        assert_eq!(paginator.num_pages(), expected);
    }

    #[rstest]
    #[case(1, 1, 0)]
    #[case(2, 2, 10)]
    #[case(99, 2, 10)]
    fn window_clamps_to_last_page(
        #[case] requested: u64,
        #[case] number: u64,
        #[case] offset: u64,
    ) {
        let paginator = Paginator::new(13, 10).expect("valid paginator");
        let window = paginator.window(PageRequest::parse(Some(&requested.to_string())));
        assert_eq!(window.number(), number);
        assert_eq!(window.offset(), offset);
        assert_eq!(window.limit(), 10);
    }

    #[rstest]
    fn last_page_metadata() {
        let paginator = Paginator::new(13, 10).expect("valid paginator");
        let window = paginator.window(PageRequest::parse(Some("2")));
        let page = Page::new(vec!["a", "b", "c"], window, &paginator);

        assert_eq!(page.len(), 3);
        assert!(!page.has_next());
        assert!(page.has_previous());
        assert_eq!(page.previous_page_number(), Some(1));
        assert_eq!(page.next_page_number(), None);
        assert_eq!(page.start_index(), 11);
        assert_eq!(page.end_index(), 13);
        assert_eq!(page.page_range(), &[1, 2]);
    }

    #[rstest]
    fn empty_listing_has_single_empty_page() {
        let paginator = Paginator::new(0, 10).expect("valid paginator");
        let page: Page<u8> = Page::new(Vec::new(), paginator.window(PageRequest::FIRST), &paginator);

        assert!(page.is_empty());
        assert_eq!(page.num_pages(), 1);
        assert_eq!(page.start_index(), 0);
        assert_eq!(page.end_index(), 0);
        assert!(!page.has_next());
        assert!(!page.has_previous());
    }

    #[rstest]
    fn map_preserves_navigation() {
        let paginator = Paginator::new(25, 10).expect("valid paginator");
        let window = paginator.window(PageRequest::parse(Some("2")));
        let page = Page::new(vec![1, 2], window, &paginator).map(|n| n * 10);

        assert_eq!(page.items(), &[10, 20]);
        assert_eq!(page.number(), 2);
        assert!(page.has_next());
    }
}
