/// Page size used when the caller does not ask for one
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Largest page size a caller can get, whatever they request
pub const MAX_PAGE_SIZE: u32 = 100;

/// A clamped limit/offset window
///
/// # Invariants
/// - `limit` is within `1..=MAX_PAGE_SIZE`
/// - `offset` is never negative
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    limit: u32,
    offset: u64,
}

impl Page {
    /// Builds a page from raw caller values
    ///
    /// Oversized limits are capped rather than rejected, non-positive limits
    /// become 1, and missing or negative offsets become 0.
    ///
    /// # Example
    /// ```
    /// use agentshield_api::domain::pagination::Page;
    ///
    /// let page = Page::new(Some(500), Some(-3));
    /// assert_eq!(page.limit(), 100);
    /// assert_eq!(page.offset(), 0);
    /// ```
    pub fn new(limit: Option<i64>, offset: Option<i64>) -> Self {
        let limit = limit
            .unwrap_or(i64::from(DEFAULT_PAGE_SIZE))
            .clamp(1, i64::from(MAX_PAGE_SIZE)) as u32;
        let offset = offset.unwrap_or(0).max(0) as u64;

        Self { limit, offset }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(None, None)
    }
}
