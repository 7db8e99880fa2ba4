//! Pagination types shared by every collaborator.

/// Opaque continuation token handed back by a listing call
pub type PageToken = String;

/// Largest page the platform serves for show episodes
pub const MAX_EPISODE_PAGE_SIZE: usize = 50;

/// Largest page the platform serves for playlist items
pub const MAX_PLAYLIST_PAGE_SIZE: usize = 100;

/// Request for one page of a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// `None` asks for the first page
    pub token: Option<PageToken>,
    /// Upper bound on items wanted; listers may return fewer
    pub limit: usize,
}

impl PageRequest {
    pub fn first(limit: usize) -> Self {
        Self { token: None, limit }
    }

    pub fn next(token: PageToken, limit: usize) -> Self {
        Self {
            token: Some(token),
            limit,
        }
    }
}

/// One page of a listing, in platform order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Token for the following page, `None` when exhausted
    pub next: Option<PageToken>,
    /// Raw entries the platform returned, before nulls and non-episode
    /// entries were dropped from `items`
    pub received: usize,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, next: Option<PageToken>) -> Self {
        let received = items.len();
        Self {
            items,
            next,
            received,
        }
    }

    /// A page whose `items` were filtered down from `received` raw entries.
    pub fn filtered(items: Vec<T>, received: usize, next: Option<PageToken>) -> Self {
        Self {
            items,
            next,
            received,
        }
    }

    pub fn last(items: Vec<T>) -> Self {
        Self::new(items, None)
    }

    /// Whether another page should be requested.
    ///
    /// Only the continuation token decides; a page emptied by filtering
    /// says nothing about the pages after it. A page with no raw entries
    /// ends the listing even when a token came back.
    pub fn has_more(&self) -> bool {
        self.next.is_some() && self.received > 0
    }
}
