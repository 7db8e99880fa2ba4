//! EpisodeSource - bounded, paginated retrieval of a show's episodes
//!
//! ## Algorithm
//! 1. Ask the lister for the first page, requesting at most the page size
//!    (or the remaining bound, when smaller)
//! 2. Yield the page's episodes in order
//! 3. Follow the continuation token until one of:
//!    - `max_episodes` episodes have been yielded
//!    - the listing reports no next page
//!    - the platform returns a page with no entries at all
//!
//! A page whose entries were all dropped (unavailable episodes come back as
//! nulls) is not the end: the token is followed.
//!
//! The sequence is lazy: a page is only requested when the previous one has
//! been consumed and more episodes are still wanted.

use std::sync::Arc;

use domain::{Episode, MaxEpisodes, TransportError};
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use tracing::{debug, instrument};

use crate::traits::ShowEpisodeLister;
use crate::types::{MAX_EPISODE_PAGE_SIZE, PageRequest, PageToken};

/// Paginates a show's episode listing, most-recent-first.
#[derive(Clone)]
pub struct EpisodeSource {
    lister: Arc<dyn ShowEpisodeLister>,
    page_size: usize,
}

/// Position in the listing between two page requests
struct Cursor {
    token: Option<PageToken>,
    fetched: usize,
    exhausted: bool,
}

impl EpisodeSource {
    /// Create a new source using the platform's maximum page size
    pub fn new(lister: Arc<dyn ShowEpisodeLister>) -> Self {
        Self {
            lister,
            page_size: MAX_EPISODE_PAGE_SIZE,
        }
    }

    /// Configure the page size (default: 50)
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Lazily stream episodes, stopping at `max_episodes` or exhaustion.
    ///
    /// A transport failure is yielded as an `Err` item and ends the stream.
    pub fn stream<'a>(
        &'a self,
        show_id: &'a str,
        max_episodes: MaxEpisodes,
    ) -> BoxStream<'a, Result<Episode, TransportError>> {
        let limit = max_episodes.limit();
        let page_size = self.page_size;
        let start = Cursor {
            token: None,
            fetched: 0,
            exhausted: false,
        };

        let pages = stream::try_unfold(start, move |cursor| async move {
            if cursor.exhausted {
                return Ok(None);
            }
            let wanted = match limit {
                Some(n) => page_size.min(n.saturating_sub(cursor.fetched)),
                None => page_size,
            };
            if wanted == 0 {
                return Ok(None);
            }

            let request = match cursor.token {
                Some(token) => PageRequest::next(token, wanted),
                None => PageRequest::first(wanted),
            };
            let page = self.lister.list_episodes(show_id, request).await?;
            debug!(
                "Fetched page of {} episodes for show {} (has next: {})",
                page.items.len(),
                show_id,
                page.next.is_some()
            );

            let next = Cursor {
                fetched: cursor.fetched + page.items.len(),
                exhausted: !page.has_more(),
                token: page.next,
            };
            Ok::<_, TransportError>(Some((page.items, next)))
        });

        let episodes = pages
            .map_ok(|items| stream::iter(items.into_iter().map(Ok)))
            .try_flatten();

        match limit {
            Some(n) => episodes.take(n).boxed(),
            None => episodes.boxed(),
        }
    }

    /// Fetch the whole bounded sequence.
    ///
    /// All-or-nothing: if any page fails, episodes already received are
    /// discarded and the error is returned.
    #[instrument(skip(self))]
    pub async fn fetch(
        &self,
        show_id: &str,
        max_episodes: MaxEpisodes,
    ) -> Result<Vec<Episode>, TransportError> {
        let episodes: Vec<Episode> = self.stream(show_id, max_episodes).try_collect().await?;
        debug!("Fetched {} episodes for show {}", episodes.len(), show_id);
        Ok(episodes)
    }
}
