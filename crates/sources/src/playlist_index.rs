//! Build a DuplicateIndex from a playlist's current contents.
//!
//! The playlist is always paginated to the end: stopping early would let an
//! old entry slip through as "new" and be appended a second time.

use domain::{DuplicateIndex, TransportError};
use tracing::{debug, instrument};

use crate::traits::PlaylistContentLister;
use crate::types::{MAX_PLAYLIST_PAGE_SIZE, PageRequest};

/// Fetch every episode identifier in the playlist and index them.
#[instrument(skip(lister))]
pub async fn build_duplicate_index(
    lister: &dyn PlaylistContentLister,
    playlist_id: &str,
) -> Result<DuplicateIndex, TransportError> {
    let mut index = DuplicateIndex::new();
    let mut request = PageRequest::first(MAX_PLAYLIST_PAGE_SIZE);
    let mut pages = 0usize;

    loop {
        let page = lister.list_playlist_episodes(playlist_id, request).await?;
        pages += 1;

        let has_more = page.has_more();
        index.extend(page.items);

        // Pages holding only music tracks or local files come back empty
        match page.next {
            Some(token) if has_more => request = PageRequest::next(token, MAX_PLAYLIST_PAGE_SIZE),
            _ => break,
        }
    }

    debug!(
        "Playlist {} holds {} episodes ({} pages)",
        playlist_id,
        index.len(),
        pages
    );
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryPlatform;
    use crate::types::Page;
    use async_trait::async_trait;
    use domain::EpisodeId;
    use std::sync::Mutex;

    /// Serves canned pages in order, like a playlist whose leading items
    /// are all music tracks
    struct CannedPlaylist {
        pages: Mutex<Vec<Page<EpisodeId>>>,
    }

    #[async_trait]
    impl PlaylistContentLister for CannedPlaylist {
        async fn list_playlist_episodes(
            &self,
            _playlist_id: &str,
            _request: PageRequest,
        ) -> Result<Page<EpisodeId>, TransportError> {
            let mut pages = self.pages.lock().unwrap();
            Ok(if pages.is_empty() {
                Page::last(vec![])
            } else {
                pages.remove(0)
            })
        }
    }

    #[tokio::test]
    async fn test_page_emptied_by_filtering_does_not_end_listing() {
        let lister = CannedPlaylist {
            pages: Mutex::new(vec![
                Page::filtered(vec![], 100, Some("100".to_string())),
                Page::last(vec!["old".to_string()]),
            ]),
        };

        let index = build_duplicate_index(&lister, "pl").await.unwrap();

        assert_eq!(index.len(), 1);
        assert!(index.contains("old"));
    }

    #[tokio::test]
    async fn test_page_without_entries_ends_listing() {
        let lister = CannedPlaylist {
            pages: Mutex::new(vec![
                Page::new(vec!["a".to_string()], Some("1".to_string())),
                Page::new(vec![], Some("1".to_string())),
                Page::last(vec!["never".to_string()]),
            ]),
        };

        let index = build_duplicate_index(&lister, "pl").await.unwrap();

        assert!(index.contains("a"));
        assert!(!index.contains("never"));
    }

    #[tokio::test]
    async fn test_index_covers_every_page() {
        let ids: Vec<String> = (0..250).map(|i| format!("ep{}", i)).collect();
        let platform = InMemoryPlatform::new().with_playlist("pl", ids);

        let index = build_duplicate_index(&platform, "pl").await.unwrap();

        assert_eq!(index.len(), 250);
        assert!(index.contains("ep0"));
        assert!(index.contains("ep249"));
        assert_eq!(platform.playlist_page_calls("pl"), 3);
    }

    #[tokio::test]
    async fn test_empty_playlist() {
        let platform = InMemoryPlatform::new().with_playlist("pl", vec![]);

        let index = build_duplicate_index(&platform, "pl").await.unwrap();

        assert!(index.is_empty());
        assert_eq!(platform.playlist_page_calls("pl"), 1);
    }

    #[tokio::test]
    async fn test_listing_failure_propagates() {
        let platform = InMemoryPlatform::new()
            .with_playlist("pl", vec!["a".to_string()])
            .fail_playlist_listing("pl");

        let result = build_duplicate_index(&platform, "pl").await;
        assert!(result.is_err());
    }
}
