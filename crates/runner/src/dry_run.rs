//! Appender that records what would be added without writing anything.

use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use domain::{EpisodeId, PlaylistId, TransportError};
use sources::PlaylistAppender;

/// Accepts every batch and remembers it.
#[derive(Debug)]
pub struct DryRunAppender {
    max_batch_size: usize,
    recorded: Mutex<Vec<(PlaylistId, Vec<EpisodeId>)>>,
}

impl DryRunAppender {
    pub fn new(max_batch_size: usize) -> Self {
        Self {
            max_batch_size: max_batch_size.max(1),
            recorded: Mutex::new(Vec::new()),
        }
    }

    /// Every batch received, in call order
    pub fn recorded(&self) -> Vec<(PlaylistId, Vec<EpisodeId>)> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<(PlaylistId, Vec<EpisodeId>)>> {
        self.recorded.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for DryRunAppender {
    fn default() -> Self {
        Self::new(100)
    }
}

#[async_trait]
impl PlaylistAppender for DryRunAppender {
    fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    async fn append(
        &self,
        playlist_id: &str,
        episode_ids: &[EpisodeId],
    ) -> Result<(), TransportError> {
        self.lock()
            .push((playlist_id.to_string(), episode_ids.to_vec()));
        Ok(())
    }
}
