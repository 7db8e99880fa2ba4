//! Filter implementations for the classification pipeline.
//!
//! This module contains all the concrete filter implementations
//! that can be composed into a FilterPipeline.

pub mod already_in_playlist;
pub mod title_pattern;

// Re-export for convenience
pub use already_in_playlist::AlreadyInPlaylistFilter;
pub use title_pattern::TitlePatternFilter;
