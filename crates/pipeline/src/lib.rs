//! Pipeline for classifying fetched episodes.
//!
//! This crate provides:
//! - PatternMatcher for case-insensitive include/exclude title patterns
//! - Filter trait and implementations for episode classification
//! - FilterPipeline for composing filters
//!
//! ## Architecture
//! Each fetched episode runs through the filters in order:
//! 1. TitlePatternFilter rejects pattern misses and excluded titles
//! 2. AlreadyInPlaylistFilter rejects episodes the playlist already holds
//! 3. Whatever survives is `Matched` and queued for appending
//!
//! ## Example Usage
//! ```ignore
//! use pipeline::{FilterContext, FilterPipeline};
//!
//! // Build the pipeline for one filter configuration
//! let pipeline = FilterPipeline::for_config(&config)?;
//!
//! // Classify in fetch order
//! let results = pipeline.classify(&episodes, &FilterContext::new(&existing));
//! let to_add: Vec<_> = results.iter().filter(|r| r.verdict()).collect();
//! ```

pub mod filter_pipeline;
pub mod filters;
pub mod matcher;
pub mod traits;

// Re-export main types
pub use filter_pipeline::FilterPipeline;
pub use matcher::PatternMatcher;
pub use traits::{Filter, FilterContext};
