//! Runner crate for the podcast filter.
//!
//! This crate contains the evaluation engine proper:
//! - `FilterEvaluator`: one filter configuration, fetch to append
//! - `BatchRunner`: every configuration of a run, with failure isolation
//! - `PlaylistIndexCache`: duplicate indexes shared within a run
//! - `DryRunAppender`: records additions instead of writing them
//!
//! ## Example Usage
//!
//! ```ignore
//! use runner::{BatchRunner, FilterEvaluator, load_run_config};
//! use std::sync::Arc;
//!
//! let config = load_run_config("config.toml")?;
//! let evaluator = FilterEvaluator::new(Arc::new(client));
//! let summary = BatchRunner::new(evaluator, config.settings.into())
//!     .run(&config.filters)
//!     .await;
//! ```

pub mod batch_runner;
pub mod dry_run;
pub mod evaluator;
pub mod index_cache;
pub mod outcome;

use std::path::Path;

use anyhow::{Context, Result};
use domain::RunConfig;
use tracing::info;

pub use batch_runner::{BatchRunner, RunnerOptions, StopSignal};
pub use dry_run::DryRunAppender;
pub use evaluator::FilterEvaluator;
pub use index_cache::PlaylistIndexCache;
pub use outcome::{FilterOutcome, RunSummary};

/// Load and validate the run configuration at `path`.
pub fn load_run_config(path: impl AsRef<Path>) -> Result<RunConfig> {
    let path = path.as_ref();
    let config = domain::config::load_config(path)
        .with_context(|| format!("Loading configuration from {}", path.display()))?;
    info!(
        "Loaded {} filter configurations from {}",
        config.filters.len(),
        path.display()
    );
    Ok(config)
}
