//! PatternMatcher: include/exclude regular expressions over episode titles.
//!
//! Patterns are compiled once per filter configuration and owned by that
//! filter; nothing is cached globally, so two filters never share state.

use domain::{ConfigError, MatchReason};
use regex::{Regex, RegexBuilder};

/// Compiled include and exclude patterns of one filter.
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    include: Vec<Regex>,
    exclude: Vec<Regex>,
}

impl PatternMatcher {
    /// Compile every pattern case-insensitively.
    ///
    /// # Arguments
    /// * `filter` - Label of the owning filter, used in error messages
    /// * `include` - Patterns of which at least one must match
    /// * `exclude` - Patterns of which none may match
    ///
    /// # Errors
    /// `ConfigError::InvalidPattern` naming the first pattern that fails.
    pub fn compile(
        filter: &str,
        include: &[String],
        exclude: &[String],
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            include: compile_all(filter, include)?,
            exclude: compile_all(filter, exclude)?,
        })
    }

    /// Classify a title.
    ///
    /// ## Algorithm
    /// 1. An empty title matches nothing
    /// 2. No include pattern found anywhere in the title -> NoPatternMatch
    /// 3. Any exclude pattern found -> Excluded (exclude always wins)
    /// 4. Otherwise -> Matched
    pub fn evaluate(&self, title: &str) -> MatchReason {
        if title.is_empty() || !self.include.iter().any(|re| re.is_match(title)) {
            return MatchReason::NoPatternMatch;
        }
        if self.exclude.iter().any(|re| re.is_match(title)) {
            return MatchReason::Excluded;
        }
        MatchReason::Matched
    }

    /// `included AND NOT excluded`
    pub fn matches(&self, title: &str) -> bool {
        self.evaluate(title) == MatchReason::Matched
    }
}

fn compile_all(filter: &str, patterns: &[String]) -> Result<Vec<Regex>, ConfigError> {
    patterns
        .iter()
        .map(|pattern| {
            RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .map_err(|e| ConfigError::InvalidPattern {
                    filter: filter.to_string(),
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
        })
        .collect()
}
