//! Error taxonomy for the crate, following the fallible boundaries laid out
//! in the task/config/construction modules.

use crate::pattern::Pattern;
use thiserror::Error;

/// Invalid user-supplied configuration for a generator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("min_improvement ({min_improvement}) exceeds num_samples ({num_samples}): no hill-climbing step could ever succeed")]
    MinImprovementExceedsSamples { min_improvement: u32, num_samples: u32 },

    #[error("pdb_max_size must be strictly positive")]
    ZeroPdbMaxSize,

    #[error("collection_max_size must be strictly positive")]
    ZeroCollectionMaxSize,

    #[error("pattern_max_size must be strictly positive")]
    ZeroPatternMaxSize,
}

/// Failure constructing a single pattern database.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PdbError {
    #[error("pattern {pattern} has abstract size {pattern_size}, exceeding the limit of {limit}")]
    PatternTooLarge {
        pattern: Pattern,
        pattern_size: usize,
        limit: usize,
    },
}

/// Outcome of an operation that may legitimately run out of its allotted
/// budget (construction time, sample count) without that being an error: the
/// caller decides whether a timeout should abort or just truncate the search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SamplingOutcome<T> {
    Completed(T),
    Timeout(T),
}

impl<T> SamplingOutcome<T> {
    pub fn into_inner(self) -> T {
        match self {
            SamplingOutcome::Completed(v) => v,
            SamplingOutcome::Timeout(v) => v,
        }
    }

    pub fn timed_out(&self) -> bool {
        matches!(self, SamplingOutcome::Timeout(_))
    }
}
