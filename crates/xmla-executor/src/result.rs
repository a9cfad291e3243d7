//! Execution statistics attached to every result.

use std::time::Duration;

/// Statistics from one statement execution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExecutionStats {
    /// Time from submission to a parsed result.
    pub duration: Duration,
    /// Whether the response was replayed from the response cache.
    pub cache_hit: bool,
    /// Size of the response envelope in bytes.
    pub response_bytes: usize,
}

impl ExecutionStats {
    /// Creates new execution stats.
    pub fn new(duration: Duration, cache_hit: bool, response_bytes: usize) -> Self {
        Self {
            duration,
            cache_hit,
            response_bytes,
        }
    }
}
