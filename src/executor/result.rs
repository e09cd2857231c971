//! Result types for query execution

use serde::Serialize;

use crate::planner::ScanType;
use crate::value::DocumentId;

/// Counters gathered while executing one plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExecutionStats {
    /// Scan type actually used
    pub scan_type: ScanType,
    /// Candidates the filter was evaluated against
    pub examined: usize,
    /// Candidates that matched
    pub matched: usize,
    /// Candidates excluded because evaluation failed
    pub evaluation_errors: usize,
    /// Whether a limit cut the scan short
    pub limit_reached: bool,
}

impl ExecutionStats {
    pub(crate) fn new(scan_type: ScanType) -> Self {
        Self {
            scan_type,
            examined: 0,
            matched: 0,
            evaluation_errors: 0,
            limit_reached: false,
        }
    }
}

/// Matching document ids in ascending order, plus stats
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub ids: Vec<DocumentId>,
    pub stats: ExecutionStats,
}

impl ExecutionResult {
    /// Returns true if no documents matched
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }
}
