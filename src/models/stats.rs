// src/models/stats.rs
use serde::Serialize;

use super::property::MatchMethodType;

/// Per-pass statistics, reported at the end of a run.
#[derive(Debug, Clone, Serialize)]
pub struct MatchMethodStats {
    pub method_type: MatchMethodType,
    pub edges_created: usize,
    pub records_matched: usize,
    pub avg_confidence: f64,
}

impl MatchMethodStats {
    pub fn default_for(method_type: MatchMethodType) -> Self {
        Self {
            method_type,
            edges_created: 0,
            records_matched: 0,
            avg_confidence: 0.0,
        }
    }
}

/// Counts the caller is expected to log for a whole pipeline invocation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineStats {
    pub input_records: usize,
    pub normalized_records: usize,
    pub match_edges: usize,
    pub duplicate_groups: usize,
    pub output_records: usize,
}
