// src/matching/mod.rs
pub mod exact;
pub mod fuzzy;
pub mod geospatial;
pub mod similarity;

use log::info;
use std::collections::HashSet;
use std::env;
use std::time::Instant;

use crate::models::property::{MatchMethodType, PropertyRecord};

/// An undirected match between two records of the same batch, identified by
/// their batch-local indices with `left < right`.
#[derive(Debug, Clone, Copy)]
pub struct MatchEdge {
    pub left: usize,
    pub right: usize,
    pub method: MatchMethodType,
    pub confidence: f64,
}

/// The two externally tunable matching parameters.
#[derive(Debug, Clone)]
pub struct MatchingConfig {
    /// Combined text score a pair must reach to be considered by the fuzzy
    /// pass at all.
    pub address_similarity_threshold: f64,
    /// Great-circle distance in kilometers under which two coordinate-bearing
    /// records are geospatial candidates.
    pub coordinate_proximity_km: f64,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            address_similarity_threshold: 0.85,
            coordinate_proximity_km: 0.1,
        }
    }
}

impl MatchingConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            address_similarity_threshold: env::var("ADDRESS_SIMILARITY_THRESHOLD")
                .ok()
                .and_then(|v| v.parse::<f64>().ok())
                .unwrap_or(defaults.address_similarity_threshold),
            coordinate_proximity_km: env::var("COORDINATE_PROXIMITY_KM")
                .ok()
                .and_then(|v| v.parse::<f64>().ok())
                .unwrap_or(defaults.coordinate_proximity_km),
        }
    }

    pub fn log_config(&self) {
        info!(
            "Matching: address_similarity_threshold={}, coordinate_proximity_km={}",
            self.address_similarity_threshold, self.coordinate_proximity_km
        );
    }
}

/// Runs the three ordered passes over a normalized batch and pools every
/// match edge they discover. A record claimed by an earlier pass is excluded
/// from the inputs of later passes; group formation over the pooled edges
/// happens in `clustering`.
pub fn find_matches(records: &[PropertyRecord], config: &MatchingConfig) -> Vec<MatchEdge> {
    let start_time = Instant::now();
    let mut edges = exact::find_matches(records);
    let mut claimed: HashSet<usize> = claimed_indices(&edges);

    let geo_edges = geospatial::find_matches(records, &claimed, config);
    claimed.extend(claimed_indices(&geo_edges));
    edges.extend(geo_edges);

    edges.extend(fuzzy::find_matches(records, &claimed, config));

    info!(
        "Matching: {} edges across {} records in {:.2?}.",
        edges.len(),
        records.len(),
        start_time.elapsed()
    );
    edges
}

fn claimed_indices(edges: &[MatchEdge]) -> HashSet<usize> {
    edges
        .iter()
        .flat_map(|edge| [edge.left, edge.right])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_thresholds() {
        let config = MatchingConfig::default();
        assert_eq!(config.address_similarity_threshold, 0.85);
        assert_eq!(config.coordinate_proximity_km, 0.1);
    }

    #[test]
    fn test_from_env_falls_back_on_missing_or_bad_values() {
        env::remove_var("ADDRESS_SIMILARITY_THRESHOLD");
        env::set_var("COORDINATE_PROXIMITY_KM", "not a number");
        let config = MatchingConfig::from_env();
        assert_eq!(config.address_similarity_threshold, 0.85);
        assert_eq!(config.coordinate_proximity_km, 0.1);
        env::remove_var("COORDINATE_PROXIMITY_KM");
    }
}
