// src/pipeline.rs
//
// End-to-end entry point: raw collected batch in, deduplicated canonical
// batch out. Pure in-memory transformation; the caller owns batch sizing,
// persistence and any retry policy.
use anyhow::Result;
use log::info;
use std::collections::HashMap;
use std::time::Instant;

use crate::clustering::{consolidate_groups, create_groups};
use crate::matching::{self, MatchingConfig};
use crate::models::property::{MatchMethodType, PropertyRecord, RawListing};
use crate::models::stats::{MatchMethodStats, PipelineStats};
use crate::normalize::normalize_batch;

/// The deduplicated batch plus the run counts callers are expected to log.
#[derive(Debug)]
pub struct PipelineOutcome {
    pub records: Vec<PropertyRecord>,
    pub stats: PipelineStats,
    pub method_stats: Vec<MatchMethodStats>,
}

/// Normalizes, matches and resolves one batch of raw listings. Returns an
/// error only for a structurally unprocessable batch; per-field noise and
/// degenerate dedup inputs degrade to smaller (possibly empty) output.
pub fn run(listings: &[RawListing], config: &MatchingConfig) -> Result<PipelineOutcome> {
    let start_time = Instant::now();
    let input_records = listings.len();

    let mut records = normalize_batch(listings)?;
    let normalized_records = records.len();

    let edges = matching::find_matches(&records, config);
    let groups = create_groups(&mut records, &edges);
    let method_stats = summarize_methods(&edges);

    let records = consolidate_groups(records, &groups);

    let stats = PipelineStats {
        input_records,
        normalized_records,
        match_edges: edges.len(),
        duplicate_groups: groups.len(),
        output_records: records.len(),
    };
    info!(
        "Pipeline: {} raw -> {} normalized -> {} groups -> {} canonical records in {:.2?}.",
        stats.input_records,
        stats.normalized_records,
        stats.duplicate_groups,
        stats.output_records,
        start_time.elapsed()
    );

    Ok(PipelineOutcome {
        records,
        stats,
        method_stats,
    })
}

fn summarize_methods(edges: &[matching::MatchEdge]) -> Vec<MatchMethodStats> {
    let mut per_method: HashMap<MatchMethodType, (usize, Vec<f64>, Vec<usize>)> = HashMap::new();
    for edge in edges {
        let entry = per_method.entry(edge.method).or_default();
        entry.0 += 1;
        entry.1.push(edge.confidence);
        entry.2.extend([edge.left, edge.right]);
    }

    per_method
        .into_iter()
        .map(|(method_type, (edge_count, confidences, mut members))| {
            members.sort_unstable();
            members.dedup();
            MatchMethodStats {
                method_type,
                edges_created: edge_count,
                records_matched: members.len(),
                avg_confidence: confidences.iter().sum::<f64>() / confidences.len() as f64,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn listing(source: &str, payload: serde_json::Value) -> RawListing {
        RawListing {
            source: source.to_string(),
            payload,
        }
    }

    #[test]
    fn test_scenario_a_duplicate_listing_collapses() {
        let listings = vec![
            listing(
                "rentcast",
                json!({
                    "address": "123 Market St", "city": "San Francisco", "state": "CA",
                    "bedrooms": 2, "bathrooms": 2, "square_feet": 1200,
                    "current_price": 850000,
                }),
            ),
            listing(
                "realtymole",
                json!({
                    "address": "123 Market Street", "city": "San Francisco", "state": "CA",
                    "bedrooms": 2, "bathrooms": 2, "square_feet": 1200,
                    "current_price": 855000,
                }),
            ),
        ];
        let outcome = run(&listings, &MatchingConfig::default()).unwrap();
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].current_price, Some(850_000.0));
        assert_eq!(outcome.stats.duplicate_groups, 1);
        assert!(outcome.records[0].duplicate_confidence >= 0.85);
        // Both collectors contributed to the canonical record.
        assert_eq!(outcome.records[0].sources, vec!["rentcast", "realtymole"]);
    }

    #[test]
    fn test_scenario_b_distant_records_pass_through() {
        let listings = vec![
            listing(
                "demo",
                json!({
                    "address": "123 Market St", "city": "San Francisco", "state": "CA",
                    "latitude": 37.7749, "longitude": -122.4194,
                }),
            ),
            listing(
                "demo",
                json!({
                    "address": "500 First Ave", "city": "San Jose", "state": "CA",
                    "latitude": 37.3382, "longitude": -121.8863,
                }),
            ),
        ];
        let outcome = run(&listings, &MatchingConfig::default()).unwrap();
        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.stats.duplicate_groups, 0);
    }

    #[test]
    fn test_output_never_larger_than_input() {
        let streets = [
            "12 Alder St",
            "340 Burnside Rd",
            "77 Couch Blvd",
            "1510 Division Pl",
            "98 Everett Ln",
            "2203 Flanders Ave",
        ];
        let listings: Vec<RawListing> = streets
            .iter()
            .map(|street| {
                listing(
                    "demo",
                    json!({
                        "address": street,
                        "city": "Portland", "state": "OR",
                    }),
                )
            })
            .collect();
        let outcome = run(&listings, &MatchingConfig::default()).unwrap();
        assert_eq!(outcome.records.len(), 6);
        assert!(outcome.records.len() <= listings.len());
    }

    #[test]
    fn test_merge_completeness_across_group() {
        // Each member knows something the others do not; the canonical record
        // ends up with all of it.
        let listings = vec![
            listing(
                "alpha",
                json!({
                    "address": "77 Cedar Ct", "city": "Austin", "state": "TX",
                    "bedrooms": 3, "bathrooms": 2, "square_feet": 1500,
                    "zip_code": "78701",
                }),
            ),
            listing(
                "beta",
                json!({
                    "address": "77 Cedar Court", "city": "Austin", "state": "TX",
                    "bedrooms": 3, "bathrooms": 2, "square_feet": 1500,
                    "year_built": 2005, "current_price": 450000,
                }),
            ),
        ];
        let outcome = run(&listings, &MatchingConfig::default()).unwrap();
        assert_eq!(outcome.records.len(), 1);
        let canonical = &outcome.records[0];
        assert_eq!(canonical.zip_code, Some("78701".to_string()));
        assert_eq!(canonical.year_built, Some(2005));
        assert_eq!(canonical.current_price, Some(450_000.0));
    }

    #[test]
    fn test_empty_batch() {
        let outcome = run(&[], &MatchingConfig::default()).unwrap();
        assert!(outcome.records.is_empty());
        assert_eq!(outcome.stats.output_records, 0);
    }

    #[test]
    fn test_method_stats_reflect_edges() {
        let listings = vec![
            listing(
                "demo",
                json!({
                    "address": "9 Birch Ln", "city": "Denver", "state": "CO",
                    "bedrooms": 2, "bathrooms": 1,
                }),
            ),
            listing(
                "demo",
                json!({
                    "address": "9 Birch Lane", "city": "Denver", "state": "CO",
                    "bedrooms": 2, "bathrooms": 1,
                }),
            ),
        ];
        let outcome = run(&listings, &MatchingConfig::default()).unwrap();
        assert_eq!(outcome.method_stats.len(), 1);
        let stats = &outcome.method_stats[0];
        assert_eq!(stats.method_type, MatchMethodType::FuzzyAddress);
        assert_eq!(stats.edges_created, 1);
        assert_eq!(stats.records_matched, 2);
        assert!(stats.avg_confidence >= 0.75);
    }
}
