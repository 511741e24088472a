// src/matching/fuzzy.rs
//
// Pass 3: fuzzy text matching over records no earlier pass claimed. A pair
// first has to clear the combined address/city text threshold, then its
// property characteristics weigh into the final confidence.
use log::{debug, info};
use std::collections::HashSet;

use crate::models::property::{MatchMethodType, PropertyRecord};

use super::similarity::{address_similarity, string_similarity};
use super::{MatchEdge, MatchingConfig};

const ADDRESS_WEIGHT: f64 = 0.8;
const CITY_WEIGHT: f64 = 0.2;

const TEXT_WEIGHT: f64 = 0.7;
const CHARACTERISTICS_WEIGHT: f64 = 0.3;
const MIN_FINAL_CONFIDENCE: f64 = 0.75;

// Relative tolerance knobs for characteristic agreement.
const SQUARE_FEET_FALLOFF: f64 = 2.0;
const YEAR_BUILT_TOLERANCE_YEARS: f64 = 10.0;

pub fn find_matches(
    records: &[PropertyRecord],
    claimed: &HashSet<usize>,
    config: &MatchingConfig,
) -> Vec<MatchEdge> {
    let candidates: Vec<usize> = (0..records.len())
        .filter(|idx| !claimed.contains(idx))
        .collect();

    let mut edges = Vec::new();
    for i in 0..candidates.len() {
        for j in (i + 1)..candidates.len() {
            let (left, right) = (candidates[i], candidates[j]);
            let (r1, r2) = (&records[left], &records[right]);

            let addr_similarity = address_similarity(&r1.address, &r2.address);
            let city_similarity = string_similarity(&r1.city, &r2.city);
            let combined = ADDRESS_WEIGHT * addr_similarity + CITY_WEIGHT * city_similarity;
            if combined < config.address_similarity_threshold {
                continue;
            }

            let characteristics = characteristics_similarity(r1, r2);
            let confidence = TEXT_WEIGHT * combined + CHARACTERISTICS_WEIGHT * characteristics;
            if confidence < MIN_FINAL_CONFIDENCE {
                debug!(
                    "FuzzyAddress: Pair ({}, {}) text {:.2} but final {:.2} below threshold.",
                    left, right, combined, confidence
                );
                continue;
            }

            edges.push(MatchEdge {
                left,
                right,
                method: MatchMethodType::FuzzyAddress,
                confidence,
            });
        }
    }

    info!(
        "FuzzyAddress: {} edges found among {} unclaimed records.",
        edges.len(),
        candidates.len()
    );
    edges
}

/// Per-field agreement across bedrooms, bathrooms, square footage, build year
/// and property type, averaged over the comparisons both records support.
/// No shared characteristics scores 0.
pub fn characteristics_similarity(r1: &PropertyRecord, r2: &PropertyRecord) -> f64 {
    let mut similarities: Vec<f64> = Vec::new();

    if let (Some(v1), Some(v2)) = (r1.bedrooms, r2.bedrooms) {
        similarities.push(count_agreement(v1, v2));
    }
    if let (Some(v1), Some(v2)) = (r1.bathrooms, r2.bathrooms) {
        similarities.push(count_agreement(v1, v2));
    }
    if let (Some(v1), Some(v2)) = (r1.square_feet, r2.square_feet) {
        if v1 == v2 {
            similarities.push(1.0);
        } else {
            let diff_ratio = (v1 - v2).abs() / v1.max(v2);
            similarities.push((1.0 - diff_ratio * SQUARE_FEET_FALLOFF).max(0.0));
        }
    }
    if let (Some(v1), Some(v2)) = (r1.year_built, r2.year_built) {
        let diff = (v1 - v2).abs() as f64;
        similarities.push((1.0 - diff / YEAR_BUILT_TOLERANCE_YEARS).max(0.0));
    }
    if let (Some(t1), Some(t2)) = (&r1.property_type, &r2.property_type) {
        similarities.push(if t1.eq_ignore_ascii_case(t2) { 1.0 } else { 0.0 });
    }

    if similarities.is_empty() {
        return 0.0;
    }
    similarities.iter().sum::<f64>() / similarities.len() as f64
}

// Bedroom/bathroom counts: exact agreement, partial credit within one.
fn count_agreement(v1: f64, v2: f64) -> f64 {
    if v1 == v2 {
        1.0
    } else if (v1 - v2).abs() <= 1.0 {
        0.5
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(address: &str, city: &str) -> PropertyRecord {
        PropertyRecord::new(
            address.to_string(),
            city.to_string(),
            "CA".to_string(),
            "test".to_string(),
        )
    }

    fn furnished(address: &str, city: &str) -> PropertyRecord {
        let mut r = record(address, city);
        r.bedrooms = Some(3.0);
        r.bathrooms = Some(2.0);
        r.square_feet = Some(1850.0);
        r.year_built = Some(1995);
        r.property_type = Some("house".to_string());
        r
    }

    #[test]
    fn test_characteristics_similarity_full_agreement() {
        let a = furnished("1 Pine St", "Seattle");
        let b = furnished("1 Pine St", "Seattle");
        assert_eq!(characteristics_similarity(&a, &b), 1.0);
    }

    #[test]
    fn test_characteristics_similarity_partial() {
        let a = furnished("1 Pine St", "Seattle");
        let mut b = furnished("1 Pine St", "Seattle");
        b.bedrooms = Some(4.0); // within one: 0.5
        b.square_feet = Some(2035.0); // 10% off: 1 - 0.2 = 0.8 (approx)
        b.year_built = Some(2000); // 5 years off: 0.5
        let sim = characteristics_similarity(&a, &b);
        // (0.5 + 1.0 + ~0.818 + 0.5 + 1.0) / 5
        assert!((sim - 0.7636).abs() < 0.01);
    }

    #[test]
    fn test_characteristics_similarity_no_overlap_is_zero() {
        let a = record("1 Pine St", "Seattle");
        let b = record("1 Pine St", "Seattle");
        assert_eq!(characteristics_similarity(&a, &b), 0.0);
    }

    #[test]
    fn test_abbreviation_variants_match() {
        // Scenario A text: same property listed with "St" and "Street".
        let records = vec![
            furnished("123 Market St", "San Francisco"),
            furnished("123 Market Street", "San Francisco"),
        ];
        let edges = find_matches(&records, &HashSet::new(), &MatchingConfig::default());
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].method, MatchMethodType::FuzzyAddress);
        assert!(edges[0].confidence >= 0.85);
    }

    #[test]
    fn test_different_addresses_stay_separate() {
        let records = vec![
            furnished("123 Market St", "San Francisco"),
            furnished("4580 Mission Blvd", "San Francisco"),
        ];
        let edges = find_matches(&records, &HashSet::new(), &MatchingConfig::default());
        assert!(edges.is_empty());
    }

    #[test]
    fn test_similar_text_conflicting_characteristics_rejected() {
        let a = furnished("123 Market St", "San Francisco");
        let mut b = furnished("123 Market Street", "San Francisco");
        b.bedrooms = Some(8.0);
        b.bathrooms = Some(6.0);
        b.square_feet = Some(7200.0);
        b.year_built = Some(1902);
        b.property_type = Some("condo".to_string());
        // Text is identical (0.7) but characteristics all disagree (0.0).
        let edges = find_matches(&[a, b], &HashSet::new(), &MatchingConfig::default());
        assert!(edges.is_empty());
    }

    #[test]
    fn test_claimed_records_are_skipped() {
        let records = vec![
            furnished("123 Market St", "San Francisco"),
            furnished("123 Market Street", "San Francisco"),
        ];
        let claimed: HashSet<usize> = [1].into_iter().collect();
        let edges = find_matches(&records, &claimed, &MatchingConfig::default());
        assert!(edges.is_empty());
    }
}
