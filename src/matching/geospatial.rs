// src/matching/geospatial.rs
//
// Pass 2: coordinate proximity. Two records within the configured
// great-circle distance whose addresses also look alike join with a
// confidence that grows with address similarity, capped below exact-match.
use log::{debug, info};
use std::collections::HashSet;

use crate::models::property::{MatchMethodType, PropertyRecord};

use super::similarity::address_similarity;
use super::{MatchEdge, MatchingConfig};

const EARTH_RADIUS_KM: f64 = 6371.0;

// Proximity alone is not identity (adjacent parcels, multi-building lots),
// so a nearby pair must also clear this address-similarity floor.
const MIN_ADDRESS_SIMILARITY: f64 = 0.7;

const MAX_CONFIDENCE: f64 = 0.9;

pub fn find_matches(
    records: &[PropertyRecord],
    claimed: &HashSet<usize>,
    config: &MatchingConfig,
) -> Vec<MatchEdge> {
    let candidates: Vec<usize> = records
        .iter()
        .enumerate()
        .filter(|(idx, record)| !claimed.contains(idx) && record.has_coordinates())
        .map(|(idx, _)| idx)
        .collect();

    let mut edges = Vec::new();
    for i in 0..candidates.len() {
        for j in (i + 1)..candidates.len() {
            let (left, right) = (candidates[i], candidates[j]);
            let (r1, r2) = (&records[left], &records[right]);

            let distance_km = haversine_km(
                r1.latitude.unwrap_or_default(),
                r1.longitude.unwrap_or_default(),
                r2.latitude.unwrap_or_default(),
                r2.longitude.unwrap_or_default(),
            );
            if distance_km > config.coordinate_proximity_km {
                continue;
            }

            let addr_similarity = address_similarity(&r1.address, &r2.address);
            if addr_similarity <= MIN_ADDRESS_SIMILARITY {
                debug!(
                    "Geospatial: Pair ({}, {}) within {:.0}m but address similarity {:.2} below floor.",
                    left,
                    right,
                    distance_km * 1000.0,
                    addr_similarity
                );
                continue;
            }

            edges.push(MatchEdge {
                left,
                right,
                method: MatchMethodType::Geospatial,
                confidence: (0.5 + 0.4 * addr_similarity).min(MAX_CONFIDENCE),
            });
        }
    }

    info!(
        "Geospatial: {} edges found among {} coordinate-bearing records.",
        edges.len(),
        candidates.len()
    );
    edges
}

/// Great-circle distance between two points in kilometers.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(address: &str, lat: f64, lon: f64) -> PropertyRecord {
        let mut r = PropertyRecord::new(
            address.to_string(),
            "San Francisco".to_string(),
            "CA".to_string(),
            "test".to_string(),
        );
        r.latitude = Some(lat);
        r.longitude = Some(lon);
        r
    }

    #[test]
    fn test_haversine_known_distance() {
        // San Francisco to Los Angeles, roughly 559 km.
        let d = haversine_km(37.7749, -122.4194, 34.0522, -118.2437);
        assert!((d - 559.0).abs() < 5.0);
        assert_eq!(haversine_km(47.6, -122.3, 47.6, -122.3), 0.0);
    }

    #[test]
    fn test_nearby_similar_addresses_match() {
        // ~30 meters apart.
        let records = vec![
            record("123 Market Street", 37.77490, -122.41940),
            record("123 Market St", 37.77515, -122.41940),
        ];
        let edges = find_matches(&records, &HashSet::new(), &MatchingConfig::default());
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].method, MatchMethodType::Geospatial);
        // Identical after abbreviation, so confidence caps at 0.9.
        assert!((edges[0].confidence - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_nearby_dissimilar_addresses_do_not_match() {
        // Scenario D: 50 meters apart but the addresses disagree.
        let records = vec![
            record("123 Market Street", 37.77490, -122.41940),
            record("888 Howard Plaza Tower", 37.77535, -122.41940),
        ];
        let edges = find_matches(&records, &HashSet::new(), &MatchingConfig::default());
        assert!(edges.is_empty());
    }

    #[test]
    fn test_distant_records_do_not_match() {
        // Scenario B: ~50 km apart.
        let records = vec![
            record("123 Market Street", 37.7749, -122.4194),
            record("123 Market Street", 37.3382, -121.8863),
        ];
        let edges = find_matches(&records, &HashSet::new(), &MatchingConfig::default());
        assert!(edges.is_empty());
    }

    #[test]
    fn test_claimed_records_are_skipped() {
        let records = vec![
            record("123 Market Street", 37.77490, -122.41940),
            record("123 Market St", 37.77515, -122.41940),
        ];
        let claimed: HashSet<usize> = [0].into_iter().collect();
        let edges = find_matches(&records, &claimed, &MatchingConfig::default());
        assert!(edges.is_empty());
    }

    #[test]
    fn test_proximity_threshold_is_configurable() {
        // ~1.1 km apart: outside the default radius, inside a widened one.
        let records = vec![
            record("123 Market Street", 37.7749, -122.4194),
            record("123 Market St", 37.7849, -122.4194),
        ];
        let default_edges = find_matches(&records, &HashSet::new(), &MatchingConfig::default());
        assert!(default_edges.is_empty());

        let wide = MatchingConfig {
            coordinate_proximity_km: 2.0,
            ..MatchingConfig::default()
        };
        assert_eq!(find_matches(&records, &HashSet::new(), &wide).len(), 1);
    }
}
