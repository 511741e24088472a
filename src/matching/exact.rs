// src/matching/exact.rs
//
// Pass 1: exact composite-key matching. Two records sharing a lower-cased
// address + city and upper-cased state are the same property, confidence 1.0.
use log::{debug, info};
use std::collections::HashMap;

use crate::models::property::{MatchMethodType, PropertyRecord};

use super::MatchEdge;

pub fn find_matches(records: &[PropertyRecord]) -> Vec<MatchEdge> {
    let mut key_groups: HashMap<String, Vec<usize>> = HashMap::new();
    for (idx, record) in records.iter().enumerate() {
        key_groups.entry(record.exact_key()).or_default().push(idx);
    }

    let mut edges = Vec::new();
    for (key, members) in key_groups {
        if members.len() < 2 {
            continue;
        }
        debug!(
            "ExactAddress: {} records share key '{}'.",
            members.len(),
            key
        );
        for i in 0..members.len() {
            for j in (i + 1)..members.len() {
                edges.push(MatchEdge {
                    left: members[i],
                    right: members[j],
                    method: MatchMethodType::ExactAddress,
                    confidence: 1.0,
                });
            }
        }
    }

    info!("ExactAddress: {} edges found.", edges.len());
    edges
}
