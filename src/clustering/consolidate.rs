// src/clustering/consolidate.rs
//
// Group resolution: one canonical record survives per duplicate group, backed
// by the most complete field values its group can offer. Everything outside a
// group passes through unchanged.
use log::{debug, info};
use std::collections::HashSet;

use crate::models::property::{DuplicateGroup, PropertyRecord};

const CONFIDENCE_WEIGHT: f64 = 10.0;
const RECENCY_BONUS: f64 = 5.0;

/// Collapses each group to its best-scoring member, merging absent fields
/// from the absorbed members in group order. Returns the surviving batch in
/// input order.
pub fn consolidate_groups(
    records: Vec<PropertyRecord>,
    groups: &[DuplicateGroup],
) -> Vec<PropertyRecord> {
    if records.is_empty() {
        info!("Consolidate: Empty batch, nothing to resolve.");
        return records;
    }

    let mut absorbed: HashSet<usize> = HashSet::new();
    for group in groups {
        let Some(best) = select_canonical(&records, &group.members) else {
            continue;
        };
        for member in &group.members {
            if *member != best {
                absorbed.insert(*member);
            }
        }
        debug!(
            "Consolidate: Group {} keeps record {} and absorbs {} others.",
            group.id,
            best,
            group.members.len() - 1
        );
    }

    let mut merged: Vec<PropertyRecord> = Vec::with_capacity(records.len() - absorbed.len());
    for (idx, record) in records.iter().enumerate() {
        if absorbed.contains(&idx) {
            continue;
        }
        let record = match groups.iter().find(|g| g.members.contains(&idx)) {
            Some(group) => merge_group(records.as_slice(), idx, &group.members),
            None => record.clone(),
        };
        merged.push(record);
    }

    info!(
        "Consolidate: {} records in, {} absorbed, {} records out.",
        records.len(),
        absorbed.len(),
        merged.len()
    );
    merged
}

// Highest score wins; ties resolve to the earliest member in encounter order.
fn select_canonical(records: &[PropertyRecord], members: &[usize]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for member in members {
        let score = selection_score(&records[*member]);
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((*member, score)),
        }
    }
    best.map(|(idx, _)| idx)
}

/// Completeness-and-confidence score used to pick a group's canonical record.
fn selection_score(record: &PropertyRecord) -> f64 {
    let mut score = CONFIDENCE_WEIGHT * record.duplicate_confidence;
    score += populated_important_fields(record) as f64;
    if record.updated_at.is_some() {
        score += RECENCY_BONUS;
    }
    score
}

fn populated_important_fields(record: &PropertyRecord) -> usize {
    // address, city and state are always populated post-normalization.
    3 + [
        record.latitude.is_some(),
        record.longitude.is_some(),
        record.bedrooms.is_some(),
        record.bathrooms.is_some(),
        record.square_feet.is_some(),
        record.current_price.is_some(),
    ]
    .iter()
    .filter(|present| **present)
    .count()
}

// The canonical record's own values are never overwritten; absent fields take
// the first value found among the other members, in group order.
fn merge_group(records: &[PropertyRecord], best: usize, members: &[usize]) -> PropertyRecord {
    let mut canonical = records[best].clone();
    for member in members {
        if *member == best {
            continue;
        }
        let other = &records[*member];
        canonical.zip_code = canonical.zip_code.or_else(|| other.zip_code.clone());
        canonical.latitude = canonical.latitude.or(other.latitude);
        canonical.longitude = canonical.longitude.or(other.longitude);
        canonical.property_type = canonical
            .property_type
            .or_else(|| other.property_type.clone());
        canonical.bedrooms = canonical.bedrooms.or(other.bedrooms);
        canonical.bathrooms = canonical.bathrooms.or(other.bathrooms);
        canonical.square_feet = canonical.square_feet.or(other.square_feet);
        canonical.lot_size = canonical.lot_size.or(other.lot_size);
        canonical.year_built = canonical.year_built.or(other.year_built);
        canonical.current_price = canonical.current_price.or(other.current_price);
        canonical.listing_status = canonical
            .listing_status
            .or_else(|| other.listing_status.clone());
        canonical.updated_at = canonical.updated_at.or(other.updated_at);

        for source in &other.sources {
            if !canonical.sources.contains(source) {
                canonical.sources.push(source.clone());
            }
        }
    }
    canonical
}
