// src/normalize.rs
//
// Field normalization: maps provider-shaped raw listing payloads into uniform
// `PropertyRecord`s. Every field conversion is defensive and yields absent on
// malformed input; only a batch with no processable records at all is an error.
use anyhow::{anyhow, Result};
use chrono::{DateTime, Datelike, Utc};
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};

use crate::models::property::{PropertyRecord, RawListing};

static STATE_ABBREVIATIONS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("alabama", "AL"),
        ("alaska", "AK"),
        ("arizona", "AZ"),
        ("arkansas", "AR"),
        ("california", "CA"),
        ("colorado", "CO"),
        ("connecticut", "CT"),
        ("delaware", "DE"),
        ("florida", "FL"),
        ("georgia", "GA"),
        ("hawaii", "HI"),
        ("idaho", "ID"),
        ("illinois", "IL"),
        ("indiana", "IN"),
        ("iowa", "IA"),
        ("kansas", "KS"),
        ("kentucky", "KY"),
        ("louisiana", "LA"),
        ("maine", "ME"),
        ("maryland", "MD"),
        ("massachusetts", "MA"),
        ("michigan", "MI"),
        ("minnesota", "MN"),
        ("mississippi", "MS"),
        ("missouri", "MO"),
        ("montana", "MT"),
        ("nebraska", "NE"),
        ("nevada", "NV"),
        ("new hampshire", "NH"),
        ("new jersey", "NJ"),
        ("new mexico", "NM"),
        ("new york", "NY"),
        ("north carolina", "NC"),
        ("north dakota", "ND"),
        ("ohio", "OH"),
        ("oklahoma", "OK"),
        ("oregon", "OR"),
        ("pennsylvania", "PA"),
        ("rhode island", "RI"),
        ("south carolina", "SC"),
        ("south dakota", "SD"),
        ("tennessee", "TN"),
        ("texas", "TX"),
        ("utah", "UT"),
        ("vermont", "VT"),
        ("virginia", "VA"),
        ("washington", "WA"),
        ("west virginia", "WV"),
        ("wisconsin", "WI"),
        ("wyoming", "WY"),
    ])
});

static PROPERTY_TYPE_SYNONYMS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("single family", "house"),
        ("single-family", "house"),
        ("sfh", "house"),
        ("detached", "house"),
        ("multi family", "multifamily"),
        ("multi-family", "multifamily"),
        ("duplex", "multifamily"),
        ("triplex", "multifamily"),
        ("fourplex", "multifamily"),
        ("condominium", "condo"),
        ("townhouse", "townhome"),
        ("apt", "apartment"),
        ("mobile home", "mobile"),
        ("manufactured", "mobile"),
        ("land", "lot"),
        ("vacant land", "lot"),
    ])
});

static ZIP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{5})\b").unwrap());

// Coordinate envelope covering the US including Alaska.
const LAT_RANGE: (f64, f64) = (24.0, 71.0);
const LON_RANGE: (f64, f64) = (-180.0, -66.0);

const BEDROOM_RANGE: (f64, f64) = (0.0, 20.0);
const BATHROOM_RANGE: (f64, f64) = (0.0, 20.0);
const SQUARE_FEET_RANGE: (f64, f64) = (100.0, 50_000.0);
const MIN_YEAR_BUILT: i32 = 1800;

const PRICE_KEYS: [&str; 4] = ["current_price", "price", "rent", "list_price"];

/// Normalizes a batch of raw listings. Records missing address, city or state
/// after normalization are dropped, and exact (address, city, state) repeats
/// collapse to the first occurrence.
pub fn normalize_batch(listings: &[RawListing]) -> Result<Vec<PropertyRecord>> {
    if listings.is_empty() {
        return Ok(Vec::new());
    }

    let mut records = Vec::with_capacity(listings.len());
    let mut processable = 0usize;
    let mut dropped_incomplete = 0usize;

    for listing in listings {
        let payload = match listing.payload.as_object() {
            Some(map) => map,
            None => {
                debug!(
                    "Normalize: Skipping non-object payload from source '{}'.",
                    listing.source
                );
                continue;
            }
        };
        processable += 1;

        match normalize_listing(&listing.source, &listing.payload, payload) {
            Some(record) => records.push(record),
            None => dropped_incomplete += 1,
        }
    }

    if processable == 0 {
        return Err(anyhow!(
            "Normalize: Batch of {} listings contained no processable records.",
            listings.len()
        ));
    }

    let before_collapse = records.len();
    let records = collapse_exact_repeats(records);

    if dropped_incomplete > 0 {
        warn!(
            "Normalize: Dropped {} records missing address, city or state.",
            dropped_incomplete
        );
    }
    info!(
        "Normalize: {} raw listings -> {} records ({} exact repeats collapsed).",
        listings.len(),
        records.len(),
        before_collapse - records.len()
    );
    Ok(records)
}

fn normalize_listing(
    source: &str,
    raw: &serde_json::Value,
    payload: &serde_json::Map<String, serde_json::Value>,
) -> Option<PropertyRecord> {
    let address = payload
        .get("address")
        .and_then(value_as_string)
        .map(|s| title_case(&collapse_whitespace(&s)))
        .filter(|s| !s.is_empty())?;
    let city = payload
        .get("city")
        .and_then(value_as_string)
        .map(|s| title_case(s.trim()))
        .filter(|s| !s.is_empty())?;
    let state = payload
        .get("state")
        .and_then(value_as_string)
        .and_then(|s| normalize_state(&s))?;

    let (latitude, longitude) = normalize_coordinates(
        payload.get("latitude").and_then(value_as_f64),
        payload.get("longitude").and_then(value_as_f64),
    );

    let current_price = PRICE_KEYS
        .iter()
        .filter_map(|key| payload.get(*key))
        .find_map(|v| clean_price(v));

    Some(PropertyRecord {
        address,
        city,
        state,
        zip_code: payload
            .get("zip_code")
            .and_then(value_as_string)
            .and_then(|s| normalize_zip(&s)),
        latitude,
        longitude,
        property_type: payload
            .get("property_type")
            .and_then(value_as_string)
            .and_then(|s| normalize_property_type(&s)),
        bedrooms: bounded_numeric(payload.get("bedrooms"), BEDROOM_RANGE),
        bathrooms: bounded_numeric(payload.get("bathrooms"), BATHROOM_RANGE),
        square_feet: bounded_numeric(payload.get("square_feet"), SQUARE_FEET_RANGE),
        lot_size: payload
            .get("lot_size")
            .and_then(value_as_f64)
            .filter(|v| *v > 0.0),
        year_built: normalize_year_built(payload.get("year_built")),
        current_price,
        listing_status: payload
            .get("listing_status")
            .and_then(value_as_string)
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty()),
        sources: vec![source.to_string()],
        updated_at: payload
            .get("updated_at")
            .and_then(value_as_string)
            .and_then(|s| DateTime::parse_from_rfc3339(s.trim()).ok())
            .map(|dt| dt.with_timezone(&Utc)),
        raw: raw.clone(),
        duplicate_group_id: None,
        duplicate_confidence: 0.0,
    })
}

fn collapse_exact_repeats(records: Vec<PropertyRecord>) -> Vec<PropertyRecord> {
    let mut seen: HashSet<String> = HashSet::with_capacity(records.len());
    records
        .into_iter()
        .filter(|record| seen.insert(record.exact_key()))
        .collect()
}

/// Maps a state value to its 2-letter code. Accepts codes, full names and
/// partial name matches; falls back to the first two characters upper-cased.
pub fn normalize_state(state: &str) -> Option<String> {
    let lower = state.trim().to_lowercase();
    if lower.is_empty() {
        return None;
    }

    if lower.len() == 2 {
        let upper = lower.to_uppercase();
        if STATE_ABBREVIATIONS.values().any(|abbrev| *abbrev == upper) {
            return Some(upper);
        }
    }

    if let Some(abbrev) = STATE_ABBREVIATIONS.get(lower.as_str()) {
        return Some(abbrev.to_string());
    }

    for (full_name, abbrev) in STATE_ABBREVIATIONS.iter() {
        if full_name.contains(lower.as_str()) || lower.contains(full_name) {
            return Some(abbrev.to_string());
        }
    }

    warn!("Normalize: Could not normalize state '{}'.", state);
    Some(lower.to_uppercase().chars().take(2).collect())
}

/// Extracts the first standalone 5-digit run, e.g. "98101-2211" -> "98101".
pub fn normalize_zip(zip: &str) -> Option<String> {
    ZIP_RE
        .captures(zip.trim())
        .map(|caps| caps[1].to_string())
}

/// Lower-cases and maps through the fixed synonym table; unmapped values pass
/// through lower-cased.
pub fn normalize_property_type(property_type: &str) -> Option<String> {
    let lower = property_type.trim().to_lowercase();
    if lower.is_empty() {
        return None;
    }
    Some(
        PROPERTY_TYPE_SYNONYMS
            .get(lower.as_str())
            .map(|mapped| mapped.to_string())
            .unwrap_or(lower),
    )
}

/// Strips currency formatting and parses to a positive float. Prices are
/// never zero or negative, so anything <= 0 is absent.
pub fn clean_price(value: &serde_json::Value) -> Option<f64> {
    let parsed = match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => {
            s.replace('$', "").replace(',', "").trim().parse::<f64>().ok()
        }
        _ => None,
    }?;
    (parsed > 0.0).then_some(parsed)
}

// Out-of-range values are noise, not valid extremes: discard rather than clamp.
fn bounded_numeric(value: Option<&serde_json::Value>, range: (f64, f64)) -> Option<f64> {
    value
        .and_then(value_as_f64)
        .filter(|v| *v >= range.0 && *v <= range.1)
}

fn normalize_year_built(value: Option<&serde_json::Value>) -> Option<i32> {
    let year = value.and_then(value_as_f64)? as i32;
    (year >= MIN_YEAR_BUILT && year <= Utc::now().year()).then_some(year)
}

// Each coordinate is validated independently; one bad axis does not discard
// the other, but spatial matching requires both.
fn normalize_coordinates(lat: Option<f64>, lon: Option<f64>) -> (Option<f64>, Option<f64>) {
    (
        lat.filter(|v| *v >= LAT_RANGE.0 && *v <= LAT_RANGE.1),
        lon.filter(|v| *v >= LON_RANGE.0 && *v <= LON_RANGE.1),
    )
}

fn value_as_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn value_as_f64(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

pub fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn title_case(input: &str) -> String {
    input
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
