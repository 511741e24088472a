// src/matching/similarity.rs
//
// String similarity primitives shared by the geospatial and fuzzy passes.
use once_cell::sync::Lazy;
use regex::Regex;
use strsim::normalized_levenshtein;

// Street-suffix and directional abbreviations applied before comparison so
// "123 Market Street" and "123 Market St" score as identical.
static ADDRESS_ABBREVIATIONS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"\bstreet\b", "st"),
        (r"\bavenue\b", "ave"),
        (r"\bboulevard\b", "blvd"),
        (r"\bdrive\b", "dr"),
        (r"\broad\b", "rd"),
        (r"\blane\b", "ln"),
        (r"\bcourt\b", "ct"),
        (r"\bplace\b", "pl"),
        (r"\bapartment\b", "apt"),
        (r"\bunit\b", "apt"),
        (r"\bnorth\b", "n"),
        (r"\bsouth\b", "s"),
        (r"\beast\b", "e"),
        (r"\bwest\b", "w"),
    ]
    .into_iter()
    .map(|(pattern, replacement)| (Regex::new(pattern).unwrap(), replacement))
    .collect()
});

/// Canonical comparison form of an address: lower-cased, suffix and
/// directional words abbreviated, punctuation stripped, whitespace collapsed.
pub fn normalize_address_for_comparison(address: &str) -> String {
    let mut normalized = address.to_lowercase().trim().to_string();
    for (pattern, replacement) in ADDRESS_ABBREVIATIONS.iter() {
        normalized = pattern.replace_all(&normalized, *replacement).into_owned();
    }
    normalized = normalized
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();
    normalized.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Similarity of two addresses in [0, 1]; 1.0 means identical after
/// normalization. Empty input on either side scores 0.
pub fn address_similarity(addr1: &str, addr2: &str) -> f64 {
    if addr1.is_empty() || addr2.is_empty() {
        return 0.0;
    }
    let norm1 = normalize_address_for_comparison(addr1);
    let norm2 = normalize_address_for_comparison(addr2);
    if norm1.is_empty() || norm2.is_empty() {
        return 0.0;
    }
    normalized_levenshtein(&norm1, &norm2)
}

/// Plain case-folded string similarity, used for city names.
pub fn string_similarity(str1: &str, str2: &str) -> f64 {
    if str1.is_empty() || str2.is_empty() {
        return 0.0;
    }
    normalized_levenshtein(&str1.trim().to_lowercase(), &str2.trim().to_lowercase())
}
