// src/models/property.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One scraped listing as delivered by a collector, before normalization.
/// `payload` is the provider-shaped map; keys and value types vary per source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawListing {
    pub source: String,
    pub payload: serde_json::Value,
}

/// A normalized property listing. `address`, `city` and `state` are always
/// populated (records failing that are dropped by the normalizer); every
/// other field is optional and absent when the provider value was missing or
/// failed validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyRecord {
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: Option<String>,

    pub latitude: Option<f64>,
    pub longitude: Option<f64>,

    pub property_type: Option<String>,
    pub bedrooms: Option<f64>,
    pub bathrooms: Option<f64>,
    pub square_feet: Option<f64>,
    pub lot_size: Option<f64>,
    pub year_built: Option<i32>,

    pub current_price: Option<f64>,
    pub listing_status: Option<String>,

    /// Collectors that contributed to this record. Starts as a single entry
    /// and grows when duplicate records from other sources are absorbed.
    pub sources: Vec<String>,
    pub updated_at: Option<DateTime<Utc>>,

    /// Original provider payload, retained for audit.
    pub raw: serde_json::Value,

    // Matching working state. Assigned during candidate matching, consumed by
    // group resolution, never part of the canonical output.
    #[serde(skip)]
    pub duplicate_group_id: Option<Uuid>,
    #[serde(skip)]
    pub duplicate_confidence: f64,
}

impl PropertyRecord {
    /// A record with the three required identity fields populated and every
    /// optional field absent.
    pub fn new(address: String, city: String, state: String, source: String) -> Self {
        Self {
            address,
            city,
            state,
            zip_code: None,
            latitude: None,
            longitude: None,
            property_type: None,
            bedrooms: None,
            bathrooms: None,
            square_feet: None,
            lot_size: None,
            year_built: None,
            current_price: None,
            listing_status: None,
            sources: vec![source],
            updated_at: None,
            raw: serde_json::Value::Null,
            duplicate_group_id: None,
            duplicate_confidence: 0.0,
        }
    }

    /// Composite identity key used by the exact-match pass.
    pub fn exact_key(&self) -> String {
        format!(
            "{}|{}|{}",
            self.address.to_lowercase(),
            self.city.to_lowercase(),
            self.state.to_uppercase()
        )
    }

    pub fn has_coordinates(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }
}

/// Which pass produced a match edge or group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchMethodType {
    ExactAddress,
    Geospatial,
    FuzzyAddress,
}

impl MatchMethodType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchMethodType::ExactAddress => "exact_address",
            MatchMethodType::Geospatial => "geospatial",
            MatchMethodType::FuzzyAddress => "fuzzy_address",
        }
    }
}

/// A set of records (batch-local indices) believed to describe one physical
/// property, with the strongest confidence observed among the match edges
/// that connected them.
#[derive(Debug, Clone)]
pub struct DuplicateGroup {
    pub id: Uuid,
    pub members: Vec<usize>,
    pub max_confidence: f64,
    pub methods: Vec<MatchMethodType>,
}
