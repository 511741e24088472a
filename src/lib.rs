// src/lib.rs
pub mod clustering;
pub mod matching;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod utils;

pub use matching::MatchingConfig;
pub use models::property::{DuplicateGroup, MatchMethodType, PropertyRecord, RawListing};
pub use models::stats::{MatchMethodStats, PipelineStats};
pub use pipeline::{run, PipelineOutcome};
