// src/clustering/mod.rs
pub mod consolidate;
pub mod create_groups;

pub use consolidate::consolidate_groups;
pub use create_groups::create_groups;
