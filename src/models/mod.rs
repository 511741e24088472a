// src/models/mod.rs
pub mod property;
pub mod stats;
