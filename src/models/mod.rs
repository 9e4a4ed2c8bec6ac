// src/models/mod.rs

//! Domain models for the miner application.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod blueprint;
mod config;
mod record;

// Re-export all public types
pub use blueprint::{Blueprint, Cardinality, ExtractionProfile, FieldRule, SectionSpec};
pub use config::{
    Config, FieldSpecConfig, PortalConfig, PriceTableConfig, ProfileConfig, Rename, SectionConfig,
    StorageConfig,
};
pub use record::{Diagnostic, FieldMap, RawJobRecord};
