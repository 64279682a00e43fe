//! Scraper for FAO DIEM Events Visualization in Emergencies (EVE) flood data.
//!
//! Fetches the latest populated biweekly period from an ArcGIS feature table,
//! shapes and sorts the records, groups them by country and writes one global
//! CSV plus one CSV per country, with a manifest for the open-data catalog.

pub mod config;
pub mod dataset;
pub mod error;
pub mod fetch;
pub mod group;
pub mod period;
pub mod pipeline;
pub mod record;
pub mod shape;
pub mod source;
pub mod utils;

// Re-export the most common types for easier use
pub use config::{Credentials, PeriodSelection, ProjectConfig, ScraperConfig, StaticMetadata};
pub use error::{EveError, Result};
pub use pipeline::{RunSummary, Scraper};
pub use record::{RawRecord, ShapedRecord};

// Pipeline stages
pub use dataset::{DateSpan, Dataset, OutputUnit, assemble};
pub use fetch::fetch;
pub use group::{CountryGroups, distinct_country_names, group_by_country};
pub use period::{current_period, resolve_period};
pub use shape::shape;

// Data sources
pub use source::{ArcGisClient, ArcGisTable, FeatureSource, SavedFeatures};
