//! Dataset assembly
//!
//! Derives catalog metadata from the shaped records and lays out the output
//! resources: one global file with every record, then one file per country
//! group in group order.

pub mod slug;
pub mod writer;

use std::fmt;

use chrono::NaiveDate;
use itertools::Itertools;
use serde::Serialize;

use crate::config::{ProjectConfig, StaticMetadata};
use crate::error::{EveError, Result};
use crate::group::{CountryGroups, distinct_country_names};
use crate::record::{DATE_FORMAT, ShapedRecord};

pub use slug::slugify;
pub use writer::{WriteSummary, write_dataset};

/// Placeholder in the configured description replaced per resource
pub const COUNTRY_PLACEHOLDER: &str = "(country)";

/// Description substitute for the global resource
pub const ALL_COUNTRIES: &str = "all countries";

/// Inclusive date range covered by the dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateSpan {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateSpan {
    /// Earliest `start_date` to latest `end_date`, or `None` for no records
    #[must_use]
    pub fn from_records(records: &[ShapedRecord]) -> Option<Self> {
        let start = records.iter().map(ShapedRecord::start_date).min()?;
        let end = records.iter().map(ShapedRecord::end_date).max()?;
        Some(Self { start, end })
    }

    /// Catalog time-period string, covering whole days
    #[must_use]
    pub fn to_dataset_date(&self) -> String {
        format!(
            "[{}T00:00:00 TO {}T23:59:59]",
            self.start.format(DATE_FORMAT),
            self.end.format(DATE_FORMAT)
        )
    }
}

impl fmt::Display for DateSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} to {}",
            self.start.format(DATE_FORMAT),
            self.end.format(DATE_FORMAT)
        )
    }
}

/// One output file: a header row plus its records
#[derive(Debug, Clone, PartialEq)]
pub struct OutputUnit {
    /// File name, also used as the catalog resource name
    pub name: String,
    pub description: String,
    /// Column order, taken from the first record
    pub headers: Vec<String>,
    pub records: Vec<ShapedRecord>,
    /// ISO3 code for per-country units, `None` for the global one
    pub country_code: Option<String>,
}

impl OutputUnit {
    fn new(
        name: String,
        description: String,
        records: Vec<ShapedRecord>,
        country_code: Option<String>,
    ) -> Self {
        let headers = records.first().map(ShapedRecord::headers).unwrap_or_default();
        Self {
            name,
            description,
            headers,
            records,
            country_code,
        }
    }
}

/// Everything needed to publish one run
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Slug of the title
    pub name: String,
    pub title: String,
    pub tags: Vec<String>,
    /// Sorted distinct country names
    pub countries: Vec<String>,
    /// Lower-case ISO3 codes, ordered by country name
    pub locations: Vec<String>,
    pub time_period: DateSpan,
    pub static_metadata: StaticMetadata,
    /// Global resource first, then one per country group
    pub resources: Vec<OutputUnit>,
}

impl Dataset {
    /// Per-country resources only
    pub fn country_resources(&self) -> impl Iterator<Item = &OutputUnit> {
        self.resources.iter().filter(|r| r.country_code.is_some())
    }
}

/// Build the dataset for a set of sorted records and their country groups.
///
/// When `max_groups` is set only the first `max_groups` groups get a
/// resource; the global resource always holds every record.
///
/// # Errors
/// Returns `EmptyDataset` when `records` is empty.
pub fn assemble(
    records: &[ShapedRecord],
    groups: &CountryGroups,
    project: &ProjectConfig,
    static_metadata: &StaticMetadata,
    max_groups: Option<usize>,
) -> Result<Dataset> {
    let time_period = DateSpan::from_records(records).ok_or(EveError::EmptyDataset)?;
    let countries: Vec<String> = distinct_country_names(records).into_iter().sorted().collect();
    let locations = country_locations(records, &countries);
    let resource_slug = slugify(&project.resource_title);

    let mut resources = Vec::with_capacity(groups.len() + 1);
    resources.push(OutputUnit::new(
        format!("global-{resource_slug}.csv"),
        describe(&project.description, ALL_COUNTRIES),
        records.to_vec(),
        None,
    ));

    let limit = max_groups.unwrap_or(usize::MAX);
    if groups.len() > limit {
        log::warn!(
            "Writing {limit} of {} country resources (max_groups is set)",
            groups.len()
        );
    }
    for (code, group) in groups.iter().take(limit) {
        let country_name = group
            .first()
            .map_or(code.as_str(), ShapedRecord::country_name);
        resources.push(OutputUnit::new(
            format!("{}-{resource_slug}.csv", code.to_lowercase()),
            describe(&project.description, country_name),
            group.clone(),
            Some(code.clone()),
        ));
    }

    log::info!(
        "Assembled dataset with {} countries, {} resources, covering {time_period}",
        countries.len(),
        resources.len()
    );

    Ok(Dataset {
        name: slugify(&project.title),
        title: project.title.clone(),
        tags: project.tags.clone(),
        countries,
        locations,
        time_period,
        static_metadata: static_metadata.clone(),
        resources,
    })
}

fn describe(template: &str, country: &str) -> String {
    template.replace(COUNTRY_PLACEHOLDER, country)
}

/// Lower-case country codes in the order of `sorted_names`
fn country_locations(records: &[ShapedRecord], sorted_names: &[String]) -> Vec<String> {
    sorted_names
        .iter()
        .filter_map(|name| {
            records
                .iter()
                .find(|r| r.country_name() == name)
                .map(|r| r.country_code().to_lowercase())
        })
        .unique()
        .collect()
}
