//! Country grouping and country lists

use indexmap::IndexMap;
use rustc_hash::FxHashSet;

use crate::record::ShapedRecord;

/// Shaped records keyed by ISO3 country code, in first-seen order
pub type CountryGroups = IndexMap<String, Vec<ShapedRecord>>;

/// Partition records by `adm0_iso3`.
///
/// Groups appear in the order their code is first seen in `records`, and
/// each group keeps the relative order of its records.
#[must_use]
pub fn group_by_country(records: &[ShapedRecord]) -> CountryGroups {
    let mut groups = CountryGroups::new();
    for record in records {
        groups
            .entry(record.country_code().to_string())
            .or_default()
            .push(record.clone());
    }
    log::debug!("Grouped {} records into {} countries", records.len(), groups.len());
    groups
}

/// Distinct `adm0_name` values
#[must_use]
pub fn distinct_country_names(records: &[ShapedRecord]) -> FxHashSet<String> {
    records
        .iter()
        .map(|record| record.country_name().to_string())
        .collect()
}
