//! Raw record fetching

use std::time::Instant;

use crate::error::Result;
use crate::record::RawRecord;
use crate::source::{FeatureSource, MATCH_ALL, period_clause};
use crate::utils::logging::{log_stage_complete, log_stage_start};

/// Name of the service's row identifier column, compared case-insensitively
pub const ROW_ID_COLUMN: &str = "objectid";

/// Every column of the table except the row identifier
pub fn output_columns<S: FeatureSource + ?Sized>(source: &S) -> Result<Vec<String>> {
    Ok(source
        .field_names()?
        .into_iter()
        .filter(|name| !name.eq_ignore_ascii_case(ROW_ID_COLUMN))
        .collect())
}

/// Fetch all rows of `period`, or of every period when `None`
pub fn fetch<S: FeatureSource + ?Sized>(source: &S, period: Option<i64>) -> Result<Vec<RawRecord>> {
    let filter = period.map_or_else(|| MATCH_ALL.to_string(), period_clause);
    let columns = output_columns(source)?;

    log_stage_start("fetch", format_args!("{} columns where {filter}", columns.len()));
    let start = Instant::now();
    let records = source.query(&filter, &columns)?;
    log_stage_complete("fetch", records.len(), Some(start.elapsed()));
    Ok(records)
}
