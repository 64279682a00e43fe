//! Feature-table data sources
//!
//! The pipeline only needs two things from the upstream table: its column
//! names and a way to run a `where` query over a column subset. Live data
//! comes from an ArcGIS feature service, saved snapshots from a JSON file.

pub mod arcgis;
pub mod saved;

pub use arcgis::{ArcGisClient, ArcGisTable};
pub use saved::SavedFeatures;

use crate::error::Result;
use crate::record::{RawRecord, fields};

/// Filter that matches every row
pub const MATCH_ALL: &str = "1=1";

/// A queryable table of flood-event observations
pub trait FeatureSource {
    /// Column names of the table, in service order
    fn field_names(&self) -> Result<Vec<String>>;

    /// Run a `where` query, returning each row's attributes in column order
    fn query(&self, filter: &str, columns: &[String]) -> Result<Vec<RawRecord>>;

    /// Whether at least one row matches `filter`
    fn exists(&self, filter: &str) -> Result<bool> {
        let columns = [fields::PERIOD_NUMBER.to_string()];
        Ok(!self.query(filter, &columns)?.is_empty())
    }
}

impl<S: FeatureSource + ?Sized> FeatureSource for &S {
    fn field_names(&self) -> Result<Vec<String>> {
        (**self).field_names()
    }

    fn query(&self, filter: &str, columns: &[String]) -> Result<Vec<RawRecord>> {
        (**self).query(filter, columns)
    }

    fn exists(&self, filter: &str) -> Result<bool> {
        (**self).exists(filter)
    }
}

impl<S: FeatureSource + ?Sized> FeatureSource for Box<S> {
    fn field_names(&self) -> Result<Vec<String>> {
        (**self).field_names()
    }

    fn query(&self, filter: &str, columns: &[String]) -> Result<Vec<RawRecord>> {
        (**self).query(filter, columns)
    }

    fn exists(&self, filter: &str) -> Result<bool> {
        (**self).exists(filter)
    }
}

/// `where` clause selecting a single period
#[must_use]
pub fn period_clause(period: i64) -> String {
    format!("{} = {period}", fields::PERIOD_NUMBER)
}

/// Parse a clause produced by [`period_clause`].
///
/// Returns `None` for anything else, including [`MATCH_ALL`].
#[must_use]
pub fn parse_period_clause(filter: &str) -> Option<i64> {
    let (column, value) = filter.split_once('=')?;
    if column.trim() != fields::PERIOD_NUMBER {
        return None;
    }
    value.trim().parse().ok()
}
