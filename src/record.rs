//! Raw and shaped flood-event records
//!
//! Records are insertion-ordered JSON objects. Field order carries no meaning
//! for equality but decides the column order of the written files.

use chrono::NaiveDate;
use serde_json::{Map, Value};

use crate::error::{EveError, Result};

/// One row as returned by the feature service
pub type RawRecord = Map<String, Value>;

/// Field names used by the shaping pipeline
pub mod fields {
    pub const OBJECT_ID: &str = "ObjectId";
    pub const BIWEEKLY_GROUP: &str = "biweekly_group";
    pub const POP_AFFECTED: &str = "pop_affected";
    pub const POP_EXPOSED: &str = "pop_exposed";
    pub const START_DATE: &str = "start_date";
    pub const END_DATE: &str = "end_date";
    pub const COUNTRY_CODE: &str = "adm0_iso3";
    pub const COUNTRY_NAME: &str = "adm0_name";
    pub const PERIOD_NUMBER: &str = "period_number";
}

/// ISO calendar date format used for `start_date` and `end_date`
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A record after field cleanup, with the fields that drive grouping,
/// sorting and date ranges extracted up front.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapedRecord {
    fields: RawRecord,
    country_code: String,
    country_name: String,
    period_number: i64,
    start_date: NaiveDate,
    end_date: NaiveDate,
}

impl ShapedRecord {
    /// Validate a cleaned-up record and wrap it
    ///
    /// # Errors
    /// Returns `MalformedRecord` when `adm0_iso3`, `adm0_name`,
    /// `period_number`, `start_date` or `end_date` is missing or invalid.
    pub fn try_new(fields: RawRecord) -> Result<Self> {
        let country_code = required_str(&fields, fields::COUNTRY_CODE)?.to_string();
        let country_name = required_str(&fields, fields::COUNTRY_NAME)?.to_string();
        let period_number = required_int(&fields, fields::PERIOD_NUMBER)?;
        let start_date = required_date(&fields, fields::START_DATE)?;
        let end_date = required_date(&fields, fields::END_DATE)?;

        Ok(Self {
            fields,
            country_code,
            country_name,
            period_number,
            start_date,
            end_date,
        })
    }

    #[must_use]
    pub fn country_code(&self) -> &str {
        &self.country_code
    }

    #[must_use]
    pub fn country_name(&self) -> &str {
        &self.country_name
    }

    #[must_use]
    pub const fn period_number(&self) -> i64 {
        self.period_number
    }

    #[must_use]
    pub const fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    #[must_use]
    pub const fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    /// All fields in output order
    #[must_use]
    pub const fn fields(&self) -> &RawRecord {
        &self.fields
    }

    /// Look up a single field
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Field names in output order
    #[must_use]
    pub fn headers(&self) -> Vec<String> {
        self.fields.keys().cloned().collect()
    }

    #[must_use]
    pub fn into_fields(self) -> RawRecord {
        self.fields
    }
}

/// Integer value of a field, accepting doubles with no fractional part
#[must_use]
pub fn as_integer(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        // Some layers publish integer columns as doubles
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0)
            .map(|f| f as i64)
    })
}

fn required<'a>(record: &'a RawRecord, field: &str) -> Result<&'a Value> {
    match record.get(field) {
        None | Some(Value::Null) => Err(EveError::malformed(field, "is missing")),
        Some(value) => Ok(value),
    }
}

fn required_str<'a>(record: &'a RawRecord, field: &str) -> Result<&'a str> {
    required(record, field)?
        .as_str()
        .ok_or_else(|| EveError::malformed(field, "is not a string"))
}

fn required_int(record: &RawRecord, field: &str) -> Result<i64> {
    let value = required(record, field)?;
    as_integer(value).ok_or_else(|| EveError::malformed(field, format!("is not an integer: {value}")))
}

fn required_date(record: &RawRecord, field: &str) -> Result<NaiveDate> {
    let raw = required_str(record, field)?;
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|e| EveError::malformed(field, format!("is not a YYYY-MM-DD date ({raw}): {e}")))
}
