//! Record shaping
//!
//! Turns raw feature-service rows into output records: internal fields are
//! dropped, `pop_affected` is renamed, `end_date` is converted from epoch
//! milliseconds to a calendar date and moved next to `start_date`, and the
//! result is sorted by period (newest first) and country name.

use chrono::DateTime;
use serde_json::Value;

use crate::error::{EveError, Result};
use crate::record::{DATE_FORMAT, RawRecord, ShapedRecord, fields};

/// Fields that only exist for the service's own bookkeeping
pub const INTERNAL_FIELDS: [&str; 2] = [fields::OBJECT_ID, fields::BIWEEKLY_GROUP];

/// Shape and sort a batch of raw records
///
/// # Errors
/// Returns `MalformedRecord` if a record has an unconvertible `end_date` or
/// lacks one of the fields every shaped record must carry.
pub fn shape(records: Vec<RawRecord>) -> Result<Vec<ShapedRecord>> {
    let mut shaped = records
        .into_iter()
        .map(shape_record)
        .collect::<Result<Vec<_>>>()?;

    sort_records(&mut shaped);
    log::debug!("Shaped {} records", shaped.len());
    Ok(shaped)
}

/// Shape a single record without sorting
pub fn shape_record(mut record: RawRecord) -> Result<ShapedRecord> {
    drop_fields(&mut record, &INTERNAL_FIELDS);
    let mut record = rename_field(record, fields::POP_AFFECTED, fields::POP_EXPOSED);
    normalize_end_date(&mut record)?;
    let record = place_after(record, fields::START_DATE, fields::END_DATE);
    ShapedRecord::try_new(record)
}

/// Sort by period number descending, then country name ascending.
///
/// `sort_by` is stable so records with equal keys keep their relative order.
pub fn sort_records(records: &mut [ShapedRecord]) {
    records.sort_by(|a, b| {
        b.period_number()
            .cmp(&a.period_number())
            .then_with(|| a.country_name().cmp(b.country_name()))
    });
}

/// Remove the named keys, ignoring any that are absent
pub fn drop_fields(record: &mut RawRecord, names: &[&str]) {
    for name in names {
        // `remove` would swap the last field into the gap
        record.shift_remove(*name);
    }
}

/// Rename `from` to `to` in place, keeping the position of `from`.
///
/// An existing `to` field is overwritten by the value of `from`.
#[must_use]
pub fn rename_field(record: RawRecord, from: &str, to: &str) -> RawRecord {
    if !record.contains_key(from) {
        return record;
    }

    record
        .into_iter()
        .filter(|(key, _)| key != to)
        .map(|(key, value)| {
            if key == from {
                (to.to_string(), value)
            } else {
                (key, value)
            }
        })
        .collect()
}

/// Convert an epoch-millisecond `end_date` into a UTC `YYYY-MM-DD` string.
///
/// String values are assumed to be converted already and are left alone.
pub fn normalize_end_date(record: &mut RawRecord) -> Result<()> {
    let Some(value) = record.get_mut(fields::END_DATE) else {
        return Ok(());
    };

    if let Value::Number(number) = value {
        let millis = number
            .as_i64()
            .or_else(|| number.as_f64().map(|f| f as i64))
            .ok_or_else(|| EveError::malformed(fields::END_DATE, "is not an integer"))?;
        *value = Value::String(epoch_millis_to_date(millis)?);
    }
    Ok(())
}

/// Format epoch milliseconds as the UTC calendar date
pub fn epoch_millis_to_date(millis: i64) -> Result<String> {
    DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.date_naive().format(DATE_FORMAT).to_string())
        .ok_or_else(|| {
            EveError::malformed(fields::END_DATE, format!("timestamp {millis} is out of range"))
        })
}

/// Move `key` so it immediately follows `anchor`.
///
/// The record is returned unchanged if either key is missing.
#[must_use]
pub fn place_after(mut record: RawRecord, anchor: &str, key: &str) -> RawRecord {
    if !record.contains_key(anchor) {
        return record;
    }
    let Some(moved) = record.shift_remove(key) else {
        return record;
    };

    let mut reordered = RawRecord::with_capacity(record.len() + 1);
    let mut moved = Some(moved);
    for (name, value) in record {
        let is_anchor = name == anchor;
        reordered.insert(name, value);
        if is_anchor && let Some(value) = moved.take() {
            reordered.insert(key.to_string(), value);
        }
    }
    reordered
}
