//! Reporting period numbers
//!
//! Periods are biweekly: each month has two, the first covering days 1-14
//! and the second the rest of the month. Period 1 is the first half of
//! January of the start year.

use chrono::{Datelike, NaiveDate};

use crate::error::{EveError, Result};
use crate::source::{FeatureSource, period_clause};
use crate::utils::logging::progress::{create_spinner, finish_and_clear};

/// Periods per calendar year
pub const PERIODS_PER_YEAR: i64 = 24;

/// Day of the month on which the second period starts
const SECOND_HALF_START_DAY: u32 = 15;

/// Period number containing `date`
#[must_use]
pub fn current_period(date: NaiveDate, start_year: i32) -> i64 {
    let years = i64::from(date.year() - start_year);
    let months = i64::from(date.month0());
    let half = if date.day() >= SECOND_HALF_START_DAY { 2 } else { 1 };
    years * PERIODS_PER_YEAR + months * 2 + half
}

/// Find the most recent populated period at or before `start_guess`.
///
/// Candidates are probed newest first, at most `max_lookback` periods back
/// and never below period 1.
///
/// # Errors
/// Returns a configuration error when `start_guess` is below period 1
/// (a date before the start year), `PeriodsExhausted` when no candidate has
/// data, or the first query error from `source`.
pub fn resolve_period<S: FeatureSource + ?Sized>(
    source: &S,
    start_guess: i64,
    max_lookback: u32,
) -> Result<i64> {
    if start_guess < 1 {
        return Err(EveError::Config(format!(
            "period {start_guess} is before the first period; check the start year"
        )));
    }

    let lowest = (start_guess - i64::from(max_lookback)).max(1);
    let spinner = create_spinner(Some("Resolving latest period"));

    for candidate in (lowest..=start_guess).rev() {
        spinner.set_message(format!("Trying period_number: {candidate}"));
        spinner.tick();
        log::debug!("Trying period_number: {candidate}");

        let found = match source.exists(&period_clause(candidate)) {
            Ok(found) => found,
            Err(e) => {
                finish_and_clear(&spinner);
                return Err(e);
            }
        };
        if found {
            finish_and_clear(&spinner);
            log::info!("Data found for period_number: {candidate}");
            return Ok(candidate);
        }
        log::info!("No data for period_number: {candidate}, trying previous period");
    }

    finish_and_clear(&spinner);
    Err(EveError::PeriodsExhausted {
        start: start_guess,
        lowest,
    })
}
