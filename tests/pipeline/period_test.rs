use crate::utils::{MockSource, fixture_records, saved_source};
use chrono::NaiveDate;
use eve_scraper::{EveError, current_period, resolve_period};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Probing walks back from the current period to the newest populated one
#[test]
fn test_latest_period_from_saved_data() -> eve_scraper::Result<()> {
    let guess = current_period(date(2025, 3, 20), 2024);
    assert_eq!(guess, 30);

    let source = saved_source();
    assert_eq!(resolve_period(&source, guess, 48)?, 28);
    Ok(())
}

/// Each probe is a single-period filter, newest first
#[test]
fn test_probe_filters() -> eve_scraper::Result<()> {
    let source = MockSource::new(fixture_records());
    resolve_period(&source, 30, 48)?;

    assert_eq!(
        *source.filters.borrow(),
        vec![
            "period_number = 30".to_string(),
            "period_number = 29".to_string(),
            "period_number = 28".to_string(),
        ]
    );
    Ok(())
}

/// An empty table exhausts the lookback window instead of looping forever
#[test]
fn test_empty_source_exhausts() {
    let source = MockSource::new(Vec::new());
    let err = resolve_period(&source, 30, 4).unwrap_err();

    assert!(matches!(err, EveError::PeriodsExhausted { start: 30, lowest: 26 }));
    assert_eq!(source.filters.borrow().len(), 5);
}

/// Query failures abort probing immediately
#[test]
fn test_transport_failure_propagates() {
    let source = MockSource::failing("connection reset");
    let err = resolve_period(&source, 30, 48).unwrap_err();

    assert!(matches!(err, EveError::Transport { .. }));
    assert_eq!(source.filters.borrow().len(), 1);
}
