use crate::utils::{MockSource, fixture_records, project_config, static_metadata, test_config};
use chrono::NaiveDate;
use eve_scraper::config::PeriodSelection;
use eve_scraper::dataset::writer::MANIFEST_FILE;
use eve_scraper::{EveError, SavedFeatures, Scraper};
use serde_json::{Value, json};

const GLOBAL_FILE: &str = "global-events-visualization-in-emergencies.csv";

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 20).unwrap()
}

fn read_manifest(dir: &std::path::Path) -> Value {
    let body = std::fs::read_to_string(dir.join(MANIFEST_FILE)).unwrap();
    serde_json::from_str(&body).unwrap()
}

/// Latest period: global file, one file per country and a manifest
#[test]
fn test_run_latest_period() -> eve_scraper::Result<()> {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path(), PeriodSelection::Latest);
    let output = config.output_dir.clone();
    let scraper = Scraper::new(project_config(), static_metadata(), config);
    let source = MockSource::new(fixture_records());

    let summary = scraper.run(&source, today())?;

    assert_eq!(summary.period, Some(28));
    assert_eq!(summary.records, 5);
    assert_eq!(summary.countries, 4);
    assert_eq!(summary.resources, 5);
    assert_eq!(
        summary.dataset.countries,
        vec!["Afghanistan", "Nigeria", "Thailand", "Yemen"]
    );
    assert_eq!(
        summary.dataset.time_period.to_dataset_date(),
        "[2025-02-16T00:00:00 TO 2025-02-28T23:59:59]"
    );
    assert_eq!(
        source.filters.borrow().last().map(String::as_str),
        Some("period_number = 28")
    );

    let global = std::fs::read_to_string(output.join(GLOBAL_FILE)).unwrap();
    let lines: Vec<&str> = global.lines().collect();
    assert_eq!(lines.len(), 7);
    assert_eq!(
        lines[0],
        "adm0_iso3,adm0_name,adm1_name,period_number,start_date,end_date,flood_area_ha,pop_exposed"
    );
    assert_eq!(lines[1], "#country+code,#country+name,,,,,,");
    assert_eq!(lines[2], "AFG,Afghanistan,Kabul,28,2025-02-16,2025-02-28,0.5,");

    let thailand =
        std::fs::read_to_string(output.join("tha-events-visualization-in-emergencies.csv")).unwrap();
    assert_eq!(
        thailand.lines().nth(2),
        Some("THA,Thailand,Bangkok,28,2025-02-16,2025-02-28,12.25,2550")
    );

    let nigeria =
        std::fs::read_to_string(output.join("nga-events-visualization-in-emergencies.csv")).unwrap();
    assert_eq!(nigeria.lines().count(), 4);

    let manifest = read_manifest(&output);
    assert_eq!(
        manifest["name"],
        json!("fao-flood-events-visualization-in-emergencies-eve")
    );
    assert_eq!(manifest["license_id"], json!("cc-by"));
    assert_eq!(
        manifest["groups"],
        json!([{"name": "afg"}, {"name": "nga"}, {"name": "tha"}, {"name": "yem"}])
    );
    assert_eq!(manifest["resources"].as_array().unwrap().len(), 5);
    assert_eq!(manifest["resources"][0]["name"], json!(GLOBAL_FILE));
    assert!(
        manifest["resources"][0]["description"]
            .as_str()
            .unwrap()
            .contains("for all countries")
    );
    assert!(
        manifest["resources"][2]["description"]
            .as_str()
            .unwrap()
            .contains("for Nigeria")
    );
    Ok(())
}

/// Capping country resources leaves the global file complete
#[test]
fn test_run_with_max_groups() -> eve_scraper::Result<()> {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path(), PeriodSelection::Latest);
    config.max_groups = Some(2);
    let output = config.output_dir.clone();
    let scraper = Scraper::new(project_config(), static_metadata(), config);

    let summary = scraper.run(&MockSource::new(fixture_records()), today())?;

    assert_eq!(summary.resources, 3);
    assert_eq!(summary.countries, 4);
    assert!(output.join("afg-events-visualization-in-emergencies.csv").is_file());
    assert!(output.join("nga-events-visualization-in-emergencies.csv").is_file());
    assert!(!output.join("tha-events-visualization-in-emergencies.csv").exists());
    assert_eq!(
        std::fs::read_to_string(output.join(GLOBAL_FILE))
            .unwrap()
            .lines()
            .count(),
        7
    );
    Ok(())
}

/// Every period, newest first in the global file
#[test]
fn test_run_all_periods() -> eve_scraper::Result<()> {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path(), PeriodSelection::All);
    let output = config.output_dir.clone();
    let scraper = Scraper::new(project_config(), static_metadata(), config);
    let source = MockSource::new(fixture_records());

    let summary = scraper.run(&source, today())?;

    assert_eq!(summary.period, None);
    assert_eq!(summary.records, 7);
    assert_eq!(
        summary.dataset.time_period.to_string(),
        "2025-02-01 to 2025-02-28"
    );
    assert_eq!(*source.filters.borrow(), vec!["1=1".to_string()]);

    let global = std::fs::read_to_string(output.join(GLOBAL_FILE)).unwrap();
    let last = global.lines().last().unwrap();
    assert!(last.starts_with("YEM,Yemen,Aden,27,"));
    Ok(())
}

/// A fixed period skips probing
#[test]
fn test_run_fixed_period() -> eve_scraper::Result<()> {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path(), PeriodSelection::Fixed(27));
    let scraper = Scraper::new(project_config(), static_metadata(), config);
    let source = MockSource::new(fixture_records());

    let summary = scraper.run(&source, today())?;

    assert_eq!(summary.period, Some(27));
    assert_eq!(summary.records, 2);
    assert_eq!(summary.dataset.locations, vec!["nga", "yem"]);
    assert_eq!(*source.filters.borrow(), vec!["period_number = 27".to_string()]);
    Ok(())
}

/// Nothing is written when no period in the window has data
#[test]
fn test_run_exhausted_lookback_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path(), PeriodSelection::Latest);
    config.max_lookback = 1;
    let output = config.output_dir.clone();
    let scraper = Scraper::new(project_config(), static_metadata(), config);

    let err = scraper
        .run(&MockSource::new(fixture_records()), today())
        .unwrap_err();

    assert!(matches!(
        err,
        EveError::PeriodsExhausted {
            start: 30,
            lowest: 29
        }
    ));
    assert!(!output.exists());
}

/// A period with no rows is an empty dataset, not an empty publication
#[test]
fn test_run_fixed_period_without_rows() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path(), PeriodSelection::Fixed(5));
    let output = config.output_dir.clone();
    let scraper = Scraper::new(project_config(), static_metadata(), config);

    let err = scraper
        .run(&MockSource::new(fixture_records()), today())
        .unwrap_err();

    assert!(matches!(err, EveError::EmptyDataset));
    assert!(!output.exists());
}

/// Fetched rows can be saved and replayed without the service
#[test]
fn test_run_saves_and_replays() -> eve_scraper::Result<()> {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path(), PeriodSelection::Latest);
    config.save = true;
    let saved_dir = config.saved_dir.clone();
    let scraper = Scraper::new(project_config(), static_metadata(), config.clone());

    scraper.run(&MockSource::new(fixture_records()), today())?;

    let saved = SavedFeatures::load_latest(&saved_dir)?;
    assert_eq!(saved.len(), 5);

    config.save = false;
    config.use_saved = true;
    let replay = Scraper::new(project_config(), static_metadata(), config);
    let source = replay.open_source(None)?;
    let summary = replay.run(&source, today())?;
    assert_eq!(summary.period, Some(28));
    assert_eq!(summary.records, 5);
    Ok(())
}

/// Transport failures surface unchanged
#[test]
fn test_run_propagates_source_failure() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path(), PeriodSelection::All);
    let scraper = Scraper::new(project_config(), static_metadata(), config);

    let err = scraper
        .run(&MockSource::failing("connection reset"), today())
        .unwrap_err();

    assert!(matches!(err, EveError::Transport { .. }));
    assert!(err.to_string().contains("connection reset"));
}

/// The live service cannot be opened without credentials
#[test]
fn test_open_source_requires_credentials() {
    let dir = tempfile::tempdir().unwrap();
    let scraper = Scraper::new(
        project_config(),
        static_metadata(),
        test_config(dir.path(), PeriodSelection::Latest),
    );

    let err = scraper.open_source(None).err().unwrap();
    assert!(matches!(err, EveError::Config(_)));
}

/// Snapshots that store period numbers as doubles replay like integer ones
#[test]
fn test_run_replays_double_period_numbers() -> eve_scraper::Result<()> {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path(), PeriodSelection::Latest);
    config.use_saved = true;
    std::fs::create_dir_all(&config.saved_dir).unwrap();
    let snapshot = json!({
        "features": [{"attributes": {
            "adm0_iso3": "THA",
            "adm0_name": "Thailand",
            "adm1_name": "Bangkok",
            "period_number": 28.0,
            "end_date": 1_740_700_800_000_i64,
            "start_date": "2025-02-16",
            "pop_affected": 2550
        }}]
    });
    std::fs::write(config.saved_dir.join("data-latest.json"), snapshot.to_string()).unwrap();

    let latest = Scraper::new(project_config(), static_metadata(), config.clone());
    let summary = latest.run(&latest.open_source(None)?, today())?;
    assert_eq!(summary.period, Some(28));
    assert_eq!(summary.records, 1);

    config.period = PeriodSelection::Fixed(28);
    let fixed = Scraper::new(project_config(), static_metadata(), config);
    let summary = fixed.run(&fixed.open_source(None)?, today())?;
    assert_eq!(summary.records, 1);
    assert_eq!(summary.dataset.locations, vec!["tha"]);
    Ok(())
}
