use crate::utils::{fixture_records, raw};
use eve_scraper::{distinct_country_names, group_by_country, shape};
use serde_json::json;

/// Internal bookkeeping fields never reach the output
#[test]
fn test_internal_fields_removed() -> eve_scraper::Result<()> {
    let shaped = shape(fixture_records())?;
    assert_eq!(shaped.len(), 7);
    for record in &shaped {
        assert!(record.get("ObjectId").is_none());
        assert!(record.get("biweekly_group").is_none());
    }
    Ok(())
}

/// `pop_affected` is published as `pop_exposed` with the same value
#[test]
fn test_population_renamed() -> eve_scraper::Result<()> {
    let shaped = shape(fixture_records())?;
    let thailand = shaped
        .iter()
        .find(|r| r.country_code() == "THA")
        .expect("fixture has Thailand");

    assert!(thailand.get("pop_affected").is_none());
    assert_eq!(thailand.get("pop_exposed"), Some(&json!(2550)));

    let afghanistan = shaped.iter().find(|r| r.country_code() == "AFG").unwrap();
    assert_eq!(afghanistan.get("pop_exposed"), Some(&json!(null)));
    Ok(())
}

/// Dates are calendar strings and `end_date` follows `start_date`
#[test]
fn test_dates_normalized_and_adjacent() -> eve_scraper::Result<()> {
    let shaped = shape(fixture_records())?;
    for record in &shaped {
        let headers = record.headers();
        let start = headers.iter().position(|h| h == "start_date").unwrap();
        assert_eq!(headers[start + 1], "end_date");
    }
    assert_eq!(
        shaped[0].headers(),
        vec![
            "adm0_iso3",
            "adm0_name",
            "adm1_name",
            "period_number",
            "start_date",
            "end_date",
            "flood_area_ha",
            "pop_exposed"
        ]
    );
    let period_27: Vec<_> = shaped
        .iter()
        .filter(|r| r.period_number() == 27)
        .map(|r| r.get("end_date").cloned())
        .collect();
    assert_eq!(period_27, vec![Some(json!("2025-02-15")); 2]);
    Ok(())
}

/// Newest period first, then country name, keeping source order on ties
#[test]
fn test_sort_order() -> eve_scraper::Result<()> {
    let shaped = shape(fixture_records())?;
    let order: Vec<(i64, &str, String)> = shaped
        .iter()
        .map(|r| {
            (
                r.period_number(),
                r.country_code(),
                r.get("adm1_name").and_then(|v| v.as_str()).unwrap().to_string(),
            )
        })
        .collect();

    assert_eq!(
        order,
        vec![
            (28, "AFG", "Kabul".to_string()),
            (28, "NGA", "Borno".to_string()),
            (28, "NGA", "Adamawa".to_string()),
            (28, "THA", "Bangkok".to_string()),
            (28, "YEM", "Aden".to_string()),
            (27, "NGA", "Borno".to_string()),
            (27, "YEM", "Aden".to_string()),
        ]
    );

    for pair in shaped.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        assert!(
            a.period_number() > b.period_number()
                || (a.period_number() == b.period_number() && a.country_name() <= b.country_name())
        );
    }
    Ok(())
}

/// Groups follow first appearance in the sorted records
#[test]
fn test_grouping_follows_sorted_order() -> eve_scraper::Result<()> {
    let shaped = shape(fixture_records())?;
    let groups = group_by_country(&shaped);

    let codes: Vec<&str> = groups.keys().map(String::as_str).collect();
    assert_eq!(codes, vec!["AFG", "NGA", "THA", "YEM"]);

    for (code, group) in &groups {
        let expected: Vec<_> = shaped
            .iter()
            .filter(|r| r.country_code() == code.as_str())
            .cloned()
            .collect();
        assert_eq!(group, &expected);
    }

    let mut names: Vec<String> = distinct_country_names(&shaped).into_iter().collect();
    names.sort();
    assert_eq!(names, vec!["Afghanistan", "Nigeria", "Thailand", "Yemen"]);
    Ok(())
}

/// A record without a country code is rejected with the field name
#[test]
fn test_malformed_record_rejected() {
    let err = shape(vec![raw(json!({
        "start_date": "2025-02-16",
        "end_date": 1_740_700_800_000_i64,
        "adm0_name": "Thailand",
        "period_number": 28
    }))])
    .unwrap_err();

    assert!(err.to_string().contains("adm0_iso3"));
}
