//! Contract Invariant Tests
//!
//! These tests verify the non-negotiable guarantees.

use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;

use calendar_engine::{
    astro, hebrew,
    hashing::canonical_json,
    holidays::{HEBREW_RELIGIOUS, SECULAR, US_FEDERAL},
    overlay::{self, AnnotationSource},
    render_vector, CalendarConfig, CalendarEngine, CalendarKind, ConfigurationError, CustomDate,
    LayoutStyle,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn invariant_one_root_and_twelve_months_for_2025_grid() {
    let config = CalendarConfig::new(2025);
    assert_eq!(config.layout_style, LayoutStyle::Grid);

    let doc = render_vector(&config, &BTreeMap::new()).unwrap();
    let markup = doc.as_str();

    assert!(markup.starts_with("<?xml "));
    assert_eq!(markup.matches("<svg").count(), 1);
    assert_eq!(markup.matches("</svg>").count(), 1);
    assert_eq!(doc.month_group_count(), 12);
}

#[test]
fn invariant_render_is_idempotent() {
    let mut config = CalendarConfig::new(2025);
    config.holiday_sets = vec![US_FEDERAL.into(), SECULAR.into()];
    config.latitude = Some(40.7);
    config.longitude = Some(-74.0);
    config.timezone = "-05:00".into();

    let a = render_vector(&config, &BTreeMap::new()).unwrap();
    let b = render_vector(&config, &BTreeMap::new()).unwrap();
    assert_eq!(a, b);
}

#[test]
fn invariant_validation_runs_before_rendering() {
    let mut config = CalendarConfig::new(2025);
    config.colors.year_text = Some("#12345".into());
    let err = render_vector(&config, &BTreeMap::new()).unwrap_err();
    assert!(matches!(err, ConfigurationError::MalformedColor { ref field, .. } if field == "yearText"));

    let config = CalendarConfig::new(2101);
    assert!(matches!(
        render_vector(&config, &BTreeMap::new()),
        Err(ConfigurationError::InvalidYear(2101))
    ));
}

#[test]
fn invariant_unsupported_layout_rejected_at_parse() {
    let err = CalendarConfig::from_json(r#"{"year": 2025, "layoutStyle": "spiral"}"#).unwrap_err();
    assert!(err.to_string().contains("spiral") || matches!(err, ConfigurationError::Malformed(_)));
}

#[test]
fn invariant_illumination_in_unit_interval() {
    for year in [1900, 2000, 2025, 2100] {
        let samples = astro::samples_for_year(year, None);
        assert!(samples.len() >= 365);
        for s in samples {
            assert!((0.0..=1.0).contains(&s.illumination), "{} -> {}", s.date, s.illumination);
            assert!((0.0..std::f64::consts::TAU).contains(&s.phase_angle));
        }
    }
}

#[test]
fn invariant_leap_cycle_has_seven_leap_years() {
    for start in [5700, 5777, 5800] {
        let leaps = (start..start + 19).filter(|y| hebrew::is_leap_year(*y)).count();
        assert_eq!(leaps, 7);
    }
}

#[test]
fn invariant_month_names_follow_leap_rule() {
    let leap = 5784;
    let common = 5785;
    assert!(hebrew::is_leap_year(leap));
    assert!(!hebrew::is_leap_year(common));

    let leap_names: Vec<_> = (1..=13).filter_map(|m| hebrew::month_name(m, leap)).collect();
    assert!(leap_names.contains(&"Adar I"));
    assert!(leap_names.contains(&"Adar II"));
    assert!(!leap_names.contains(&"Adar"));

    let common_names: Vec<_> = (1..=13).filter_map(|m| hebrew::month_name(m, common)).collect();
    assert_eq!(common_names.len(), 12);
    assert!(common_names.contains(&"Adar"));
    assert!(!common_names.contains(&"Adar I"));
}

#[test]
fn invariant_hebrew_2025_month_groups_match_leap_rule() {
    let mut config = CalendarConfig::new(2025);
    config.calendar_kind = CalendarKind::Hebrew;
    config.holiday_sets = vec![HEBREW_RELIGIOUS.into()];

    let doc = render_vector(&config, &BTreeMap::new()).unwrap();
    let expected = if hebrew::is_leap_year(config.hebrew_year()) { 13 } else { 12 };
    assert_eq!(config.hebrew_year(), 5785);
    assert_eq!(doc.month_group_count(), expected);
}

#[test]
fn invariant_tie_break_is_deterministic() {
    // Both sets define January 1; the one listed first wins, every time.
    let mut config = CalendarConfig::new(2025);
    config.holiday_sets = vec![SECULAR.into(), US_FEDERAL.into()];
    let engine = CalendarEngine::builtin();

    let first = engine.layout(&config, &BTreeMap::new()).unwrap();
    let again = engine.layout(&config, &BTreeMap::new()).unwrap();
    let pick = |layout: &calendar_engine::layout::CalendarLayout| {
        layout
            .cells()
            .find(|c| c.date == date(2025, 1, 1))
            .and_then(|c| c.annotation.clone())
            .unwrap()
    };
    assert_eq!(pick(&first), pick(&again));
    assert_eq!(pick(&first).text, "New Year");
    assert_eq!(pick(&first).source, AnnotationSource::HolidaySet(SECULAR.into()));

    config.holiday_sets.reverse();
    let swapped = engine.layout(&config, &BTreeMap::new()).unwrap();
    assert_eq!(pick(&swapped).text, "New Year's Day");
}

#[test]
fn invariant_custom_date_wins_over_all_sources() {
    let day = date(2025, 12, 25);
    let mut custom = BTreeMap::new();
    custom.insert(day, CustomDate { text: "Ours".into(), emoji: None, color: Some("#00ff00".into()) });
    let mut holiday_map = BTreeMap::new();
    holiday_map.insert(day, "Theirs".to_string());

    let resolved = overlay::resolve(&custom, &holiday_map, &[]);
    assert_eq!(resolved[&day].text, "Ours");
    assert_eq!(resolved[&day].source, AnnotationSource::Custom);
}

#[test]
fn invariant_every_day_of_year_present_once() {
    for year in [2024, 2025] {
        let layout = CalendarEngine::builtin()
            .layout(&CalendarConfig::new(year), &BTreeMap::new())
            .unwrap();
        let mut dates: Vec<_> = layout.cells().map(|c| c.date).collect();
        let len = dates.len();
        dates.dedup();
        assert_eq!(dates.len(), len);
        assert!(dates.iter().all(|d| d.year() == year));
        assert_eq!(len, if year == 2024 { 366 } else { 365 });
    }
}

#[test]
fn invariant_canonical_json_deterministic() {
    use serde_json::json;

    let obj1 = json!({"z": 1, "a": 2, "m": {"b": 1, "a": 2}});
    let obj2 = json!({"a": 2, "m": {"a": 2, "b": 1}, "z": 1});

    let c1 = canonical_json(&obj1).unwrap();
    let c2 = canonical_json(&obj2).unwrap();

    // Must be identical despite different input ordering
    assert_eq!(c1, c2);
}

#[cfg(feature = "test-hooks")]
#[test]
fn invariant_render_calls_validate() {
    use calendar_engine::pipeline::{get_validation_call_count, reset_validation_call_count};

    reset_validation_call_count();
    let _ = render_vector(&CalendarConfig::new(2025), &BTreeMap::new());
    assert!(get_validation_call_count() >= 1);
}
