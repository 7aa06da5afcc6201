//! Holiday/Event Overlay Resolver
//!
//! Merges custom dates, the caller's holiday map and holiday-set definitions
//! into at most one annotation per day. Precedence, highest first:
//!
//! 1. the configuration's custom date,
//! 2. the caller-supplied holiday map,
//! 3. holiday sets, in the order the configuration lists them; within one
//!    set the first definition for a day wins.
//!
//! Emoji: a custom date's own emoji, else the emoji of the winning set
//! definition for that day, else none. Text and emoji of a set-sourced
//! annotation always come from the same definition.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::CustomDate;
use crate::holidays::{HolidayDefinition, HolidayProvider};

/// Which source produced a resolved annotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "set", rename_all = "snake_case")]
pub enum AnnotationSource {
    Custom,
    HolidayMap,
    HolidaySet(String),
}

impl AnnotationSource {
    pub fn is_custom(&self) -> bool {
        matches!(self, AnnotationSource::Custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedAnnotation {
    pub date: NaiveDate,
    pub text: String,
    pub emoji: Option<String>,
    /// Only custom dates carry an explicit color.
    pub color: Option<String>,
    pub source: AnnotationSource,
}

/// Definitions of one holiday set, tagged with the set id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HolidaySetEntries {
    pub set: String,
    pub definitions: Vec<HolidayDefinition>,
}

/// Fetch every configured set for every year in `years`, keeping the
/// configuration's order. Unknown sets are skipped with a warning and
/// repeated ids are only fetched once.
pub fn collect_sets(provider: &dyn HolidayProvider, set_ids: &[String], years: &[i32]) -> Vec<HolidaySetEntries> {
    let mut sets: Vec<HolidaySetEntries> = vec![];
    for id in set_ids {
        if sets.iter().any(|s| &s.set == id) {
            continue;
        }
        let mut definitions = vec![];
        let mut known = false;
        for year in years {
            if let Some(defs) = provider.holidays(id, *year) {
                known = true;
                definitions.extend(defs);
            }
        }
        if !known {
            log::warn!("holiday set {} is not provided; skipping", id);
            continue;
        }
        sets.push(HolidaySetEntries { set: id.clone(), definitions });
    }
    sets
}

/// Resolve one annotation per day across all sources.
pub fn resolve(
    custom_dates: &BTreeMap<NaiveDate, CustomDate>,
    holiday_map: &BTreeMap<NaiveDate, String>,
    sets: &[HolidaySetEntries],
) -> BTreeMap<NaiveDate, ResolvedAnnotation> {
    // First definition per day across sets, in configuration order.
    let mut set_matches: BTreeMap<NaiveDate, &HolidayDefinition> = BTreeMap::new();
    for entries in sets {
        for def in &entries.definitions {
            set_matches.entry(def.date).or_insert(def);
        }
    }

    let mut days: Vec<NaiveDate> = custom_dates
        .keys()
        .chain(holiday_map.keys())
        .chain(set_matches.keys())
        .copied()
        .collect();
    days.sort();
    days.dedup();

    days.into_iter()
        .filter_map(|date| {
            let set_emoji = set_matches.get(&date).and_then(|def| def.emoji.clone());
            let resolved = if let Some(custom) = custom_dates.get(&date) {
                ResolvedAnnotation {
                    date,
                    text: custom.text.clone(),
                    emoji: custom.emoji.clone().or(set_emoji),
                    color: custom.color.clone(),
                    source: AnnotationSource::Custom,
                }
            } else if let Some(name) = holiday_map.get(&date) {
                ResolvedAnnotation {
                    date,
                    text: name.clone(),
                    emoji: set_emoji,
                    color: None,
                    source: AnnotationSource::HolidayMap,
                }
            } else {
                let def = set_matches.get(&date)?;
                ResolvedAnnotation {
                    date,
                    text: def.name.clone(),
                    emoji: def.emoji.clone(),
                    color: None,
                    source: AnnotationSource::HolidaySet(def.set.clone()),
                }
            };
            Some((date, resolved))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::holidays::BuiltinHolidays;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn set(id: &str, defs: &[(NaiveDate, &str, Option<&str>)]) -> HolidaySetEntries {
        HolidaySetEntries {
            set: id.to_string(),
            definitions: defs
                .iter()
                .map(|(d, name, emoji)| HolidayDefinition::new(*d, name, id, *emoji))
                .collect(),
        }
    }

    #[test]
    fn test_first_listed_set_wins() {
        let day = date(2025, 10, 31);
        let a = set("A", &[(day, "Halloween", Some("🎃"))]);
        let b = set("B", &[(day, "Reformation Day", None)]);

        let resolved = resolve(&BTreeMap::new(), &BTreeMap::new(), &[a.clone(), b.clone()]);
        assert_eq!(resolved[&day].text, "Halloween");
        assert_eq!(resolved[&day].source, AnnotationSource::HolidaySet("A".into()));

        let resolved = resolve(&BTreeMap::new(), &BTreeMap::new(), &[b, a]);
        assert_eq!(resolved[&day].text, "Reformation Day");
        // B has no emoji; A's pumpkin must not leak onto B's name.
        assert_eq!(resolved[&day].emoji, None);
    }

    #[test]
    fn test_custom_date_overrides_everything() {
        let day = date(2025, 12, 25);
        let sets = [
            set("A", &[(day, "Christmas", Some("🎄"))]),
            set("B", &[(day, "Christmas Day", None)]),
        ];
        let mut holiday_map = BTreeMap::new();
        holiday_map.insert(day, "Christmas Day (observed)".to_string());
        let mut custom = BTreeMap::new();
        custom.insert(day, CustomDate { text: "Family dinner".into(), emoji: None, color: Some("#ff0000".into()) });

        let resolved = resolve(&custom, &holiday_map, &sets);
        let annotation = &resolved[&day];
        assert_eq!(annotation.text, "Family dinner");
        assert_eq!(annotation.source, AnnotationSource::Custom);
        assert_eq!(annotation.color.as_deref(), Some("#ff0000"));
        assert_eq!(annotation.emoji.as_deref(), Some("🎄"));
    }

    #[test]
    fn test_custom_emoji_wins() {
        let day = date(2025, 10, 31);
        let sets = [set("A", &[(day, "Halloween", Some("🎃"))])];
        let mut custom = BTreeMap::new();
        custom.insert(day, CustomDate { text: "Party".into(), emoji: Some("💃".into()), color: None });
        let resolved = resolve(&custom, &BTreeMap::new(), &sets);
        assert_eq!(resolved[&day].emoji.as_deref(), Some("💃"));
    }

    #[test]
    fn test_holiday_map_overrides_sets() {
        let day = date(2025, 7, 4);
        let sets = [set("A", &[(day, "Independence Day", Some("🎆"))])];
        let mut holiday_map = BTreeMap::new();
        holiday_map.insert(day, "Fourth of July".to_string());
        holiday_map.insert(date(2025, 7, 5), "Day after".to_string());

        let resolved = resolve(&BTreeMap::new(), &holiday_map, &sets);
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[&day].text, "Fourth of July");
        assert_eq!(resolved[&day].source, AnnotationSource::HolidayMap);
        assert_eq!(resolved[&date(2025, 7, 5)].emoji, None);
    }

    #[test]
    fn test_first_definition_within_a_set() {
        let day = date(2025, 1, 1);
        let sets = [set("A", &[(day, "New Year", None), (day, "Feast", Some("⭐"))])];
        let resolved = resolve(&BTreeMap::new(), &BTreeMap::new(), &sets);
        assert_eq!(resolved[&day].text, "New Year");
        assert_eq!(resolved[&day].emoji, None);
    }

    #[test]
    fn test_holiday_map_takes_winning_set_emoji() {
        let day = date(2025, 10, 31);
        let sets = [
            set("B", &[(day, "Reformation Day", None)]),
            set("A", &[(day, "Halloween", Some("🎃"))]),
        ];
        let mut holiday_map = BTreeMap::new();
        holiday_map.insert(day, "Trick or Treat".to_string());

        let resolved = resolve(&BTreeMap::new(), &holiday_map, &sets);
        assert_eq!(resolved[&day].text, "Trick or Treat");
        assert_eq!(resolved[&day].emoji, None);

        let resolved = resolve(&BTreeMap::new(), &holiday_map, &[sets[1].clone(), sets[0].clone()]);
        assert_eq!(resolved[&day].emoji.as_deref(), Some("🎃"));
    }

    #[test]
    fn test_collect_sets_keeps_order_and_skips_unknown() {
        let ids = vec![
            "SECULAR".to_string(),
            "MARTIAN".to_string(),
            "US_FEDERAL".to_string(),
            "SECULAR".to_string(),
        ];
        let sets = collect_sets(&BuiltinHolidays, &ids, &[2025]);
        let order: Vec<_> = sets.iter().map(|s| s.set.as_str()).collect();
        assert_eq!(order, vec!["SECULAR", "US_FEDERAL"]);

        // Both define Jan 1; SECULAR is listed first.
        let resolved = resolve(&BTreeMap::new(), &BTreeMap::new(), &sets);
        assert_eq!(resolved[&date(2025, 1, 1)].text, "New Year");
    }
}
