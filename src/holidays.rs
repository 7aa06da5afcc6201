//! Holiday sets
//!
//! The engine never fetches holiday data; a [`HolidayProvider`] hands it
//! definitions per (set, year). [`BuiltinHolidays`] covers the sets the
//! engine ships with.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::hebrew;

pub const US_FEDERAL: &str = "US_FEDERAL";
pub const CHRISTIAN: &str = "CHRISTIAN";
pub const SECULAR: &str = "SECULAR";
pub const HEBREW_RELIGIOUS: &str = "HEBREW_RELIGIOUS";

/// Identifiers [`BuiltinHolidays`] answers for.
pub const BUILTIN_SETS: [&str; 4] = [US_FEDERAL, CHRISTIAN, SECULAR, HEBREW_RELIGIOUS];

/// One holiday as a set defines it. Several definitions may share a date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolidayDefinition {
    pub date: NaiveDate,
    pub name: String,
    pub set: String,
    #[serde(default)]
    pub emoji: Option<String>,
}

impl HolidayDefinition {
    pub fn new(date: NaiveDate, name: &str, set: &str, emoji: Option<&str>) -> Self {
        Self {
            date,
            name: name.to_string(),
            set: set.to_string(),
            emoji: emoji.map(str::to_string),
        }
    }
}

/// Source of holiday definitions, keyed by set identifier and Gregorian year.
pub trait HolidayProvider: Send + Sync {
    fn known_sets(&self) -> Vec<String>;

    /// `None` when the provider does not know `set`.
    fn holidays(&self, set: &str, year: i32) -> Option<Vec<HolidayDefinition>>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinHolidays;

impl HolidayProvider for BuiltinHolidays {
    fn known_sets(&self) -> Vec<String> {
        BUILTIN_SETS.iter().map(|s| s.to_string()).collect()
    }

    fn holidays(&self, set: &str, year: i32) -> Option<Vec<HolidayDefinition>> {
        let defs = match set {
            US_FEDERAL => us_federal(year),
            CHRISTIAN => christian(year),
            SECULAR => secular(year),
            HEBREW_RELIGIOUS => hebrew_religious(year),
            _ => return None,
        };
        Some(defs)
    }
}

/// `n`th (1-based) `weekday` of a month.
fn nth_weekday(year: i32, month: u32, weekday: Weekday, n: u8) -> Option<NaiveDate> {
    NaiveDate::from_weekday_of_month_opt(year, month, weekday, n)
}

fn last_weekday(year: i32, month: u32, weekday: Weekday) -> Option<NaiveDate> {
    let first_of_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    let last = first_of_next.pred_opt()?;
    let back = (7 + last.weekday().num_days_from_monday() - weekday.num_days_from_monday()) % 7;
    last.checked_sub_signed(Duration::days(i64::from(back)))
}

/// Gregorian Easter Sunday (Oudin, 1940).
pub fn easter_sunday(year: i32) -> Option<NaiveDate> {
    if year < 1583 {
        return None;
    }
    let y = year;
    let c = y / 100;
    let n = y - 19 * (y / 19);
    let k = (c - 17) / 25;
    let mut i = c - (c / 4) - ((c - k) / 3) + 19 * n + 15;

    i -= 30 * (i / 30);
    i -= (i / 28) * (1 - (i / 28) * (29 / (i + 1)) * ((21 - n) / 11));

    let mut j = y + (y / 4) + i + 2 - c + (c / 4);
    j -= 7 * (j / 7);

    let l = i - j;
    let m = 3 + ((l + 40) / 44);
    let d = l + 28 - 31 * (m / 4);

    NaiveDate::from_ymd_opt(y, m as u32, d as u32)
}

fn collect(set: &str, entries: Vec<(Option<NaiveDate>, &str, Option<&str>)>) -> Vec<HolidayDefinition> {
    entries
        .into_iter()
        .filter_map(|(date, name, emoji)| date.map(|d| HolidayDefinition::new(d, name, set, emoji)))
        .collect()
}

fn us_federal(year: i32) -> Vec<HolidayDefinition> {
    let ymd = |m, d| NaiveDate::from_ymd_opt(year, m, d);
    collect(
        US_FEDERAL,
        vec![
            (ymd(1, 1), "New Year's Day", Some("🎉")),
            (nth_weekday(year, 1, Weekday::Mon, 3), "Martin Luther King Jr. Day", None),
            (nth_weekday(year, 2, Weekday::Mon, 3), "Presidents' Day", None),
            (last_weekday(year, 5, Weekday::Mon), "Memorial Day", Some("🇺🇸")),
            (ymd(6, 19), "Juneteenth", None),
            (ymd(7, 4), "Independence Day", Some("🎆")),
            (nth_weekday(year, 9, Weekday::Mon, 1), "Labor Day", None),
            (nth_weekday(year, 10, Weekday::Mon, 2), "Columbus Day", None),
            (ymd(11, 11), "Veterans Day", Some("🇺🇸")),
            (nth_weekday(year, 11, Weekday::Thu, 4), "Thanksgiving", Some("🦃")),
            (ymd(12, 25), "Christmas Day", Some("🎄")),
        ],
    )
}

fn christian(year: i32) -> Vec<HolidayDefinition> {
    let ymd = |m, d| NaiveDate::from_ymd_opt(year, m, d);
    let easter = easter_sunday(year);
    let from_easter = |days: i64| easter.and_then(|e| e.checked_add_signed(Duration::days(days)));
    collect(
        CHRISTIAN,
        vec![
            (ymd(1, 6), "Epiphany", Some("⭐")),
            (from_easter(-46), "Ash Wednesday", None),
            (from_easter(-7), "Palm Sunday", None),
            (from_easter(-2), "Good Friday", Some("✝")),
            (easter, "Easter", Some("🐣")),
            (from_easter(39), "Ascension Day", None),
            (from_easter(49), "Pentecost", Some("🕊")),
            (ymd(11, 1), "All Saints' Day", None),
            (ymd(12, 24), "Christmas Eve", Some("⭐")),
            (ymd(12, 25), "Christmas", Some("🎄")),
        ],
    )
}

fn secular(year: i32) -> Vec<HolidayDefinition> {
    let ymd = |m, d| NaiveDate::from_ymd_opt(year, m, d);
    collect(
        SECULAR,
        vec![
            (ymd(1, 1), "New Year", Some("🎉")),
            (ymd(2, 14), "Valentine's Day", Some("❤")),
            (ymd(3, 17), "St. Patrick's Day", Some("🍀")),
            (ymd(4, 1), "April Fools' Day", None),
            (ymd(4, 22), "Earth Day", Some("🌍")),
            (ymd(4, 29), "International Dance Day", Some("💃")),
            (nth_weekday(year, 5, Weekday::Sun, 2), "Mother's Day", Some("💐")),
            (nth_weekday(year, 6, Weekday::Sun, 3), "Father's Day", None),
            (ymd(10, 31), "Halloween", Some("🎃")),
            (ymd(12, 31), "New Year's Eve", Some("🥂")),
        ],
    )
}

fn hebrew_religious(year: i32) -> Vec<HolidayDefinition> {
    hebrew::year_mapping(year)
        .into_iter()
        .filter_map(|mapping| {
            let name = mapping.holiday?;
            let emoji = hebrew::HEBREW_HOLIDAYS
                .iter()
                .find(|h| h.name == name)
                .and_then(|h| h.emoji);
            Some(HolidayDefinition::new(mapping.gregorian, &name, HEBREW_RELIGIOUS, emoji))
        })
        .collect()
}

/// Hebrew observances placed on already paired dates, so each holiday lands
/// on the day whose Hebrew date it names.
pub fn hebrew_religious_on(days: &[(NaiveDate, hebrew::HebrewDate)]) -> Vec<HolidayDefinition> {
    days.iter()
        .filter_map(|(date, h)| {
            let holiday = hebrew::holiday_for(h)?;
            Some(HolidayDefinition::new(*date, holiday.name, HEBREW_RELIGIOUS, holiday.emoji))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn find(defs: &[HolidayDefinition], name: &str) -> NaiveDate {
        defs.iter().find(|d| d.name == name).unwrap().date
    }

    #[test]
    fn test_easter_dates() {
        assert_eq!(easter_sunday(2024), Some(date(2024, 3, 31)));
        assert_eq!(easter_sunday(2025), Some(date(2025, 4, 20)));
        assert_eq!(easter_sunday(2000), Some(date(2000, 4, 23)));
        assert_eq!(easter_sunday(1500), None);
    }

    #[test]
    fn test_us_federal_2025() {
        let defs = BuiltinHolidays.holidays(US_FEDERAL, 2025).unwrap();
        assert_eq!(find(&defs, "Thanksgiving"), date(2025, 11, 27));
        assert_eq!(find(&defs, "Memorial Day"), date(2025, 5, 26));
        assert_eq!(find(&defs, "Labor Day"), date(2025, 9, 1));
        assert_eq!(find(&defs, "Martin Luther King Jr. Day"), date(2025, 1, 20));
        assert!(defs.iter().all(|d| d.set == US_FEDERAL));
    }

    #[test]
    fn test_movable_christian_feasts() {
        let defs = BuiltinHolidays.holidays(CHRISTIAN, 2025).unwrap();
        assert_eq!(find(&defs, "Ash Wednesday"), date(2025, 3, 5));
        assert_eq!(find(&defs, "Good Friday"), date(2025, 4, 18));
        assert_eq!(find(&defs, "Pentecost"), date(2025, 6, 8));
    }

    #[test]
    fn test_last_weekday_in_december() {
        assert_eq!(last_weekday(2025, 12, Weekday::Wed), Some(date(2025, 12, 31)));
        assert_eq!(last_weekday(2025, 12, Weekday::Mon), Some(date(2025, 12, 29)));
    }

    #[test]
    fn test_hebrew_set_uses_converter() {
        let defs = BuiltinHolidays.holidays(HEBREW_RELIGIOUS, 2025).unwrap();
        assert!(!defs.is_empty());
        let yom_kippur = defs.iter().find(|d| d.name == "Yom Kippur").unwrap();
        assert_eq!(yom_kippur.date, date(2025, 9, 10));
        assert_eq!(yom_kippur.emoji.as_deref(), Some("🙏"));
    }

    #[test]
    fn test_unknown_set() {
        assert!(BuiltinHolidays.holidays("MARTIAN", 2025).is_none());
        assert_eq!(BuiltinHolidays.known_sets().len(), 4);
    }
}
