//! Hebrew Calendar Converter
//!
//! **Approximation notice.** This is an engineering approximation, not the
//! rabbinic calendar. Leap years follow the Metonic formula exactly, but
//! the lengths of Cheshvan and Kislev come from a `year mod 10` heuristic
//! and Gregorian dates map linearly from a fixed new-year anchor of
//! 1 September. Expect day-level (sometimes multi-week) disagreement with
//! published calendars, and note that the mapping is not invertible: a
//! Hebrew date converted to Gregorian and back may land on a different day.
//!
//! Months are numbered civil-style, Tishrei = 1. In leap years Adar I and
//! Adar II take slots 6 and 7 and Nisan moves to 8.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Added to the Gregorian year for dates from September on.
pub const YEAR_OFFSET_AFTER_NEW_YEAR: i32 = 3761;
/// Added to the Gregorian year for dates before September.
pub const YEAR_OFFSET_BEFORE_NEW_YEAR: i32 = 3760;
/// Gregorian month in which the modelled Hebrew year begins.
const NEW_YEAR_MONTH: u32 = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HebrewMonth {
    Tishrei,
    Cheshvan,
    Kislev,
    Tevet,
    Shevat,
    /// Adar of a common year.
    Adar,
    AdarI,
    AdarII,
    Nisan,
    Iyar,
    Sivan,
    Tammuz,
    Av,
    Elul,
}

const COMMON_MONTHS: [HebrewMonth; 12] = [
    HebrewMonth::Tishrei,
    HebrewMonth::Cheshvan,
    HebrewMonth::Kislev,
    HebrewMonth::Tevet,
    HebrewMonth::Shevat,
    HebrewMonth::Adar,
    HebrewMonth::Nisan,
    HebrewMonth::Iyar,
    HebrewMonth::Sivan,
    HebrewMonth::Tammuz,
    HebrewMonth::Av,
    HebrewMonth::Elul,
];

const LEAP_MONTHS: [HebrewMonth; 13] = [
    HebrewMonth::Tishrei,
    HebrewMonth::Cheshvan,
    HebrewMonth::Kislev,
    HebrewMonth::Tevet,
    HebrewMonth::Shevat,
    HebrewMonth::AdarI,
    HebrewMonth::AdarII,
    HebrewMonth::Nisan,
    HebrewMonth::Iyar,
    HebrewMonth::Sivan,
    HebrewMonth::Tammuz,
    HebrewMonth::Av,
    HebrewMonth::Elul,
];

impl HebrewMonth {
    pub fn name(self) -> &'static str {
        match self {
            HebrewMonth::Tishrei => "Tishrei",
            HebrewMonth::Cheshvan => "Cheshvan",
            HebrewMonth::Kislev => "Kislev",
            HebrewMonth::Tevet => "Tevet",
            HebrewMonth::Shevat => "Shevat",
            HebrewMonth::Adar => "Adar",
            HebrewMonth::AdarI => "Adar I",
            HebrewMonth::AdarII => "Adar II",
            HebrewMonth::Nisan => "Nisan",
            HebrewMonth::Iyar => "Iyar",
            HebrewMonth::Sivan => "Sivan",
            HebrewMonth::Tammuz => "Tammuz",
            HebrewMonth::Av => "Av",
            HebrewMonth::Elul => "Elul",
        }
    }

    /// Month at 1-based `slot` of `year`.
    pub fn from_number(slot: u32, year: i32) -> Option<Self> {
        let index = usize::try_from(slot.checked_sub(1)?).ok()?;
        months_of_year(year).get(index).copied()
    }

    /// 1-based slot of this month in `year`, if the month exists that year.
    pub fn number(self, year: i32) -> Option<u32> {
        months_of_year(year)
            .iter()
            .position(|m| *m == self)
            .map(|i| i as u32 + 1)
    }

    /// Adar II is where a common year's Adar observances fall in a leap year.
    fn observance_month(self) -> Self {
        match self {
            HebrewMonth::AdarII => HebrewMonth::Adar,
            other => other,
        }
    }
}

/// Metonic cycle: positions 3, 6, 8, 11, 14, 17 and 19 are leap years.
pub fn is_leap_year(year: i32) -> bool {
    (7 * i64::from(year) + 1).rem_euclid(19) < 7
}

pub fn months_in_year(year: i32) -> u32 {
    if is_leap_year(year) { 13 } else { 12 }
}

/// Months of `year` in order, Tishrei first.
pub fn months_of_year(year: i32) -> &'static [HebrewMonth] {
    if is_leap_year(year) { &LEAP_MONTHS } else { &COMMON_MONTHS }
}

/// Name of the month at `slot` (1-based), with Adar I / Adar II only in leap years.
pub fn month_name(slot: u32, year: i32) -> Option<&'static str> {
    HebrewMonth::from_number(slot, year).map(HebrewMonth::name)
}

/// Heuristic length class steering Cheshvan and Kislev.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YearCharacter {
    /// Cheshvan 29, Kislev 29.
    Deficient,
    /// Cheshvan 29, Kislev 30.
    Regular,
    /// Cheshvan 30, Kislev 30.
    Complete,
}

pub fn year_character(year: i32) -> YearCharacter {
    match year.rem_euclid(10) {
        0 | 3 | 7 => YearCharacter::Deficient,
        1 | 5 | 8 => YearCharacter::Complete,
        _ => YearCharacter::Regular,
    }
}

/// Days in `month` of `year`; `None` if that month does not occur in `year`
/// (Adar I/II in a common year, plain Adar in a leap year).
pub fn days_in_month(month: HebrewMonth, year: i32) -> Option<u32> {
    month.number(year)?;
    let days = match month {
        HebrewMonth::Cheshvan => match year_character(year) {
            YearCharacter::Complete => 30,
            _ => 29,
        },
        HebrewMonth::Kislev => match year_character(year) {
            YearCharacter::Deficient => 29,
            _ => 30,
        },
        HebrewMonth::Tishrei
        | HebrewMonth::Shevat
        | HebrewMonth::AdarI
        | HebrewMonth::Nisan
        | HebrewMonth::Sivan
        | HebrewMonth::Av => 30,
        HebrewMonth::Tevet
        | HebrewMonth::Adar
        | HebrewMonth::AdarII
        | HebrewMonth::Iyar
        | HebrewMonth::Tammuz
        | HebrewMonth::Elul => 29,
    };
    Some(days)
}

pub fn days_in_year(year: i32) -> u32 {
    months_of_year(year)
        .iter()
        .filter_map(|m| days_in_month(*m, year))
        .sum()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HebrewDate {
    pub year: i32,
    pub month: HebrewMonth,
    pub day: u32,
}

impl fmt::Display for HebrewDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.day, self.month.name(), self.year)
    }
}

/// Gregorian date the model treats as 1 Tishrei of `year`.
pub fn new_year_anchor(year: i32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year - YEAR_OFFSET_AFTER_NEW_YEAR, NEW_YEAR_MONTH, 1)
}

/// Approximate Hebrew date for a Gregorian date.
///
/// Days past the modelled end of the year clamp to the last day of Elul.
pub fn gregorian_to_hebrew(date: NaiveDate) -> Option<HebrewDate> {
    let offset = if date.month() >= NEW_YEAR_MONTH {
        YEAR_OFFSET_AFTER_NEW_YEAR
    } else {
        YEAR_OFFSET_BEFORE_NEW_YEAR
    };
    let year = date.year() + offset;
    let anchor = new_year_anchor(year)?;
    let mut remaining = u32::try_from((date - anchor).num_days()).ok()?;

    for month in months_of_year(year) {
        let len = days_in_month(*month, year)?;
        if remaining < len {
            return Some(HebrewDate { year, month: *month, day: remaining + 1 });
        }
        remaining -= len;
    }

    Some(HebrewDate {
        year,
        month: HebrewMonth::Elul,
        day: days_in_month(HebrewMonth::Elul, year)?,
    })
}

/// Approximate inverse of [`gregorian_to_hebrew`]. `None` for dates that do
/// not exist in the model.
pub fn hebrew_to_gregorian(date: &HebrewDate) -> Option<NaiveDate> {
    let len = days_in_month(date.month, date.year)?;
    if date.day == 0 || date.day > len {
        return None;
    }
    let before: u32 = months_of_year(date.year)
        .iter()
        .take_while(|m| **m != date.month)
        .filter_map(|m| days_in_month(*m, date.year))
        .sum();
    new_year_anchor(date.year)?.checked_add_signed(Duration::days(i64::from(before + date.day - 1)))
}

/// A holiday defined on the Hebrew calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HebrewHoliday {
    pub month: HebrewMonth,
    pub day: u32,
    pub name: &'static str,
    pub emoji: Option<&'static str>,
}

const fn holiday(month: HebrewMonth, day: u32, name: &'static str, emoji: Option<&'static str>) -> HebrewHoliday {
    HebrewHoliday { month, day, name, emoji }
}

/// Observances on the model calendar. Adar entries fall in Adar II in leap years.
pub static HEBREW_HOLIDAYS: &[HebrewHoliday] = &[
    holiday(HebrewMonth::Tishrei, 1, "Rosh Hashanah", Some("🍎")),
    holiday(HebrewMonth::Tishrei, 10, "Yom Kippur", Some("🙏")),
    holiday(HebrewMonth::Tishrei, 15, "Sukkot", Some("🌿")),
    holiday(HebrewMonth::Tishrei, 22, "Shemini Atzeret", None),
    holiday(HebrewMonth::Tishrei, 23, "Simchat Torah", Some("📜")),
    holiday(HebrewMonth::Kislev, 25, "Hanukkah", Some("🕎")),
    holiday(HebrewMonth::Shevat, 15, "Tu BiShvat", Some("🌳")),
    holiday(HebrewMonth::Adar, 14, "Purim", Some("🎭")),
    holiday(HebrewMonth::Nisan, 15, "Passover", Some("🍷")),
    holiday(HebrewMonth::Nisan, 27, "Yom HaShoah", Some("🕯")),
    holiday(HebrewMonth::Iyar, 18, "Lag BaOmer", Some("🔥")),
    holiday(HebrewMonth::Sivan, 6, "Shavuot", Some("🌾")),
    holiday(HebrewMonth::Av, 9, "Tisha B'Av", None),
];

pub fn holiday_for(date: &HebrewDate) -> Option<&'static HebrewHoliday> {
    let month = date.month.observance_month();
    HEBREW_HOLIDAYS
        .iter()
        .find(|h| h.month == month && h.day == date.day)
}

/// One entry per Gregorian day, for overlays only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HebrewDateMapping {
    pub gregorian: NaiveDate,
    pub hebrew: String,
    pub holiday: Option<String>,
}

/// Hebrew date string (and holiday, if any) for every day of a Gregorian year.
pub fn year_mapping(gregorian_year: i32) -> Vec<HebrewDateMapping> {
    let Some(first) = NaiveDate::from_ymd_opt(gregorian_year, 1, 1) else {
        return vec![];
    };
    first
        .iter_days()
        .take_while(|d| d.year() == gregorian_year)
        .filter_map(|d| {
            let hebrew = gregorian_to_hebrew(d)?;
            Some(HebrewDateMapping {
                gregorian: d,
                hebrew: hebrew.to_string(),
                holiday: holiday_for(&hebrew).map(|h| h.name.to_string()),
            })
        })
        .collect()
}

/// Every (Gregorian date, Hebrew date) pair of a Hebrew year, in order.
pub fn days_of_year(year: i32) -> Vec<(NaiveDate, HebrewDate)> {
    months_of_year(year)
        .iter()
        .flat_map(|month| {
            let len = days_in_month(*month, year).unwrap_or(0);
            (1..=len).map(move |day| HebrewDate { year, month: *month, day })
        })
        .filter_map(|h| hebrew_to_gregorian(&h).map(|g| (g, h)))
        .collect()
}
