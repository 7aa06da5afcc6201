//! Calendar Configuration - the single immutable input to every render
//!
//! Everything downstream is a pure function of this value. Parsing only
//! checks shape; semantic checks live in [`crate::validation`].

use chrono::{FixedOffset, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::glyphs::GlyphVariant;
use crate::themes::ThemeRegistry;
use crate::validation::{ValidationReport, Validator};

/// Oldest Gregorian year the engine renders.
pub const MIN_YEAR: i32 = 1900;
/// Newest Gregorian year the engine renders.
pub const MAX_YEAR: i32 = 2100;

#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Year {0} is outside the supported range {}..={}", MIN_YEAR, MAX_YEAR)]
    InvalidYear(i32),

    #[error("Malformed color for {field}: {value:?} is not a #RGB or #RRGGBB hex color")]
    MalformedColor { field: String, value: String },

    #[error("Unsupported layout: {0}")]
    UnsupportedLayout(String),

    #[error("Unknown theme: {0}")]
    UnknownTheme(String),

    #[error("Invalid location: {0}")]
    InvalidLocation(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid observation time: {0}")]
    InvalidObservationTime(String),

    #[error("Invalid moon geometry: {0}")]
    InvalidMoonGeometry(String),

    #[error("Malformed configuration: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalendarKind {
    Standard,
    /// Hebrew lunisolar months. `lunar` is accepted on input.
    #[serde(alias = "lunar")]
    Hebrew,
}

impl Default for CalendarKind {
    fn default() -> Self {
        Self::Standard
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutStyle {
    /// Uniform month matrix.
    Grid,
    /// One month per row, days in a single strip.
    Traditional,
}

impl Default for LayoutStyle {
    fn default() -> Self {
        Self::Grid
    }
}

impl FromStr for LayoutStyle {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "grid" => Ok(Self::Grid),
            "traditional" => Ok(Self::Traditional),
            other => Err(ConfigurationError::UnsupportedLayout(other.to_string())),
        }
    }
}

impl fmt::Display for LayoutStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutStyle::Grid => write!(f, "grid"),
            LayoutStyle::Traditional => write!(f, "traditional"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FirstDayOfWeek {
    Sunday,
    Monday,
    Saturday,
}

impl Default for FirstDayOfWeek {
    fn default() -> Self {
        Self::Sunday
    }
}

impl FirstDayOfWeek {
    pub fn weekday(self) -> Weekday {
        match self {
            FirstDayOfWeek::Sunday => Weekday::Sun,
            FirstDayOfWeek::Monday => Weekday::Mon,
            FirstDayOfWeek::Saturday => Weekday::Sat,
        }
    }

    /// Column (0..7) of `day` when weeks start on `self`.
    pub fn column_of(self, day: Weekday) -> u32 {
        (day.num_days_from_sunday() + 7 - self.weekday().num_days_from_sunday()) % 7
    }
}

/// Only changes glyph size, never which annotation wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventDisplay {
    Compact,
    Expanded,
}

impl Default for EventDisplay {
    fn default() -> Self {
        Self::Compact
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(default)]
pub struct DisplayFlags {
    pub show_moon_phases: bool,
    pub show_moon_illumination: bool,
    pub show_full_moon_only: bool,
    pub show_week_numbers: bool,
    pub compact_mode: bool,
    pub show_day_names: bool,
    pub show_day_numbers: bool,
    pub show_grid: bool,
    pub highlight_weekends: bool,
    pub rotate_month_names: bool,
}

impl Default for DisplayFlags {
    fn default() -> Self {
        Self {
            show_moon_phases: true,
            show_moon_illumination: false,
            show_full_moon_only: false,
            show_week_numbers: false,
            compact_mode: false,
            show_day_names: true,
            show_day_numbers: true,
            show_grid: true,
            highlight_weekends: true,
            rotate_month_names: false,
        }
    }
}

/// Per-element color overrides applied on top of the theme.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(default)]
pub struct ColorOverrides {
    pub year_text: Option<String>,
    pub month_text: Option<String>,
    pub day_text: Option<String>,
    pub grid_lines: Option<String>,
    pub weekend_background: Option<String>,
    pub holiday: Option<String>,
    pub custom_date: Option<String>,
    pub moon_light: Option<String>,
    pub moon_dark: Option<String>,
    pub moon_border: Option<String>,
}

impl ColorOverrides {
    /// Field name and value of every override that is set.
    pub fn entries(&self) -> Vec<(&'static str, &str)> {
        [
            ("yearText", &self.year_text),
            ("monthText", &self.month_text),
            ("dayText", &self.day_text),
            ("gridLines", &self.grid_lines),
            ("weekendBackground", &self.weekend_background),
            ("holiday", &self.holiday),
            ("customDate", &self.custom_date),
            ("moonLight", &self.moon_light),
            ("moonDark", &self.moon_dark),
            ("moonBorder", &self.moon_border),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.as_deref().map(|v| (name, v)))
        .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(default)]
pub struct MoonGlyphConfig {
    /// Radius in user units.
    pub size: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl Default for MoonGlyphConfig {
    fn default() -> Self {
        Self {
            size: 6.0,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }
}

/// A user-supplied annotation for one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomDate {
    pub text: String,
    #[serde(default)]
    pub emoji: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarConfig {
    #[serde(default)]
    pub calendar_kind: CalendarKind,
    pub year: i32,
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default)]
    pub layout_style: LayoutStyle,
    #[serde(default)]
    pub first_day_of_week: FirstDayOfWeek,
    #[serde(default = "default_locale")]
    pub locale: String,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default = "default_observation_time")]
    pub observation_time: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub flags: DisplayFlags,
    #[serde(default)]
    pub colors: ColorOverrides,
    #[serde(default)]
    pub moon: MoonGlyphConfig,
    #[serde(default)]
    pub holiday_sets: Vec<String>,
    #[serde(default)]
    pub custom_dates: BTreeMap<NaiveDate, CustomDate>,
    #[serde(default)]
    pub event_display: EventDisplay,
    #[serde(default)]
    pub glyph_variant: GlyphVariant,
}

fn default_theme() -> String { "default".to_string() }
fn default_locale() -> String { "en-US".to_string() }
fn default_timezone() -> String { "UTC".to_string() }
fn default_observation_time() -> String { "20:00".to_string() }

impl CalendarConfig {
    /// A configuration for `year` with every other field at its default.
    pub fn new(year: i32) -> Self {
        Self {
            calendar_kind: CalendarKind::default(),
            year,
            theme: default_theme(),
            layout_style: LayoutStyle::default(),
            first_day_of_week: FirstDayOfWeek::default(),
            locale: default_locale(),
            timezone: default_timezone(),
            observation_time: default_observation_time(),
            latitude: None,
            longitude: None,
            flags: DisplayFlags::default(),
            colors: ColorOverrides::default(),
            moon: MoonGlyphConfig::default(),
            holiday_sets: vec![],
            custom_dates: BTreeMap::new(),
            event_display: EventDisplay::default(),
            glyph_variant: GlyphVariant::default(),
        }
    }

    /// Parse a JSON configuration. Shape only; call [`CalendarConfig::validate`] next.
    pub fn from_json(json: &str) -> Result<Self, ConfigurationError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Run every configuration rule against the built-in holiday sets.
    pub fn validate(&self, themes: &ThemeRegistry) -> Result<ValidationReport, ConfigurationError> {
        Validator::new().validate(self, themes)
    }

    /// Hebrew year whose months a `hebrew` calendar lays out.
    pub fn hebrew_year(&self) -> i32 {
        self.year + 3760
    }

    pub fn location(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }

    pub fn parsed_observation_time(&self) -> Result<NaiveTime, ConfigurationError> {
        NaiveTime::parse_from_str(self.observation_time.trim(), "%H:%M")
            .map_err(|_| ConfigurationError::InvalidObservationTime(self.observation_time.clone()))
    }

    /// `Ok(None)` means local solar time derived from longitude.
    pub fn utc_offset(&self) -> Result<Option<FixedOffset>, ConfigurationError> {
        parse_timezone(&self.timezone)
    }

    /// Language subtag of the locale, lowercased (`"en"` for `"en-US"`).
    pub fn language(&self) -> String {
        self.locale
            .split(['-', '_'])
            .next()
            .unwrap_or("en")
            .to_ascii_lowercase()
    }

    /// Weekend days follow the locale, not the first day of the week.
    pub fn weekend_days(&self) -> [Weekday; 2] {
        match self.language().as_str() {
            "he" | "ar" | "fa" => [Weekday::Fri, Weekday::Sat],
            _ => [Weekday::Sat, Weekday::Sun],
        }
    }

    pub fn is_weekend(&self, day: Weekday) -> bool {
        self.weekend_days().contains(&day)
    }
}

/// Accepts `UTC`, `Z`, `GMT`, `solar`, or a fixed `±HH:MM` / `±HHMM` offset.
pub fn parse_timezone(tz: &str) -> Result<Option<FixedOffset>, ConfigurationError> {
    let trimmed = tz.trim();
    match trimmed.to_ascii_uppercase().as_str() {
        "UTC" | "Z" | "GMT" => return Ok(FixedOffset::east_opt(0)),
        "SOLAR" => return Ok(None),
        _ => {}
    }

    let invalid = || ConfigurationError::InvalidTimezone(tz.to_string());
    let (sign, rest) = match trimmed.chars().next() {
        Some('+') => (1, &trimmed[1..]),
        Some('-') => (-1, &trimmed[1..]),
        _ => return Err(invalid()),
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    let hours: i32 = digits[..2].parse().map_err(|_| invalid())?;
    let minutes: i32 = digits[2..].parse().map_err(|_| invalid())?;
    if hours > 14 || minutes > 59 {
        return Err(invalid());
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
        .map(Some)
        .ok_or_else(invalid)
}

/// `#RGB` or `#RRGGBB`.
pub fn is_hex_color(value: &str) -> bool {
    let Some(hex) = value.strip_prefix('#') else {
        return false;
    };
    matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit())
}
