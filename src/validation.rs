//! Validation System - Rule/Policy Separation
//!
//! Rules either reject a configuration outright (a [`ConfigurationError`])
//! or produce soft violations. The validator runs every rule before any
//! computation starts; the first hard failure wins.

use serde::{Deserialize, Serialize};

use crate::config::{is_hex_color, CalendarConfig, ConfigurationError, LayoutStyle, MAX_YEAR, MIN_YEAR};
use crate::holidays::BUILTIN_SETS;
use crate::themes::ThemeRegistry;

/// Latitude beyond which rise/set timing is not computed.
pub const POLAR_LATITUDE: f64 = 66.5;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ViolationSeverity {
    Warning,
    Info,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationViolation {
    pub rule: String,
    pub severity: ViolationSeverity,
    pub message: String,
    pub remediation: Vec<String>,
}

impl ValidationViolation {
    fn warning(rule: &str, message: impl Into<String>, remediation: &str) -> Self {
        Self {
            rule: rule.to_string(),
            severity: ViolationSeverity::Warning,
            message: message.into(),
            remediation: vec![remediation.to_string()],
        }
    }

    fn info(rule: &str, message: impl Into<String>) -> Self {
        Self {
            rule: rule.to_string(),
            severity: ViolationSeverity::Info,
            message: message.into(),
            remediation: vec![],
        }
    }
}

/// Outcome of a configuration that passed every hard rule.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    pub violations: Vec<ValidationViolation>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationViolation> {
        self.violations
            .iter()
            .filter(|v| v.severity == ViolationSeverity::Warning)
    }
}

/// Validation rule trait - rejects or annotates a configuration
pub trait ConfigRule {
    fn name(&self) -> &'static str;
    fn check(
        &self,
        config: &CalendarConfig,
        themes: &ThemeRegistry,
    ) -> Result<Vec<ValidationViolation>, ConfigurationError>;
}

// --- Concrete Rules ---

pub struct YearRangeRule;

impl ConfigRule for YearRangeRule {
    fn name(&self) -> &'static str { "year_range" }

    fn check(&self, config: &CalendarConfig, _: &ThemeRegistry) -> Result<Vec<ValidationViolation>, ConfigurationError> {
        if !(MIN_YEAR..=MAX_YEAR).contains(&config.year) {
            return Err(ConfigurationError::InvalidYear(config.year));
        }
        Ok(vec![])
    }
}

pub struct ThemeRule;

impl ConfigRule for ThemeRule {
    fn name(&self) -> &'static str { "theme" }

    fn check(&self, config: &CalendarConfig, themes: &ThemeRegistry) -> Result<Vec<ValidationViolation>, ConfigurationError> {
        match themes.get(&config.theme) {
            None => Err(ConfigurationError::UnknownTheme(config.theme.clone())),
            Some(theme) if theme.deprecated => Ok(vec![ValidationViolation::warning(
                self.name(),
                format!("Theme {} is deprecated", theme.id),
                "Pick a theme that is not deprecated",
            )]),
            Some(_) => Ok(vec![]),
        }
    }
}

pub struct ColorFormatRule;

impl ConfigRule for ColorFormatRule {
    fn name(&self) -> &'static str { "color_format" }

    fn check(&self, config: &CalendarConfig, _: &ThemeRegistry) -> Result<Vec<ValidationViolation>, ConfigurationError> {
        for (field, value) in config.colors.entries() {
            if !is_hex_color(value) {
                return Err(ConfigurationError::MalformedColor {
                    field: field.to_string(),
                    value: value.to_string(),
                });
            }
        }
        for (date, custom) in &config.custom_dates {
            if let Some(color) = &custom.color {
                if !is_hex_color(color) {
                    return Err(ConfigurationError::MalformedColor {
                        field: format!("customDates.{}", date),
                        value: color.clone(),
                    });
                }
            }
        }
        Ok(vec![])
    }
}

pub struct LocationRule;

impl ConfigRule for LocationRule {
    fn name(&self) -> &'static str { "location" }

    fn check(&self, config: &CalendarConfig, _: &ThemeRegistry) -> Result<Vec<ValidationViolation>, ConfigurationError> {
        let (lat, lon) = match (config.latitude, config.longitude) {
            (None, None) => return Ok(vec![]),
            (Some(lat), Some(lon)) => (lat, lon),
            _ => {
                return Err(ConfigurationError::InvalidLocation(
                    "latitude and longitude must be given together".to_string(),
                ))
            }
        };
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(ConfigurationError::InvalidLocation(format!("latitude {} out of range", lat)));
        }
        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return Err(ConfigurationError::InvalidLocation(format!("longitude {} out of range", lon)));
        }
        if lat.abs() > POLAR_LATITUDE {
            return Ok(vec![ValidationViolation::warning(
                self.name(),
                format!("Latitude {:.2} is polar; moon rise/set timing is unavailable", lat),
                "Phase and illumination are still computed",
            )]);
        }
        Ok(vec![])
    }
}

pub struct TimezoneRule;

impl ConfigRule for TimezoneRule {
    fn name(&self) -> &'static str { "timezone" }

    fn check(&self, config: &CalendarConfig, _: &ThemeRegistry) -> Result<Vec<ValidationViolation>, ConfigurationError> {
        config.utc_offset()?;
        Ok(vec![])
    }
}

pub struct ObservationTimeRule;

impl ConfigRule for ObservationTimeRule {
    fn name(&self) -> &'static str { "observation_time" }

    fn check(&self, config: &CalendarConfig, _: &ThemeRegistry) -> Result<Vec<ValidationViolation>, ConfigurationError> {
        config.parsed_observation_time()?;
        if config.location().is_none() && config.observation_time != "20:00" {
            return Ok(vec![ValidationViolation::info(
                self.name(),
                "Observation time only applies when a location is set; moon samples use UTC midnight",
            )]);
        }
        Ok(vec![])
    }
}

pub struct MoonGeometryRule;

impl ConfigRule for MoonGeometryRule {
    fn name(&self) -> &'static str { "moon_geometry" }

    fn check(&self, config: &CalendarConfig, _: &ThemeRegistry) -> Result<Vec<ValidationViolation>, ConfigurationError> {
        let moon = &config.moon;
        if !moon.size.is_finite() || !(2.0..=20.0).contains(&moon.size) {
            return Err(ConfigurationError::InvalidMoonGeometry(format!(
                "size {} must be between 2 and 20",
                moon.size
            )));
        }
        for (axis, offset) in [("x", moon.offset_x), ("y", moon.offset_y)] {
            if !offset.is_finite() || offset.abs() > 50.0 {
                return Err(ConfigurationError::InvalidMoonGeometry(format!(
                    "offset {} of {} exceeds 50",
                    axis, offset
                )));
            }
        }
        Ok(vec![])
    }
}

/// Unknown holiday set identifiers are skipped, not rejected.
pub struct HolidaySetRule {
    known: Vec<String>,
}

impl HolidaySetRule {
    pub fn new(known: Vec<String>) -> Self {
        Self { known }
    }
}

impl ConfigRule for HolidaySetRule {
    fn name(&self) -> &'static str { "holiday_sets" }

    fn check(&self, config: &CalendarConfig, _: &ThemeRegistry) -> Result<Vec<ValidationViolation>, ConfigurationError> {
        let mut violations = vec![];
        for (i, id) in config.holiday_sets.iter().enumerate() {
            if !self.known.iter().any(|k| k == id) {
                violations.push(ValidationViolation::warning(
                    self.name(),
                    format!("Unknown holiday set {}", id),
                    "The set is ignored during overlay resolution",
                ));
            } else if config.holiday_sets[..i].contains(id) {
                violations.push(ValidationViolation::info(
                    self.name(),
                    format!("Holiday set {} is listed more than once", id),
                ));
            }
        }
        Ok(violations)
    }
}

pub struct FlagConsistencyRule;

impl ConfigRule for FlagConsistencyRule {
    fn name(&self) -> &'static str { "flag_consistency" }

    fn check(&self, config: &CalendarConfig, _: &ThemeRegistry) -> Result<Vec<ValidationViolation>, ConfigurationError> {
        let flags = &config.flags;
        let mut violations = vec![];
        if !flags.show_moon_phases && (flags.show_full_moon_only || flags.show_moon_illumination) {
            violations.push(ValidationViolation::info(
                self.name(),
                "Moon options have no effect while showMoonPhases is off",
            ));
        }
        if flags.rotate_month_names && config.layout_style == LayoutStyle::Grid {
            violations.push(ValidationViolation::info(
                self.name(),
                "rotateMonthNames only applies to the traditional layout",
            ));
        }
        Ok(violations)
    }
}

/// Validator orchestrates rules
pub struct Validator {
    rules: Vec<Box<dyn ConfigRule + Send + Sync>>,
}

impl Validator {
    /// Validator that knows the built-in holiday sets.
    pub fn new() -> Self {
        Self::with_known_sets(BUILTIN_SETS.iter().map(|s| s.to_string()).collect())
    }

    pub fn with_known_sets(known_sets: Vec<String>) -> Self {
        Self {
            rules: vec![
                Box::new(YearRangeRule),
                Box::new(ThemeRule),
                Box::new(ColorFormatRule),
                Box::new(LocationRule),
                Box::new(TimezoneRule),
                Box::new(ObservationTimeRule),
                Box::new(MoonGeometryRule),
                Box::new(HolidaySetRule::new(known_sets)),
                Box::new(FlagConsistencyRule),
            ],
        }
    }

    pub fn validate(
        &self,
        config: &CalendarConfig,
        themes: &ThemeRegistry,
    ) -> Result<ValidationReport, ConfigurationError> {
        let mut report = ValidationReport::default();
        for rule in &self.rules {
            let violations = rule.check(config, themes).map_err(|e| {
                log::debug!("rule {} rejected configuration: {}", rule.name(), e);
                e
            })?;
            for v in &violations {
                log::warn!("{}: {}", v.rule, v.message);
            }
            report.violations.extend(violations);
        }
        Ok(report)
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CustomDate;
    use chrono::NaiveDate;

    fn validate(config: &CalendarConfig) -> Result<ValidationReport, ConfigurationError> {
        Validator::new().validate(config, &ThemeRegistry::builtin())
    }

    #[test]
    fn test_default_config_is_clean() {
        let report = validate(&CalendarConfig::new(2025)).unwrap();
        assert!(report.is_clean());
    }

    #[test]
    fn test_year_bounds() {
        assert!(validate(&CalendarConfig::new(1900)).is_ok());
        assert!(validate(&CalendarConfig::new(2100)).is_ok());
        assert!(matches!(
            validate(&CalendarConfig::new(1899)),
            Err(ConfigurationError::InvalidYear(1899))
        ));
        assert!(matches!(
            validate(&CalendarConfig::new(12025)),
            Err(ConfigurationError::InvalidYear(_))
        ));
    }

    #[test]
    fn test_malformed_override_color() {
        let mut config = CalendarConfig::new(2025);
        config.colors.grid_lines = Some("grey".to_string());
        match validate(&config) {
            Err(ConfigurationError::MalformedColor { field, value }) => {
                assert_eq!(field, "gridLines");
                assert_eq!(value, "grey");
            }
            other => panic!("expected MalformedColor, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_custom_date_color() {
        let mut config = CalendarConfig::new(2025);
        config.custom_dates.insert(
            NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
            CustomDate { text: "Launch".into(), emoji: None, color: Some("#12".into()) },
        );
        assert!(matches!(
            validate(&config),
            Err(ConfigurationError::MalformedColor { .. })
        ));
    }

    #[test]
    fn test_location_rules() {
        let mut config = CalendarConfig::new(2025);
        config.latitude = Some(40.7);
        assert!(matches!(validate(&config), Err(ConfigurationError::InvalidLocation(_))));

        config.longitude = Some(-74.0);
        assert!(validate(&config).unwrap().is_clean());

        config.latitude = Some(95.0);
        assert!(matches!(validate(&config), Err(ConfigurationError::InvalidLocation(_))));

        config.latitude = Some(78.2);
        let report = validate(&config).unwrap();
        assert_eq!(report.warnings().count(), 1);
    }

    #[test]
    fn test_unknown_holiday_set_is_a_warning() {
        let mut config = CalendarConfig::new(2025);
        config.holiday_sets = vec!["US_FEDERAL".into(), "MARTIAN".into()];
        let report = validate(&config).unwrap();
        let warnings: Vec<_> = report.warnings().collect();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("MARTIAN"));
    }

    #[test]
    fn test_moon_geometry() {
        let mut config = CalendarConfig::new(2025);
        config.moon.size = 40.0;
        assert!(matches!(validate(&config), Err(ConfigurationError::InvalidMoonGeometry(_))));
        config.moon.size = 8.0;
        config.moon.offset_y = f64::NAN;
        assert!(matches!(validate(&config), Err(ConfigurationError::InvalidMoonGeometry(_))));
    }

    #[test]
    fn test_flag_consistency_is_informational() {
        let mut config = CalendarConfig::new(2025);
        config.flags.show_moon_phases = false;
        config.flags.show_full_moon_only = true;
        config.flags.rotate_month_names = true;
        let report = validate(&config).unwrap();
        assert_eq!(report.violations.len(), 2);
        assert_eq!(report.warnings().count(), 0);
    }
}
