//! Rendering Pipeline - Single Entry Point
//!
//! CRITICAL: every render goes through `validate` first. No bypass.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::astro::Observer;
use crate::config::{CalendarConfig, CalendarKind, ConfigurationError};
use crate::glyphs::{self, GlyphProvider};
use crate::hashing::{config_fingerprint, sha256_hex};
use crate::hebrew;
use crate::holidays::{self, BuiltinHolidays, HolidayProvider, HEBREW_RELIGIOUS};
use crate::layout::{compute_layout, CalendarLayout};
use crate::overlay::{self, HolidaySetEntries};
use crate::print::{render_print_document_with, PrintDocument, PrintSpec, RenderingError};
use crate::svg::{render_markup, VectorDocument};
use crate::themes::{builtin_registry, ThemeRegistry};
use crate::validation::{ValidationReport, Validator};
use crate::ENGINE_VERSION;

#[cfg(feature = "test-hooks")]
use std::sync::atomic::{AtomicU32, Ordering};

#[cfg(feature = "test-hooks")]
static VALIDATION_CALL_COUNT: AtomicU32 = AtomicU32::new(0);

#[cfg(feature = "test-hooks")]
pub fn get_validation_call_count() -> u32 {
    VALIDATION_CALL_COUNT.load(Ordering::SeqCst)
}

#[cfg(feature = "test-hooks")]
pub fn reset_validation_call_count() {
    VALIDATION_CALL_COUNT.store(0, Ordering::SeqCst);
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Rendering(#[from] RenderingError),
}

/// Stable fingerprints of one render. No timestamps: rendering the same
/// configuration twice yields the same manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderManifest {
    pub engine_version: String,
    pub config_hash: String,
    pub markup_hash: String,
    #[serde(default)]
    pub print_hash: Option<String>,
    pub month_count: usize,
}

/// Vector and print output of one configuration.
#[derive(Debug, Clone)]
pub struct RenderedCalendar {
    pub vector: VectorDocument,
    pub print: PrintDocument,
    pub manifest: RenderManifest,
}

/// The rendering pipeline, with its collaborators passed in explicitly.
pub struct CalendarEngine<'a> {
    themes: &'a ThemeRegistry,
    holidays: &'a dyn HolidayProvider,
    glyphs: &'a dyn GlyphProvider,
    validator: Validator,
}

impl<'a> CalendarEngine<'a> {
    pub fn new(themes: &'a ThemeRegistry, holidays: &'a dyn HolidayProvider, glyphs: &'a dyn GlyphProvider) -> Self {
        Self {
            themes,
            holidays,
            glyphs,
            validator: Validator::with_known_sets(holidays.known_sets()),
        }
    }

    pub fn themes(&self) -> &ThemeRegistry {
        self.themes
    }

    /// Validate a configuration
    ///
    /// This is the ONLY validation entry point.
    pub fn validate(&self, config: &CalendarConfig) -> Result<ValidationReport, ConfigurationError> {
        #[cfg(feature = "test-hooks")]
        VALIDATION_CALL_COUNT.fetch_add(1, Ordering::SeqCst);

        self.validator.validate(config, self.themes)
    }

    /// Validate, resolve overlays and lay out every month.
    ///
    /// `holiday_map` comes from the caller's holiday-data provider and wins
    /// over holiday sets on the same day.
    pub fn layout(
        &self,
        config: &CalendarConfig,
        holiday_map: &BTreeMap<NaiveDate, String>,
    ) -> Result<CalendarLayout, ConfigurationError> {
        // MANDATORY: Validation is always called. This is non-negotiable.
        self.validate(config)?;

        let scheme = self.themes.resolve_scheme(config)?;
        let observer = Observer::from_config(config)?;
        let mut sets = overlay::collect_sets(self.holidays, &config.holiday_sets, &overlay_years(config));
        if config.calendar_kind == CalendarKind::Hebrew {
            anchor_hebrew_observances(&mut sets, config.hebrew_year());
        }
        let annotations = overlay::resolve(&config.custom_dates, holiday_map, &sets);
        log::debug!("{} annotated days for {}", annotations.len(), config.year);

        Ok(compute_layout(config, &scheme, &annotations, observer.as_ref()))
    }

    /// Render the vector document.
    pub fn render_vector(
        &self,
        config: &CalendarConfig,
        holiday_map: &BTreeMap<NaiveDate, String>,
    ) -> Result<VectorDocument, ConfigurationError> {
        let layout = self.layout(config, holiday_map)?;
        let document = render_markup(&layout, config, self.glyphs);
        log::info!(
            "rendered {} vector calendar for {}: {} months, {} bytes",
            config.layout_style,
            config.year,
            document.month_group_count(),
            document.as_bytes().len()
        );
        Ok(document)
    }

    /// Render the vector document, convert it to print, and fingerprint both.
    pub fn render_print(
        &self,
        config: &CalendarConfig,
        holiday_map: &BTreeMap<NaiveDate, String>,
        spec: &PrintSpec,
    ) -> Result<RenderedCalendar, EngineError> {
        let vector = self.render_vector(config, holiday_map)?;
        let print = render_print_document_with(&vector, spec)?;
        let mut manifest = self.manifest(config, &vector)?;
        manifest.print_hash = Some(sha256_hex(print.as_bytes()));
        Ok(RenderedCalendar { vector, print, manifest })
    }

    /// Manifest for a vector-only render.
    pub fn manifest(&self, config: &CalendarConfig, vector: &VectorDocument) -> Result<RenderManifest, ConfigurationError> {
        Ok(RenderManifest {
            engine_version: ENGINE_VERSION.to_string(),
            config_hash: config_fingerprint(config, ENGINE_VERSION)?,
            markup_hash: sha256_hex(vector.as_bytes()),
            print_hash: None,
            month_count: vector.month_group_count(),
        })
    }
}

impl CalendarEngine<'static> {
    /// Built-in themes, holiday sets and glyphs.
    pub fn builtin() -> Self {
        Self::new(builtin_registry(), &BuiltinHolidays, glyphs::builtin())
    }
}

impl Default for CalendarEngine<'static> {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Gregorian years the laid-out days fall in.
fn overlay_years(config: &CalendarConfig) -> Vec<i32> {
    match config.calendar_kind {
        CalendarKind::Standard => vec![config.year],
        CalendarKind::Hebrew => {
            let days = hebrew::days_of_year(config.hebrew_year());
            let mut years: Vec<i32> = days.iter().map(|(d, _)| d.year()).collect();
            years.dedup();
            years
        }
    }
}

/// A Hebrew-kind layout pairs every cell with its own Hebrew date. The
/// Gregorian-year mapping can disagree near Elul/Tishrei, so Hebrew
/// observances are re-placed on the laid-out pairs.
fn anchor_hebrew_observances(sets: &mut [HolidaySetEntries], hebrew_year: i32) {
    let days = hebrew::days_of_year(hebrew_year);
    for entries in sets.iter_mut().filter(|s| s.set == HEBREW_RELIGIOUS) {
        entries.definitions = holidays::hebrew_religious_on(&days);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CustomDate;
    use crate::holidays::{HolidayDefinition, SECULAR, US_FEDERAL};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    struct OneDayProvider;

    impl HolidayProvider for OneDayProvider {
        fn known_sets(&self) -> Vec<String> {
            vec!["LOCAL".to_string()]
        }

        fn holidays(&self, set: &str, year: i32) -> Option<Vec<HolidayDefinition>> {
            (set == "LOCAL").then(|| {
                vec![HolidayDefinition::new(date(year, 5, 5), "Town Fair", "LOCAL", Some("🎉"))]
            })
        }
    }

    #[test]
    fn test_invalid_year_rejected_before_rendering() {
        let engine = CalendarEngine::builtin();
        let err = engine.render_vector(&CalendarConfig::new(1850), &BTreeMap::new()).unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidYear(1850)));
    }

    #[test]
    fn test_malformed_color_rejected() {
        let mut config = CalendarConfig::new(2025);
        config.colors.holiday = Some("red".into());
        let err = CalendarEngine::builtin().render_vector(&config, &BTreeMap::new()).unwrap_err();
        assert!(matches!(err, ConfigurationError::MalformedColor { .. }));
    }

    #[test]
    fn test_holiday_map_beats_sets() {
        let mut config = CalendarConfig::new(2025);
        config.holiday_sets = vec![US_FEDERAL.into(), SECULAR.into()];
        let mut holiday_map = BTreeMap::new();
        holiday_map.insert(date(2025, 7, 4), "Fourth".to_string());

        let layout = CalendarEngine::builtin().layout(&config, &holiday_map).unwrap();
        let july_4 = layout.cells().find(|c| c.date == date(2025, 7, 4)).unwrap();
        assert_eq!(july_4.annotation.as_ref().unwrap().text, "Fourth");
        let jan_1 = layout.cells().find(|c| c.date == date(2025, 1, 1)).unwrap();
        assert_eq!(jan_1.annotation.as_ref().unwrap().text, "New Year's Day");
    }

    #[test]
    fn test_custom_provider() {
        let themes = ThemeRegistry::builtin();
        let engine = CalendarEngine::new(&themes, &OneDayProvider, glyphs::builtin());
        let mut config = CalendarConfig::new(2025);
        config.holiday_sets = vec!["LOCAL".into()];
        config.custom_dates.insert(
            date(2025, 5, 6),
            CustomDate { text: "Cleanup".into(), emoji: None, color: None },
        );
        let doc = engine.render_vector(&config, &BTreeMap::new()).unwrap();
        assert!(doc.as_str().contains("Town Fair"));
        assert!(doc.as_str().contains("glyph-party-popper-color"));
        assert!(doc.as_str().contains("Cleanup"));
    }

    #[test]
    fn test_manifest_is_stable() {
        let engine = CalendarEngine::builtin();
        let config = CalendarConfig::new(2025);
        let a = engine.render_vector(&config, &BTreeMap::new()).unwrap();
        let b = engine.render_vector(&config, &BTreeMap::new()).unwrap();
        let ma = engine.manifest(&config, &a).unwrap();
        let mb = engine.manifest(&config, &b).unwrap();
        assert_eq!(ma, mb);
        assert_eq!(ma.month_count, 12);
        assert_eq!(ma.engine_version, ENGINE_VERSION);
    }

    #[test]
    fn test_hebrew_observances_match_cell_dates_in_leap_years() {
        for hebrew_year in [5784, 5787] {
            assert!(hebrew::is_leap_year(hebrew_year));
            let mut config = CalendarConfig::new(hebrew_year - 3760);
            config.calendar_kind = CalendarKind::Hebrew;
            config.holiday_sets = vec![HEBREW_RELIGIOUS.into()];

            let pairs: BTreeMap<NaiveDate, hebrew::HebrewDate> =
                hebrew::days_of_year(hebrew_year).into_iter().collect();
            let layout = CalendarEngine::builtin().layout(&config, &BTreeMap::new()).unwrap();

            let mut rosh_hashanah = 0;
            for cell in layout.cells() {
                let Some(annotation) = &cell.annotation else { continue };
                let h = pairs[&cell.date];
                let expected = hebrew::holiday_for(&h).map(|x| x.name);
                assert_eq!(Some(annotation.text.as_str()), expected, "{} is {}", cell.date, h);
                if annotation.text == "Rosh Hashanah" {
                    rosh_hashanah += 1;
                    assert_eq!((h.month, h.day), (hebrew::HebrewMonth::Tishrei, 1));
                }
            }
            assert_eq!(rosh_hashanah, 1);
        }
    }

    #[test]
    fn test_hebrew_overlay_years_span_two_gregorian_years() {
        let mut config = CalendarConfig::new(2025);
        config.calendar_kind = CalendarKind::Hebrew;
        assert_eq!(overlay_years(&config), vec![2024, 2025]);
    }
}
