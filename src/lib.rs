//! Calendar Engine - configuration to vector markup to print document
//!
//! # Guarantees
//! 1. Validation runs before any computation
//! 2. Every stage is a pure function of the configuration
//! 3. Vector output declares every namespace it uses
//! 4. Print conversion succeeds completely or returns a typed error
//! 5. Manifests fingerprint inputs and outputs
//!
//! The Hebrew calendar converter is an approximation; see [`hebrew`].

pub mod config;
pub mod themes;
pub mod validation;
pub mod hashing;
pub mod astro;
pub mod hebrew;
pub mod holidays;
pub mod overlay;
pub mod glyphs;
pub mod locale;
pub mod layout;
pub mod svg;
pub mod print;
pub mod pipeline;
pub mod generation;

use chrono::NaiveDate;
use std::collections::BTreeMap;

pub use config::{CalendarConfig, CalendarKind, ConfigurationError, CustomDate, DisplayFlags, LayoutStyle};
pub use themes::{ColorScheme, Theme, ThemeRegistry};
pub use validation::{ValidationReport, ValidationViolation, ViolationSeverity};
pub use hashing::{canonical_json, config_fingerprint};
pub use astro::{MoonPhase, MoonSample};
pub use glyphs::{glyph_lookup, GlyphAsset, GlyphProvider, GlyphVariant};
pub use holidays::{HolidayDefinition, HolidayProvider};
pub use svg::VectorDocument;
pub use print::{render_print_document, PrintAuthority, PrintDocument, PrintSpec, RenderingError};
pub use pipeline::{CalendarEngine, EngineError, RenderManifest, RenderedCalendar};
pub use generation::{GenerationJob, GenerationStatus, JobFailure};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Render a configuration with the built-in themes, holiday sets and glyphs.
///
/// `holiday_map` is the caller's date-to-name holiday data; it wins over
/// the configuration's holiday sets and loses to its custom dates.
pub fn render_vector(
    config: &CalendarConfig,
    holiday_map: &BTreeMap<NaiveDate, String>,
) -> Result<VectorDocument, ConfigurationError> {
    CalendarEngine::builtin().render_vector(config, holiday_map)
}
