//! Vector and print rendering tests
//!
//! Glyphs built from `<use xlink:href>` references must survive the print
//! conversion; undeclared namespaces must fail with a typed error.

use chrono::NaiveDate;
use std::collections::BTreeMap;

use calendar_engine::{
    glyph_lookup,
    print::{render_print_document_with, PDF_MAGIC},
    render_print_document, render_vector, CalendarConfig, CalendarEngine, CustomDate, EngineError,
    GenerationJob, GenerationStatus, GlyphVariant, LayoutStyle, PrintSpec, RenderingError,
    VectorDocument,
};

fn with_emoji(days: &[(u32, u32, &str)]) -> CalendarConfig {
    let mut config = CalendarConfig::new(2025);
    for (month, day, emoji) in days {
        config.custom_dates.insert(
            NaiveDate::from_ymd_opt(2025, *month, *day).unwrap(),
            CustomDate { text: format!("Event {}", emoji), emoji: Some(emoji.to_string()), color: None },
        );
    }
    config
}

#[test]
fn xlink_glyphs_declare_namespace_and_convert() {
    for symbol in ["🎃", "💃", "🙏"] {
        let asset = glyph_lookup(symbol, GlyphVariant::Color).unwrap();
        assert!(asset.uses_xlink(), "{} should reference sub-shapes", symbol);

        let doc = render_vector(&with_emoji(&[(10, 31, symbol)]), &BTreeMap::new()).unwrap();
        assert!(doc.as_str().contains(&format!("xlink:href=\"#{}\"", asset.id)));
        assert!(doc.as_str().contains("xmlns:xlink=\"http://www.w3.org/1999/xlink\""));

        let pdf = render_print_document(&doc).unwrap();
        assert!(!pdf.is_empty());
        assert_eq!(&pdf.as_bytes()[..4], PDF_MAGIC);
    }
}

#[test]
fn mono_glyphs_convert() {
    let mut config = with_emoji(&[(12, 25, "🎄"), (2, 14, "❤️"), (4, 29, "💃")]);
    config.glyph_variant = GlyphVariant::Mono;
    let doc = render_vector(&config, &BTreeMap::new()).unwrap();
    assert!(doc.as_str().contains("glyph-tree-mono"));
    assert!(doc.as_str().contains("glyph-heart-mono"));
    assert!(!doc.as_str().contains("-color\""));

    let pdf = render_print_document(&doc).unwrap();
    assert!(pdf.as_bytes().starts_with(PDF_MAGIC));
}

#[test]
fn undeclared_xlink_prefix_is_a_rendering_error() {
    let doc = render_vector(&with_emoji(&[(10, 31, "🎃")]), &BTreeMap::new()).unwrap();
    let stripped = doc
        .into_string()
        .replace(" xmlns:xlink=\"http://www.w3.org/1999/xlink\"", "");
    let broken = VectorDocument::from_markup(stripped);

    match render_print_document(&broken) {
        Err(RenderingError::MissingNamespace { prefix }) => assert_eq!(prefix, "xlink"),
        other => panic!("expected MissingNamespace, got {:?}", other.map(|d| d.len())),
    }
}

#[test]
fn truncated_markup_returns_no_bytes() {
    let doc = render_vector(&CalendarConfig::new(2025), &BTreeMap::new()).unwrap();
    let markup = doc.into_string();
    let truncated = VectorDocument::from_markup(&markup[..markup.len() / 2]);
    let err = render_print_document(&truncated).unwrap_err();
    assert!(matches!(err, RenderingError::MalformedMarkup(_)));
}

#[test]
fn traditional_layout_with_every_flag_converts() {
    let mut config = with_emoji(&[(1, 1, "🎉"), (3, 17, "🍀")]);
    config.layout_style = LayoutStyle::Traditional;
    config.flags.rotate_month_names = true;
    config.flags.show_week_numbers = true;
    config.flags.show_moon_illumination = true;
    config.flags.compact_mode = true;
    config.first_day_of_week = calendar_engine::config::FirstDayOfWeek::Monday;
    config.latitude = Some(51.5);
    config.longitude = Some(-0.12);

    let doc = render_vector(&config, &BTreeMap::new()).unwrap();
    assert_eq!(doc.month_group_count(), 12);
    assert!(doc.as_str().contains("rotate(-90"));
    assert!(doc.as_str().contains("rises"));

    let spec = PrintSpec::from_user(144, false).unwrap();
    let pdf = render_print_document_with(&doc, &spec).unwrap();
    assert!(pdf.as_bytes().starts_with(PDF_MAGIC));
}

#[test]
fn engine_manifest_covers_print_output() {
    let engine = CalendarEngine::builtin();
    let config = with_emoji(&[(10, 31, "🎃")]);
    let rendered = engine.render_print(&config, &BTreeMap::new(), &PrintSpec::default()).unwrap();

    assert_eq!(rendered.manifest.month_count, 12);
    assert_eq!(rendered.manifest.config_hash.len(), 64);
    assert_eq!(rendered.manifest.print_hash.as_ref().map(String::len), Some(64));

    let again = engine.render_vector(&config, &BTreeMap::new()).unwrap();
    assert_eq!(engine.manifest(&config, &again).unwrap().markup_hash, rendered.manifest.markup_hash);
}

#[test]
fn generation_job_reaches_ready() {
    let engine = CalendarEngine::builtin();
    let mut job = GenerationJob::new();
    let rendered = job
        .run(&engine, &CalendarConfig::new(2025), &BTreeMap::new(), &PrintSpec::default())
        .unwrap();
    assert_eq!(job.status, GenerationStatus::Ready);
    assert_eq!(job.manifest.as_ref(), Some(&rendered.manifest));
}

#[test]
fn configuration_errors_surface_through_engine_error() {
    let mut config = CalendarConfig::new(2025);
    config.theme = "neon".into();
    let err = CalendarEngine::builtin()
        .render_print(&config, &BTreeMap::new(), &PrintSpec::default())
        .unwrap_err();
    assert!(matches!(err, EngineError::Configuration(_)));
}
