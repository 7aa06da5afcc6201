//! Vector Document Renderer
//!
//! Serializes a [`CalendarLayout`] into SVG markup. The root always declares
//! both the SVG and the xlink namespace: glyphs and the moon disc are placed
//! with `<use xlink:href>`, and a print conversion of markup that uses an
//! undeclared prefix fails.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::astro::MoonSample;
use crate::config::{CalendarConfig, EventDisplay};
use crate::glyphs::{GlyphAsset, GlyphProvider};
use crate::layout::{CalendarLayout, DayCell, Geometry, Label, MonthBlock};
use crate::themes::ColorScheme;

pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";
pub const XLINK_NAMESPACE: &str = "http://www.w3.org/1999/xlink";

const MOON_DISC_ID: &str = "moon-disc";
const MOON_GRADIENT_ID: &str = "moon-glow";

/// Serialized calendar markup, before print conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorDocument {
    markup: String,
}

impl VectorDocument {
    /// Wrap existing markup, e.g. a document loaded back from disk.
    pub fn from_markup(markup: impl Into<String>) -> Self {
        Self { markup: markup.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.markup
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.markup.as_bytes()
    }

    pub fn into_string(self) -> String {
        self.markup
    }

    /// Number of per-month grouping elements.
    pub fn month_group_count(&self) -> usize {
        self.markup.matches("<g class=\"month\"").count()
    }

    /// Whether any element references another through `xlink:href`.
    pub fn uses_xlink(&self) -> bool {
        self.markup.contains("xlink:href")
    }
}

/// Fixed two-decimal coordinates with trailing zeros trimmed, so equal
/// layouts always print identically.
fn num(value: f64) -> String {
    let value = if value.abs() < 0.005 { 0.0 } else { value };
    let text = format!("{:.2}", value);
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

fn attr(value: &str) -> String {
    html_escape::encode_double_quoted_attribute(value).into_owned()
}

fn text(value: &str) -> String {
    html_escape::encode_text(value).into_owned()
}

/// Render a layout to SVG markup.
///
/// Glyphs for annotation emoji come from `glyphs`; symbols the provider does
/// not know are drawn as plain text.
pub fn render_markup(layout: &CalendarLayout, config: &CalendarConfig, glyphs: &dyn GlyphProvider) -> VectorDocument {
    let used_glyphs = collect_glyphs(layout, config, glyphs);
    let scheme = &layout.scheme;
    let geometry = &layout.geometry;

    let mut out = String::with_capacity(64 * 1024);
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"no\"?>\n");
    out.push_str(&format!(
        "<svg xmlns=\"{}\" xmlns:xlink=\"{}\" version=\"1.1\" width=\"{}\" height=\"{}\" viewBox=\"0 0 {} {}\" font-family=\"{}\">\n",
        SVG_NAMESPACE,
        XLINK_NAMESPACE,
        num(layout.width),
        num(layout.height),
        num(layout.width),
        num(layout.height),
        attr(&scheme.font_family),
    ));

    write_defs(&mut out, scheme, &used_glyphs);

    out.push_str(&format!(
        "<rect class=\"background\" x=\"0\" y=\"0\" width=\"{}\" height=\"{}\" fill=\"{}\"/>\n",
        num(layout.width),
        num(layout.height),
        attr(&scheme.background),
    ));
    write_label(&mut out, "title", &layout.title, geometry.title_size, &scheme.year_text, "bold");

    for month in &layout.months {
        write_month(&mut out, month, layout, config, &used_glyphs);
    }

    out.push_str("</svg>\n");
    VectorDocument { markup: out }
}

/// Glyphs referenced by any annotation, keyed by symbol, in a stable order.
fn collect_glyphs(
    layout: &CalendarLayout,
    config: &CalendarConfig,
    glyphs: &dyn GlyphProvider,
) -> BTreeMap<String, GlyphAsset> {
    let mut used = BTreeMap::new();
    for cell in layout.cells() {
        let Some(emoji) = cell.annotation.as_ref().and_then(|a| a.emoji.as_deref()) else {
            continue;
        };
        if used.contains_key(emoji) {
            continue;
        }
        match glyphs.lookup(emoji, config.glyph_variant) {
            Some(asset) => {
                used.insert(emoji.to_string(), asset);
            }
            None => log::debug!("no glyph for {:?}; drawing it as text", emoji),
        }
    }
    used
}

fn write_defs(out: &mut String, scheme: &ColorScheme, glyphs: &BTreeMap<String, GlyphAsset>) {
    out.push_str("<defs>\n");
    out.push_str(&format!(
        "<symbol id=\"{}\" viewBox=\"-1 -1 2 2\"><circle cx=\"0\" cy=\"0\" r=\"1\"/></symbol>\n",
        MOON_DISC_ID
    ));
    out.push_str(&format!(
        "<radialGradient id=\"{}\" cx=\"0.4\" cy=\"0.4\" r=\"0.7\"><stop offset=\"0\" stop-color=\"{}\"/><stop offset=\"1\" stop-color=\"{}\" stop-opacity=\"0.85\"/></radialGradient>\n",
        MOON_GRADIENT_ID,
        attr(&scheme.moon_light),
        attr(&scheme.moon_light),
    ));

    // Distinct symbols can share an asset id after normalization.
    let mut written: Vec<&str> = vec![];
    for asset in glyphs.values() {
        if written.contains(&asset.id.as_str()) {
            continue;
        }
        written.push(&asset.id);
        if !asset.defs.is_empty() {
            out.push_str(&asset.defs);
            out.push('\n');
        }
        out.push_str(&format!(
            "<symbol id=\"{}\" viewBox=\"{}\">{}</symbol>\n",
            attr(&asset.id),
            attr(&asset.view_box),
            asset.body
        ));
    }
    out.push_str("</defs>\n");
}

fn write_label(out: &mut String, class: &str, label: &Label, size: f64, fill: &str, weight: &str) {
    let transform = match label.rotate {
        Some(deg) => format!(" transform=\"rotate({} {} {})\"", num(deg), num(label.x), num(label.y)),
        None => String::new(),
    };
    out.push_str(&format!(
        "<text class=\"{}\" x=\"{}\" y=\"{}\" font-size=\"{}\" font-weight=\"{}\" fill=\"{}\" text-anchor=\"middle\"{}>{}</text>\n",
        class,
        num(label.x),
        num(label.y),
        num(size),
        weight,
        attr(fill),
        transform,
        text(&label.text),
    ));
}

fn write_month(
    out: &mut String,
    month: &MonthBlock,
    layout: &CalendarLayout,
    config: &CalendarConfig,
    glyphs: &BTreeMap<String, GlyphAsset>,
) {
    let scheme = &layout.scheme;
    let geometry = &layout.geometry;
    out.push_str(&format!("<g class=\"month\" id=\"month-{}\">\n", month.index + 1));
    write_label(out, "month-title", &month.title, geometry.month_title_size, &scheme.month_text, "bold");
    for label in &month.day_names {
        write_label(out, "day-name", label, geometry.small_text_size, &scheme.day_name_text, "normal");
    }
    for label in &month.week_numbers {
        write_label(out, "week-number", label, geometry.small_text_size, &scheme.day_name_text, "normal");
    }
    for cell in &month.cells {
        write_cell(out, cell, geometry, scheme, config, glyphs);
    }
    out.push_str("</g>\n");
}

fn write_cell(
    out: &mut String,
    cell: &DayCell,
    geometry: &Geometry,
    scheme: &ColorScheme,
    config: &CalendarConfig,
    glyphs: &BTreeMap<String, GlyphAsset>,
) {
    let flags = &config.flags;
    let b = &cell.bounds;
    out.push_str(&format!("<g class=\"day\" data-date=\"{}\">", cell.date));
    if let Some(annotation) = &cell.annotation {
        out.push_str(&format!("<title>{}</title>", text(&annotation.text)));
    }

    let fill = cell.paint.background.as_deref().map(attr);
    if flags.show_grid || fill.is_some() {
        let stroke = if flags.show_grid {
            format!(" stroke=\"{}\" stroke-width=\"0.5\"", attr(&scheme.grid_lines))
        } else {
            String::new()
        };
        out.push_str(&format!(
            "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\"{}/>",
            num(b.x),
            num(b.y),
            num(b.width),
            num(b.height),
            fill.as_deref().unwrap_or("none"),
            stroke,
        ));
    }

    if flags.show_day_numbers {
        out.push_str(&format!(
            "<text class=\"day-number\" x=\"{}\" y=\"{}\" font-size=\"{}\" fill=\"{}\">{}</text>",
            num(b.x + 3.0),
            num(b.y + geometry.day_number_size + 1.0),
            num(geometry.day_number_size),
            attr(&cell.paint.text_color),
            text(&cell.label),
        ));
    }
    if let Some(secondary) = &cell.secondary_label {
        out.push_str(&format!(
            "<text class=\"secondary\" x=\"{}\" y=\"{}\" font-size=\"{}\" fill=\"{}\" text-anchor=\"end\">{}</text>",
            num(b.right() - 2.0),
            num(b.bottom() - 2.0),
            num(geometry.small_text_size),
            attr(&scheme.day_name_text),
            text(secondary),
        ));
    }
    if let Some(day_name) = &cell.day_name {
        out.push_str(&format!(
            "<text class=\"day-initial\" x=\"{}\" y=\"{}\" font-size=\"{}\" fill=\"{}\">{}</text>",
            num(b.x + 3.0),
            num(b.bottom() - 2.0),
            num(geometry.small_text_size),
            attr(&scheme.day_name_text),
            text(day_name),
        ));
    }

    if let Some(sample) = &cell.moon {
        if !flags.show_full_moon_only || sample.is_near_full() {
            write_moon(out, cell, sample, geometry, scheme, config);
        }
    }

    if let Some(annotation) = &cell.annotation {
        let size = match config.event_display {
            EventDisplay::Compact => b.height.min(b.width) * 0.35,
            EventDisplay::Expanded => b.height.min(b.width) * 0.55,
        };
        let x = b.center_x() - size / 2.0;
        let y = b.bottom() - size - 2.0;
        match annotation.emoji.as_deref() {
            Some(emoji) => match glyphs.get(emoji) {
                Some(asset) => out.push_str(&format!(
                    "<use xlink:href=\"#{}\" x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\"/>",
                    attr(&asset.id),
                    num(x),
                    num(y),
                    num(size),
                    num(size),
                )),
                None => out.push_str(&format!(
                    "<text class=\"emoji\" x=\"{}\" y=\"{}\" font-size=\"{}\" text-anchor=\"middle\">{}</text>",
                    num(b.center_x()),
                    num(b.bottom() - 3.0),
                    num(size * 0.8),
                    text(emoji),
                )),
            },
            None => out.push_str(&format!(
                "<text class=\"annotation\" x=\"{}\" y=\"{}\" font-size=\"{}\" fill=\"{}\" text-anchor=\"middle\">{}</text>",
                num(b.center_x()),
                num(b.bottom() - 3.0),
                num(geometry.small_text_size * 0.8),
                attr(&cell.paint.text_color),
                text(&annotation.text),
            )),
        }
    }
    out.push_str("</g>\n");
}

/// Dark disc, lit region bounded by the limb and the terminator ellipse,
/// then the border on top.
fn write_moon(
    out: &mut String,
    cell: &DayCell,
    sample: &MoonSample,
    geometry: &Geometry,
    scheme: &ColorScheme,
    config: &CalendarConfig,
) {
    let b = &cell.bounds;
    let r = config.moon.size.min(b.width.min(b.height) * 0.3);
    let cx = b.right() - r - 2.0 + config.moon.offset_x;
    let cy = b.y + r + 2.0 + config.moon.offset_y;

    let mut title = sample.phase().label().to_string();
    if let Some(timing) = &cell.moon_timing {
        title.push_str(&format!(
            ", rises {} sets {}",
            timing.rise.format("%H:%M"),
            timing.set.format("%H:%M")
        ));
    }
    out.push_str(&format!("<g class=\"moon\"><title>{}</title>", text(&title)));
    out.push_str(&format!(
        "<use xlink:href=\"#{}\" x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\"/>",
        MOON_DISC_ID,
        num(cx - r),
        num(cy - r),
        num(2.0 * r),
        num(2.0 * r),
        attr(&scheme.moon_dark),
    ));
    if sample.illumination > 0.01 {
        out.push_str(&format!(
            "<path class=\"moon-lit\" d=\"{}\" fill=\"url(#{})\"/>",
            lit_path(cx, cy, r, sample),
            MOON_GRADIENT_ID
        ));
    }
    out.push_str(&format!(
        "<circle cx=\"{}\" cy=\"{}\" r=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"0.5\"/>",
        num(cx),
        num(cy),
        num(r),
        attr(&scheme.moon_border),
    ));

    if config.flags.show_moon_illumination {
        out.push_str(&format!(
            "<text class=\"moon-illumination\" x=\"{}\" y=\"{}\" font-size=\"{}\" fill=\"{}\" text-anchor=\"middle\">{}%</text>",
            num(cx),
            num(cy + r + geometry.small_text_size),
            num(geometry.small_text_size * 0.8),
            attr(&scheme.day_name_text),
            (sample.illumination * 100.0).round() as i64,
        ));
    }
    out.push_str("</g>");
}

/// Outline of the lit part of the disc, lit side on the right while waxing.
pub(crate) fn lit_path(cx: f64, cy: f64, r: f64, sample: &MoonSample) -> String {
    let cos = sample.phase_angle.cos();
    let rx = r * cos.abs();
    let (limb_sweep, terminator_sweep) = if sample.is_waxing() {
        (1, if cos > 0.0 { 0 } else { 1 })
    } else {
        (0, if cos > 0.0 { 1 } else { 0 })
    };
    format!(
        "M {} {} A {} {} 0 0 {} {} {} A {} {} 0 0 {} {} {} Z",
        num(cx),
        num(cy - r),
        num(r),
        num(r),
        limb_sweep,
        num(cx),
        num(cy + r),
        num(rx),
        num(r),
        terminator_sweep,
        num(cx),
        num(cy - r),
    )
}
