//! Glyph assets for annotation symbols
//!
//! Each glyph is a `<symbol>` fragment plus any `<defs>` it needs
//! (gradients, shared sub-shapes). Several glyphs reference their own
//! sub-shapes through `xlink:href`, so any document embedding them must
//! declare the xlink namespace.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GlyphVariant {
    Color,
    Mono,
}

impl Default for GlyphVariant {
    fn default() -> Self {
        Self::Color
    }
}

impl GlyphVariant {
    pub fn suffix(self) -> &'static str {
        match self {
            GlyphVariant::Color => "color",
            GlyphVariant::Mono => "mono",
        }
    }
}

/// A ready-to-embed vector glyph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlyphAsset {
    /// Id of the `<symbol>`; unique per glyph and variant.
    pub id: String,
    pub view_box: String,
    /// Markup placed in `<defs>` ahead of the symbol. May be empty.
    pub defs: String,
    /// Children of the `<symbol>`.
    pub body: String,
}

impl GlyphAsset {
    pub fn uses_xlink(&self) -> bool {
        self.defs.contains("xlink:") || self.body.contains("xlink:")
    }
}

/// Read-only lookup of glyph fragments by annotation symbol.
pub trait GlyphProvider: Send + Sync {
    fn lookup(&self, symbol: &str, variant: GlyphVariant) -> Option<GlyphAsset>;
}

/// Strip emoji presentation selectors so `❤️` and `❤` resolve alike.
pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().chars().filter(|c| *c != '\u{FE0F}').collect()
}

struct GlyphTemplate {
    symbol: &'static str,
    slug: &'static str,
    defs: &'static str,
    body: &'static str,
    color: [&'static str; 4],
    mono: [&'static str; 4],
}

const MONO: [&str; 4] = ["#ffffff", "#000000", "#000000", "#808080"];

static TEMPLATES: &[GlyphTemplate] = &[
    GlyphTemplate {
        symbol: "🎃",
        slug: "pumpkin",
        defs: r##"<ellipse id="{id}-lobe" cx="16" cy="19" rx="7" ry="9" fill="{c1}" stroke="{c3}" stroke-width="0.8"/>"##,
        body: r##"<use xlink:href="#{id}-lobe" transform="translate(-5,0)"/><use xlink:href="#{id}-lobe" transform="translate(5,0)"/><use xlink:href="#{id}-lobe"/><rect x="14.5" y="5" width="3" height="6" rx="1" fill="{c2}"/><path d="M11 17 L13 15 L15 17 Z M17 17 L19 15 L21 17 Z M11 22 Q16 26 21 22" fill="{c4}" stroke="{c4}" stroke-width="0.8"/>"##,
        color: ["#f39c12", "#27ae60", "#a04000", "#5d2e0c"],
        mono: MONO,
    },
    GlyphTemplate {
        symbol: "💃",
        slug: "dancing-figure",
        defs: r##"<path id="{id}-limb" d="M0 0 Q4 3 8 2" fill="none" stroke="{c3}" stroke-width="1.8" stroke-linecap="round"/>"##,
        body: r##"<circle cx="17" cy="6" r="3" fill="{c3}"/><path d="M16 9 L19 9 L22 24 L10 24 Z" fill="{c1}"/><use xlink:href="#{id}-limb" transform="translate(18,11)"/><use xlink:href="#{id}-limb" transform="translate(16,11) scale(-1,1)"/><use xlink:href="#{id}-limb" transform="translate(13,24) rotate(80)"/><use xlink:href="#{id}-limb" transform="translate(19,24) rotate(70)"/>"##,
        color: ["#e74c3c", "#c0392b", "#6e2c00", "#f5b7b1"],
        mono: MONO,
    },
    GlyphTemplate {
        symbol: "🙏",
        slug: "praying-hands",
        defs: r##"<path id="{id}-hand" d="M16 4 Q12 8 11 16 L9 26 L16 28 Z" fill="{c1}" stroke="{c3}" stroke-width="0.8"/>"##,
        body: r##"<use xlink:href="#{id}-hand"/><use xlink:href="#{id}-hand" transform="translate(32,0) scale(-1,1)"/><path d="M8 26 L24 26 L24 30 L8 30 Z" fill="{c2}"/>"##,
        color: ["#f5cba7", "#85c1e9", "#a04000", "#ffffff"],
        mono: MONO,
    },
    GlyphTemplate {
        symbol: "🎄",
        slug: "tree",
        defs: r##"<linearGradient id="{id}-fill" x1="0" y1="0" x2="0" y2="1"><stop offset="0" stop-color="{c1}"/><stop offset="1" stop-color="{c3}"/></linearGradient>"##,
        body: r##"<path d="M16 3 L26 17 L20 17 L27 26 L5 26 L12 17 L6 17 Z" fill="url(#{id}-fill)"/><rect x="14" y="26" width="4" height="4" fill="{c4}"/><circle cx="16" cy="4" r="2" fill="{c2}"/>"##,
        color: ["#52be80", "#f4d03f", "#1e8449", "#784212"],
        mono: ["#bfbfbf", "#000000", "#404040", "#000000"],
    },
    GlyphTemplate {
        symbol: "❤",
        slug: "heart",
        defs: "",
        body: r##"<path d="M16 28 L5 16 A6 6 0 0 1 16 8 A6 6 0 0 1 27 16 Z" fill="{c1}" stroke="{c3}" stroke-width="0.8"/>"##,
        color: ["#e74c3c", "#ffffff", "#922b21", "#ffffff"],
        mono: MONO,
    },
    GlyphTemplate {
        symbol: "⭐",
        slug: "star",
        defs: "",
        body: r##"<polygon points="16,3 19.5,12 29,12 21.5,18 24.5,28 16,22 7.5,28 10.5,18 3,12 12.5,12" fill="{c1}" stroke="{c3}" stroke-width="0.8"/>"##,
        color: ["#f4d03f", "#ffffff", "#b7950b", "#ffffff"],
        mono: MONO,
    },
    GlyphTemplate {
        symbol: "🕎",
        slug: "menorah",
        defs: r##"<g id="{id}-branch"><rect x="-0.6" y="0" width="1.2" height="10" fill="{c3}"/><path d="M0 -3 Q1.2 -1.5 0 0 Q-1.2 -1.5 0 -3 Z" fill="{c2}"/></g>"##,
        body: r##"<use xlink:href="#{id}-branch" transform="translate(4,10)"/><use xlink:href="#{id}-branch" transform="translate(7,10)"/><use xlink:href="#{id}-branch" transform="translate(10,10)"/><use xlink:href="#{id}-branch" transform="translate(13,10)"/><use xlink:href="#{id}-branch" transform="translate(16,7)"/><use xlink:href="#{id}-branch" transform="translate(19,10)"/><use xlink:href="#{id}-branch" transform="translate(22,10)"/><use xlink:href="#{id}-branch" transform="translate(25,10)"/><use xlink:href="#{id}-branch" transform="translate(28,10)"/><rect x="3" y="20" width="26" height="2" fill="{c3}"/><rect x="15" y="20" width="2" height="8" fill="{c3}"/><rect x="10" y="27" width="12" height="2" fill="{c3}"/>"##,
        color: ["#ffffff", "#f39c12", "#2874a6", "#ffffff"],
        mono: MONO,
    },
    GlyphTemplate {
        symbol: "🍎",
        slug: "apple",
        defs: "",
        body: r##"<circle cx="16" cy="18" r="10" fill="{c1}"/><path d="M16 8 Q17 4 20 3" fill="none" stroke="{c4}" stroke-width="1.5"/><path d="M17 7 Q22 3 25 6 Q21 9 17 7 Z" fill="{c2}"/>"##,
        color: ["#cb4335", "#28b463", "#ffffff", "#6e2c00"],
        mono: MONO,
    },
    GlyphTemplate {
        symbol: "🎉",
        slug: "party-popper",
        defs: "",
        body: r##"<path d="M4 28 L10 12 L20 22 Z" fill="{c1}"/><circle cx="20" cy="8" r="1.8" fill="{c2}"/><circle cx="25" cy="14" r="1.5" fill="{c3}"/><circle cx="14" cy="5" r="1.3" fill="{c4}"/><path d="M22 4 L23 6 M27 9 L29 8" stroke="{c2}" stroke-width="1.2"/>"##,
        color: ["#f5b041", "#e74c3c", "#3498db", "#8e44ad"],
        mono: ["#808080", "#000000", "#404040", "#000000"],
    },
    GlyphTemplate {
        symbol: "🎆",
        slug: "fireworks",
        defs: r##"<path id="{id}-ray" d="M0 -4 L0 -11" stroke="{c1}" stroke-width="1.6" stroke-linecap="round"/>"##,
        body: r##"<g transform="translate(16,16)"><use xlink:href="#{id}-ray"/><use xlink:href="#{id}-ray" transform="rotate(45)"/><use xlink:href="#{id}-ray" transform="rotate(90)"/><use xlink:href="#{id}-ray" transform="rotate(135)"/><use xlink:href="#{id}-ray" transform="rotate(180)"/><use xlink:href="#{id}-ray" transform="rotate(225)"/><use xlink:href="#{id}-ray" transform="rotate(270)"/><use xlink:href="#{id}-ray" transform="rotate(315)"/><circle r="2.5" fill="{c2}"/></g>"##,
        color: ["#e74c3c", "#f4d03f", "#ffffff", "#ffffff"],
        mono: MONO,
    },
    GlyphTemplate {
        symbol: "🍀",
        slug: "clover",
        defs: r##"<circle id="{id}-leaf" cx="0" cy="-5" r="4.5" fill="{c1}"/>"##,
        body: r##"<g transform="translate(16,14)"><use xlink:href="#{id}-leaf"/><use xlink:href="#{id}-leaf" transform="rotate(90)"/><use xlink:href="#{id}-leaf" transform="rotate(180)"/><use xlink:href="#{id}-leaf" transform="rotate(270)"/></g><path d="M16 16 Q17 24 21 29" fill="none" stroke="{c3}" stroke-width="1.5"/>"##,
        color: ["#28b463", "#ffffff", "#1d8348", "#ffffff"],
        mono: ["#808080", "#ffffff", "#000000", "#ffffff"],
    },
    GlyphTemplate {
        symbol: "🕯",
        slug: "candle",
        defs: "",
        body: r##"<rect x="12" y="12" width="8" height="17" rx="1" fill="{c1}" stroke="{c3}" stroke-width="0.8"/><path d="M16 3 Q19 7 16 10 Q13 7 16 3 Z" fill="{c2}"/>"##,
        color: ["#fdebd0", "#f39c12", "#a04000", "#ffffff"],
        mono: MONO,
    },
];

/// Glyphs compiled into the engine, built once per process.
pub struct BuiltinGlyphs {
    assets: HashMap<(String, GlyphVariant), GlyphAsset>,
}

impl BuiltinGlyphs {
    fn build() -> Self {
        let mut assets = HashMap::new();
        for template in TEMPLATES {
            for variant in [GlyphVariant::Color, GlyphVariant::Mono] {
                let palette = match variant {
                    GlyphVariant::Color => &template.color,
                    GlyphVariant::Mono => &template.mono,
                };
                let id = format!("glyph-{}-{}", template.slug, variant.suffix());
                let fill = |markup: &str| {
                    markup
                        .replace("{id}", &id)
                        .replace("{c1}", palette[0])
                        .replace("{c2}", palette[1])
                        .replace("{c3}", palette[2])
                        .replace("{c4}", palette[3])
                };
                let asset = GlyphAsset {
                    id: id.clone(),
                    view_box: "0 0 32 32".to_string(),
                    defs: fill(template.defs),
                    body: fill(template.body),
                };
                assets.insert((normalize_symbol(template.symbol), variant), asset);
            }
        }
        Self { assets }
    }

    pub fn symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self.assets.keys().map(|(s, _)| s.clone()).collect();
        symbols.sort();
        symbols.dedup();
        symbols
    }
}

impl GlyphProvider for BuiltinGlyphs {
    fn lookup(&self, symbol: &str, variant: GlyphVariant) -> Option<GlyphAsset> {
        self.assets.get(&(normalize_symbol(symbol), variant)).cloned()
    }
}

/// Process-wide built-in glyph table.
pub fn builtin() -> &'static BuiltinGlyphs {
    static GLYPHS: OnceLock<BuiltinGlyphs> = OnceLock::new();
    GLYPHS.get_or_init(BuiltinGlyphs::build)
}

/// Look a symbol up in the built-in table.
pub fn glyph_lookup(symbol: &str, variant: GlyphVariant) -> Option<GlyphAsset> {
    builtin().lookup(symbol, variant)
}
