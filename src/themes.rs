//! Theme System - named color schemes
//!
//! A theme supplies the base palette; the configuration's per-element
//! overrides are applied on top by [`ThemeRegistry::resolve_scheme`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use crate::config::{is_hex_color, CalendarConfig, ConfigurationError};

pub type ThemeId = String;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorScheme {
    pub background: String,
    pub year_text: String,
    pub month_text: String,
    pub day_text: String,
    pub day_name_text: String,
    pub grid_lines: String,
    pub weekend_background: String,
    pub holiday: String,
    pub custom_date: String,
    pub moon_light: String,
    pub moon_dark: String,
    pub moon_border: String,
    #[serde(default = "default_font_family")]
    pub font_family: String,
}

fn default_font_family() -> String { "Helvetica, Arial, sans-serif".to_string() }

impl ColorScheme {
    fn colors(&self) -> [(&'static str, &str); 12] {
        [
            ("background", self.background.as_str()),
            ("yearText", self.year_text.as_str()),
            ("monthText", self.month_text.as_str()),
            ("dayText", self.day_text.as_str()),
            ("dayNameText", self.day_name_text.as_str()),
            ("gridLines", self.grid_lines.as_str()),
            ("weekendBackground", self.weekend_background.as_str()),
            ("holiday", self.holiday.as_str()),
            ("customDate", self.custom_date.as_str()),
            ("moonLight", self.moon_light.as_str()),
            ("moonDark", self.moon_dark.as_str()),
            ("moonBorder", self.moon_border.as_str()),
        ]
    }

    /// First color field that is not a hex color, by its JSON name.
    pub fn invalid_color(&self) -> Option<(&'static str, &str)> {
        self.colors().into_iter().find(|(_, value)| !is_hex_color(value))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Theme {
    pub id: ThemeId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub deprecated: bool,
    pub colors: ColorScheme,
}

/// Theme registry - built-in themes plus any loaded from disk
pub struct ThemeRegistry {
    themes: HashMap<ThemeId, Theme>,
}

impl ThemeRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self { themes: HashMap::new() }
    }

    /// The five themes shipped with the engine.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for theme in builtin_themes() {
            registry.register(theme);
        }
        registry
    }

    /// Built-in themes, then every `*.json` theme in `dir`. Files with the
    /// same id as a built-in replace it; unreadable files and files with a
    /// non-hex color are skipped.
    pub fn load_from_dir(dir: &Path) -> Result<Self, std::io::Error> {
        let mut registry = Self::builtin();
        if dir.exists() {
            for entry in fs::read_dir(dir)? {
                let path = entry?.path();
                if path.extension().map_or(false, |e| e == "json") {
                    let parsed = fs::read_to_string(&path)
                        .map_err(|e| e.to_string())
                        .and_then(|content| {
                            serde_json::from_str::<Theme>(&content).map_err(|e| e.to_string())
                        })
                        .and_then(|theme| match theme.colors.invalid_color() {
                            Some((field, value)) => Err(format!("{} is not a hex color: {:?}", field, value)),
                            None => Ok(theme),
                        });
                    match parsed {
                        Ok(theme) => {
                            log::debug!("loaded theme {} from {}", theme.id, path.display());
                            registry.register(theme);
                        }
                        Err(e) => log::warn!("skipping theme file {}: {}", path.display(), e),
                    }
                }
            }
        }
        Ok(registry)
    }

    pub fn get(&self, id: &str) -> Option<&Theme> {
        self.themes.get(id)
    }

    /// Themes sorted by id.
    pub fn list(&self) -> Vec<&Theme> {
        let mut themes: Vec<_> = self.themes.values().collect();
        themes.sort_by(|a, b| a.id.cmp(&b.id));
        themes
    }

    pub fn register(&mut self, theme: Theme) {
        self.themes.insert(theme.id.clone(), theme);
    }

    /// The configured theme's scheme with the configuration's overrides applied.
    pub fn resolve_scheme(&self, config: &CalendarConfig) -> Result<ColorScheme, ConfigurationError> {
        let theme = self
            .get(&config.theme)
            .ok_or_else(|| ConfigurationError::UnknownTheme(config.theme.clone()))?;
        if theme.deprecated {
            log::warn!("theme {} is deprecated", theme.id);
        }

        let mut scheme = theme.colors.clone();
        let overrides = &config.colors;
        let apply = |slot: &mut String, value: &Option<String>| {
            if let Some(v) = value {
                *slot = v.clone();
            }
        };
        apply(&mut scheme.year_text, &overrides.year_text);
        apply(&mut scheme.month_text, &overrides.month_text);
        apply(&mut scheme.day_text, &overrides.day_text);
        apply(&mut scheme.grid_lines, &overrides.grid_lines);
        apply(&mut scheme.weekend_background, &overrides.weekend_background);
        apply(&mut scheme.holiday, &overrides.holiday);
        apply(&mut scheme.custom_date, &overrides.custom_date);
        apply(&mut scheme.moon_light, &overrides.moon_light);
        apply(&mut scheme.moon_dark, &overrides.moon_dark);
        apply(&mut scheme.moon_border, &overrides.moon_border);
        Ok(scheme)
    }
}

impl Default for ThemeRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Process-wide read-only registry of the built-in themes.
pub fn builtin_registry() -> &'static ThemeRegistry {
    static REGISTRY: OnceLock<ThemeRegistry> = OnceLock::new();
    REGISTRY.get_or_init(ThemeRegistry::builtin)
}

#[allow(clippy::too_many_arguments)]
fn scheme(
    background: &str,
    year_text: &str,
    month_text: &str,
    day_text: &str,
    grid_lines: &str,
    weekend_background: &str,
    holiday: &str,
    custom_date: &str,
    moon: (&str, &str, &str),
) -> ColorScheme {
    ColorScheme {
        background: background.to_string(),
        year_text: year_text.to_string(),
        month_text: month_text.to_string(),
        day_text: day_text.to_string(),
        day_name_text: month_text.to_string(),
        grid_lines: grid_lines.to_string(),
        weekend_background: weekend_background.to_string(),
        holiday: holiday.to_string(),
        custom_date: custom_date.to_string(),
        moon_light: moon.0.to_string(),
        moon_dark: moon.1.to_string(),
        moon_border: moon.2.to_string(),
        font_family: default_font_family(),
    }
}

fn builtin_themes() -> Vec<Theme> {
    let theme = |id: &str, name: &str, description: &str, colors: ColorScheme| Theme {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        deprecated: false,
        colors,
    };

    vec![
        theme(
            "default",
            "Default",
            "Black on white with soft weekend shading",
            scheme(
                "#ffffff", "#111111", "#222222", "#333333", "#cccccc", "#f2f2f2",
                "#c0392b", "#2471a3", ("#fdfefe", "#2c3e50", "#566573"),
            ),
        ),
        theme(
            "classic",
            "Classic",
            "Serif-friendly warm tones",
            ColorScheme {
                font_family: "Georgia, 'Times New Roman', serif".to_string(),
                ..scheme(
                    "#fffdf7", "#5b3a1a", "#7a4e22", "#3b2a1a", "#d8c7a8", "#f5ecd9",
                    "#a93226", "#1f618d", ("#fef9e7", "#4d3b2a", "#7a4e22"),
                )
            },
        ),
        theme(
            "midnight",
            "Midnight",
            "Light text on a dark page",
            scheme(
                "#0b1021", "#f4f6f7", "#d6dbdf", "#eaecee", "#2e4053", "#17202a",
                "#f1948a", "#85c1e9", ("#fdfefe", "#1b2631", "#aab7b8"),
            ),
        ),
        theme(
            "pastel",
            "Pastel",
            "Low-contrast pastel palette",
            scheme(
                "#fefcff", "#6c5b7b", "#6c5b7b", "#555555", "#e3d7ef", "#fdf2e9",
                "#e8797a", "#5dade2", ("#fffdf5", "#b8a9c9", "#8e7aa6"),
            ),
        ),
        theme(
            "monochrome",
            "Monochrome",
            "Grayscale only, for single-ink printing",
            scheme(
                "#ffffff", "#000000", "#000000", "#000000", "#999999", "#e6e6e6",
                "#000000", "#000000", ("#ffffff", "#404040", "#000000"),
            ),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::is_hex_color;

    #[test]
    fn test_builtin_themes_are_valid_hex() {
        let registry = ThemeRegistry::builtin();
        assert_eq!(registry.list().len(), 5);
        for theme in registry.list() {
            let c = &theme.colors;
            for color in [
                &c.background, &c.year_text, &c.month_text, &c.day_text, &c.day_name_text,
                &c.grid_lines, &c.weekend_background, &c.holiday, &c.custom_date,
                &c.moon_light, &c.moon_dark, &c.moon_border,
            ] {
                assert!(is_hex_color(color), "{} has bad color {}", theme.id, color);
            }
        }
    }

    #[test]
    fn test_overrides_win_over_theme() {
        let mut config = CalendarConfig::new(2025);
        config.colors.holiday = Some("#00ff00".to_string());
        let scheme = ThemeRegistry::builtin().resolve_scheme(&config).unwrap();
        assert_eq!(scheme.holiday, "#00ff00");
        assert_eq!(scheme.day_text, "#333333");
    }

    #[test]
    fn test_unknown_theme() {
        let mut config = CalendarConfig::new(2025);
        config.theme = "neon".to_string();
        let err = ThemeRegistry::builtin().resolve_scheme(&config).unwrap_err();
        assert!(matches!(err, ConfigurationError::UnknownTheme(_)));
    }

    #[test]
    fn test_load_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        let custom = r##"{
            "id": "forest",
            "name": "Forest",
            "colors": {
                "background": "#f0fff0", "yearText": "#0b3d0b", "monthText": "#145214",
                "dayText": "#1e5631", "dayNameText": "#145214", "gridLines": "#a4de02",
                "weekendBackground": "#e8f5e9", "holiday": "#b71c1c", "customDate": "#0d47a1",
                "moonLight": "#ffffff", "moonDark": "#1b5e20", "moonBorder": "#2e7d32"
            }
        }"##;
        fs::write(dir.path().join("forest.json"), custom).unwrap();
        fs::write(dir.path().join("broken.json"), "{ not json").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        fs::write(
            dir.path().join("named.json"),
            custom.replace("\"forest\"", "\"named\"").replace("#b71c1c", "red"),
        )
        .unwrap();

        let registry = ThemeRegistry::load_from_dir(dir.path()).unwrap();
        assert_eq!(registry.list().len(), 6);
        let forest = registry.get("forest").unwrap();
        assert_eq!(forest.colors.font_family, "Helvetica, Arial, sans-serif");
        assert!(registry.get("named").is_none());
    }

    #[test]
    fn test_builtin_schemes_are_hex() {
        for theme in ThemeRegistry::builtin().list() {
            assert_eq!(theme.colors.invalid_color(), None, "{}", theme.id);
        }
    }
}
