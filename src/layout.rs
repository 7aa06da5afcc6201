//! Calendar Layout Engine
//!
//! Turns a validated configuration into positioned months and day cells.
//! Pure geometry: no markup is produced here. The renderer walks the
//! [`CalendarLayout`] in order, so month order in `months` is output order.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::astro::{self, MoonSample, MoonTiming, Observer};
use crate::config::{CalendarConfig, CalendarKind, FirstDayOfWeek, LayoutStyle};
use crate::hebrew;
use crate::locale;
use crate::overlay::ResolvedAnnotation;
use crate::themes::ColorScheme;

/// Week rows a grid month can need (a 31-day month starting on the last column).
pub const MAX_WEEK_ROWS: u32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center_x(&self) -> f64 {
        self.x + self.width / 2.0
    }
}

/// A positioned piece of text. `rotate` is in degrees around the anchor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Label {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub rotate: Option<f64>,
}

impl Label {
    fn at(text: impl Into<String>, x: f64, y: f64) -> Self {
        Self { text: text.into(), x, y, rotate: None }
    }
}

/// Why a cell is painted the way it is, highest precedence first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaintRole {
    Custom,
    Holiday,
    Weekend,
    Default,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellPaint {
    pub role: PaintRole,
    pub text_color: String,
    pub background: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayCell {
    pub date: NaiveDate,
    /// Day number in the calendar being laid out.
    pub label: String,
    /// Gregorian day/month under a Hebrew day number.
    pub secondary_label: Option<String>,
    /// Weekday initial inside the cell (traditional layout).
    pub day_name: Option<String>,
    pub bounds: Rect,
    pub weekend: bool,
    pub holiday: bool,
    pub annotation: Option<ResolvedAnnotation>,
    pub paint: CellPaint,
    pub moon: Option<MoonSample>,
    /// Only with a configured location.
    pub moon_timing: Option<MoonTiming>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthBlock {
    /// 0-based position in the year.
    pub index: usize,
    pub title: Label,
    pub bounds: Rect,
    pub day_names: Vec<Label>,
    pub week_numbers: Vec<Label>,
    pub cells: Vec<DayCell>,
}

/// Sizes shared by every month of one layout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Geometry {
    pub cell_width: f64,
    pub cell_height: f64,
    pub margin: f64,
    pub title_size: f64,
    pub month_title_size: f64,
    pub day_number_size: f64,
    pub small_text_size: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarLayout {
    pub kind: CalendarKind,
    pub style: LayoutStyle,
    pub width: f64,
    pub height: f64,
    pub title: Label,
    pub geometry: Geometry,
    pub scheme: ColorScheme,
    pub months: Vec<MonthBlock>,
}

impl CalendarLayout {
    pub fn cells(&self) -> impl Iterator<Item = &DayCell> {
        self.months.iter().flat_map(|m| m.cells.iter())
    }
}

/// One month's days before placement.
struct MonthDays {
    title: String,
    days: Vec<DayEntry>,
}

struct DayEntry {
    date: NaiveDate,
    label: String,
    secondary: Option<String>,
}

fn gregorian_months(config: &CalendarConfig) -> Vec<MonthDays> {
    let language = config.language();
    (1..=12)
        .filter_map(|month| {
            let first = NaiveDate::from_ymd_opt(config.year, month, 1)?;
            let days = first
                .iter_days()
                .take_while(|d| d.month() == month)
                .map(|date| DayEntry { date, label: date.day().to_string(), secondary: None })
                .collect();
            Some(MonthDays { title: locale::month_name(&language, month).to_string(), days })
        })
        .collect()
}

fn hebrew_months(config: &CalendarConfig) -> Vec<MonthDays> {
    let year = config.hebrew_year();
    let mut months: Vec<(hebrew::HebrewMonth, MonthDays)> = vec![];
    for (date, h) in hebrew::days_of_year(year) {
        let entry = DayEntry {
            date,
            label: h.day.to_string(),
            secondary: Some(format!("{}/{}", date.day(), date.month())),
        };
        match months.last_mut() {
            Some((month, days)) if *month == h.month => days.days.push(entry),
            _ => months.push((
                h.month,
                MonthDays { title: h.month.name().to_string(), days: vec![entry] },
            )),
        }
    }
    months.into_iter().map(|(_, days)| days).collect()
}

fn calendar_title(config: &CalendarConfig, months: &[MonthDays]) -> String {
    match config.calendar_kind {
        CalendarKind::Standard => config.year.to_string(),
        CalendarKind::Hebrew => {
            let first = months.first().and_then(|m| m.days.first()).map(|d| d.date.year());
            let last = months.last().and_then(|m| m.days.last()).map(|d| d.date.year());
            match (first, last) {
                (Some(a), Some(b)) if a != b => format!("{} ({}-{})", config.hebrew_year(), a, b),
                (Some(a), _) => format!("{} ({})", config.hebrew_year(), a),
                _ => config.hebrew_year().to_string(),
            }
        }
    }
}

/// Week number of `date` for a week that starts on `first_day`.
///
/// Monday-start weeks follow ISO 8601. Otherwise the week containing
/// January 1 is week 1.
pub fn week_number(date: NaiveDate, first_day: FirstDayOfWeek) -> u32 {
    if first_day == FirstDayOfWeek::Monday {
        return date.iso_week().week();
    }
    let jan1_column = NaiveDate::from_ymd_opt(date.year(), 1, 1)
        .map(|d| first_day.column_of(d.weekday()))
        .unwrap_or(0);
    (date.ordinal0() + jan1_column) / 7 + 1
}

fn paint(
    annotation: Option<&ResolvedAnnotation>,
    weekend: bool,
    config: &CalendarConfig,
    scheme: &ColorScheme,
) -> CellPaint {
    match annotation {
        Some(a) if a.source.is_custom() => CellPaint {
            role: PaintRole::Custom,
            text_color: a.color.clone().unwrap_or_else(|| scheme.custom_date.clone()),
            background: None,
        },
        Some(_) => CellPaint {
            role: PaintRole::Holiday,
            text_color: scheme.holiday.clone(),
            background: None,
        },
        None if weekend && config.flags.highlight_weekends => CellPaint {
            role: PaintRole::Weekend,
            text_color: scheme.day_text.clone(),
            background: Some(scheme.weekend_background.clone()),
        },
        None => CellPaint {
            role: PaintRole::Default,
            text_color: scheme.day_text.clone(),
            background: None,
        },
    }
}

struct CellFactory<'a> {
    config: &'a CalendarConfig,
    scheme: &'a ColorScheme,
    annotations: &'a BTreeMap<NaiveDate, ResolvedAnnotation>,
    observer: Option<&'a Observer>,
}

impl CellFactory<'_> {
    fn cell(&self, entry: &DayEntry, bounds: Rect, day_name: Option<String>) -> DayCell {
        let weekend = self.config.is_weekend(entry.date.weekday());
        let annotation = self.annotations.get(&entry.date).cloned();
        let paint = paint(annotation.as_ref(), weekend, self.config, self.scheme);
        let show_moon = self.config.flags.show_moon_phases;
        let moon = show_moon.then(|| astro::moon_sample(entry.date, self.observer));
        let moon_timing = if show_moon { astro::moon_timing(entry.date, self.observer) } else { None };
        DayCell {
            date: entry.date,
            label: entry.label.clone(),
            secondary_label: entry.secondary.clone(),
            day_name,
            bounds,
            weekend,
            holiday: annotation.as_ref().is_some_and(|a| !a.source.is_custom()),
            annotation,
            paint,
            moon,
            moon_timing,
        }
    }
}

/// Lay out every month of the configured year.
///
/// `annotations` must already be resolved; `observer` is `None` when the
/// configuration has no location.
pub fn compute_layout(
    config: &CalendarConfig,
    scheme: &ColorScheme,
    annotations: &BTreeMap<NaiveDate, ResolvedAnnotation>,
    observer: Option<&Observer>,
) -> CalendarLayout {
    let months = match config.calendar_kind {
        CalendarKind::Standard => gregorian_months(config),
        CalendarKind::Hebrew => hebrew_months(config),
    };
    let title = calendar_title(config, &months);
    let factory = CellFactory { config, scheme, annotations, observer };

    let layout = match config.layout_style {
        LayoutStyle::Grid => grid_layout(config, &factory, &months, title),
        LayoutStyle::Traditional => traditional_layout(config, &factory, &months, title),
    };
    log::debug!(
        "laid out {} months ({:?}, {:.0}x{:.0})",
        layout.months.len(),
        layout.style,
        layout.width,
        layout.height
    );
    layout
}

fn grid_layout(
    config: &CalendarConfig,
    factory: &CellFactory<'_>,
    months: &[MonthDays],
    title: String,
) -> CalendarLayout {
    let flags = &config.flags;
    let compact = flags.compact_mode;
    let columns: usize = if compact { 4 } else { 3 };
    let cell_width = if compact { 30.0 } else { 40.0 };
    let cell_height = if compact { 26.0 } else { 36.0 };
    let margin = if compact { 18.0 } else { 36.0 };
    let gap = if compact { 10.0 } else { 20.0 };
    let title_height = if compact { 44.0 } else { 64.0 };
    let month_title_height = cell_height * 0.8;
    let day_names_height = if flags.show_day_names { cell_height * 0.5 } else { 0.0 };
    let week_column = if flags.show_week_numbers { cell_width * 0.6 } else { 0.0 };

    let month_width = week_column + 7.0 * cell_width;
    let month_height = month_title_height + day_names_height + f64::from(MAX_WEEK_ROWS) * cell_height;
    let grid_rows = months.len().div_ceil(columns).max(1);

    let width = 2.0 * margin + columns as f64 * month_width + (columns as f64 - 1.0) * gap;
    let height = 2.0 * margin + title_height + grid_rows as f64 * month_height + (grid_rows as f64 - 1.0) * gap;

    let geometry = Geometry {
        cell_width,
        cell_height,
        margin,
        title_size: title_height * 0.55,
        month_title_size: cell_height * 0.45,
        day_number_size: cell_height * 0.36,
        small_text_size: cell_height * 0.22,
    };
    let language = config.language();
    let first_day = config.first_day_of_week;

    let blocks = months
        .iter()
        .enumerate()
        .map(|(index, month)| {
            let x0 = margin + (index % columns) as f64 * (month_width + gap);
            let y0 = margin + title_height + (index / columns) as f64 * (month_height + gap);
            let cells_x = x0 + week_column;
            let cells_y = y0 + month_title_height + day_names_height;

            let day_names = if flags.show_day_names {
                (0..7u32)
                    .map(|column| {
                        let day = weekday_at(first_day, column);
                        Label::at(
                            locale::weekday_abbrev(&language, day),
                            cells_x + f64::from(column) * cell_width + cell_width / 2.0,
                            y0 + month_title_height + day_names_height * 0.75,
                        )
                    })
                    .collect()
            } else {
                vec![]
            };

            let mut row = 0u32;
            let mut cells = Vec::with_capacity(month.days.len());
            let mut week_numbers = vec![];
            for (i, entry) in month.days.iter().enumerate() {
                let column = first_day.column_of(entry.date.weekday());
                if i > 0 && column == 0 {
                    row += 1;
                }
                let row = row.min(MAX_WEEK_ROWS - 1);
                let bounds = Rect {
                    x: cells_x + f64::from(column) * cell_width,
                    y: cells_y + f64::from(row) * cell_height,
                    width: cell_width,
                    height: cell_height,
                };
                if flags.show_week_numbers && (i == 0 || column == 0) {
                    week_numbers.push(Label::at(
                        week_number(entry.date, first_day).to_string(),
                        x0 + week_column / 2.0,
                        bounds.y + cell_height * 0.6,
                    ));
                }
                cells.push(factory.cell(entry, bounds, None));
            }

            MonthBlock {
                index,
                title: Label::at(month.title.clone(), x0 + month_width / 2.0, y0 + month_title_height * 0.7),
                bounds: Rect { x: x0, y: y0, width: month_width, height: month_height },
                day_names,
                week_numbers,
                cells,
            }
        })
        .collect();

    CalendarLayout {
        kind: config.calendar_kind,
        style: LayoutStyle::Grid,
        width,
        height,
        title: Label::at(title, width / 2.0, margin + title_height * 0.7),
        geometry,
        scheme: factory.scheme.clone(),
        months: blocks,
    }
}

fn traditional_layout(
    config: &CalendarConfig,
    factory: &CellFactory<'_>,
    months: &[MonthDays],
    title: String,
) -> CalendarLayout {
    let flags = &config.flags;
    let compact = flags.compact_mode;
    let cell_width = if compact { 22.0 } else { 28.0 };
    let cell_height = if compact { 30.0 } else { 40.0 };
    let margin = if compact { 18.0 } else { 36.0 };
    let gap = if compact { 6.0 } else { 10.0 };
    let title_height = if compact { 44.0 } else { 64.0 };
    let label_width = if flags.rotate_month_names { cell_height * 0.9 } else { cell_width * 4.0 };
    let week_band = if flags.show_week_numbers { 12.0 } else { 0.0 };
    let row_height = cell_height + week_band;
    let longest = months.iter().map(|m| m.days.len()).max().unwrap_or(31);

    let width = 2.0 * margin + label_width + longest as f64 * cell_width;
    let rows = months.len().max(1) as f64;
    let height = 2.0 * margin + title_height + rows * row_height + (rows - 1.0) * gap;

    let geometry = Geometry {
        cell_width,
        cell_height,
        margin,
        title_size: title_height * 0.55,
        month_title_size: cell_height * 0.35,
        day_number_size: cell_height * 0.3,
        small_text_size: cell_height * 0.2,
    };
    let language = config.language();
    let first_day = config.first_day_of_week;

    let blocks = months
        .iter()
        .enumerate()
        .map(|(index, month)| {
            let y0 = margin + title_height + index as f64 * (row_height + gap);
            let cells_y = y0 + week_band;
            let title = if flags.rotate_month_names {
                Label {
                    text: month.title.clone(),
                    x: margin + label_width / 2.0,
                    y: cells_y + cell_height / 2.0,
                    rotate: Some(-90.0),
                }
            } else {
                Label::at(month.title.clone(), margin + label_width / 2.0, cells_y + cell_height * 0.6)
            };

            let mut cells = Vec::with_capacity(month.days.len());
            let mut week_numbers = vec![];
            for (i, entry) in month.days.iter().enumerate() {
                let bounds = Rect {
                    x: margin + label_width + i as f64 * cell_width,
                    y: cells_y,
                    width: cell_width,
                    height: cell_height,
                };
                let weekday = entry.date.weekday();
                if flags.show_week_numbers && first_day.column_of(weekday) == 0 {
                    week_numbers.push(Label::at(
                        week_number(entry.date, first_day).to_string(),
                        bounds.center_x(),
                        y0 + week_band * 0.8,
                    ));
                }
                let day_name = flags
                    .show_day_names
                    .then(|| locale::weekday_initial(&language, weekday));
                cells.push(factory.cell(entry, bounds, day_name));
            }

            MonthBlock {
                index,
                title,
                bounds: Rect {
                    x: margin,
                    y: y0,
                    width: label_width + month.days.len() as f64 * cell_width,
                    height: row_height,
                },
                day_names: vec![],
                week_numbers,
                cells,
            }
        })
        .collect();

    CalendarLayout {
        kind: config.calendar_kind,
        style: LayoutStyle::Traditional,
        width,
        height,
        title: Label::at(title, width / 2.0, margin + title_height * 0.7),
        geometry,
        scheme: factory.scheme.clone(),
        months: blocks,
    }
}

/// Weekday shown in `column` when weeks start on `first_day`.
fn weekday_at(first_day: FirstDayOfWeek, column: u32) -> Weekday {
    let mut day = first_day.weekday();
    for _ in 0..column {
        day = day.succ();
    }
    day
}
