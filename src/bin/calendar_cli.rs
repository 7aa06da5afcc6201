//! Calendar CLI - Bridge interface for the web tier
//!
//! Commands: themes, glyphs, validate, render, hebrew
//! Outputs JSON to stdout
//! Returns 2 on validation or render failure

use base64::Engine as _;
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;

use calendar_engine::{
    glyphs, hebrew,
    holidays::BuiltinHolidays,
    CalendarConfig, CalendarEngine, PrintSpec, ThemeRegistry,
};

#[derive(Parser)]
#[command(name = "calendar-cli")]
#[command(about = "Calendar CLI - Calendar Rendering Engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory with extra theme JSON files
    #[arg(short, long)]
    themes_dir: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Svg,
    Pdf,
}

#[derive(Subcommand)]
enum Commands {
    /// List available themes
    Themes,

    /// List symbols with a built-in glyph
    Glyphs,

    /// Validate a calendar configuration
    Validate {
        /// JSON payload (CalendarConfig)
        #[arg(short, long)]
        payload: String,
    },

    /// Render a calendar
    Render {
        /// JSON payload (CalendarConfig)
        #[arg(short, long)]
        payload: String,

        /// JSON file mapping YYYY-MM-DD to holiday names
        #[arg(long)]
        holidays: Option<PathBuf>,

        #[arg(short, long, value_enum, default_value = "svg")]
        format: OutputFormat,

        /// Write the document here instead of embedding it as base64
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Hebrew dates and holidays for a Gregorian year
    Hebrew {
        #[arg(short, long)]
        year: i32,
    },
}

fn load_holidays(path: &PathBuf) -> Result<BTreeMap<NaiveDate, String>, String> {
    let content = std::fs::read_to_string(path).map_err(|e| format!("Failed to read holidays: {}", e))?;
    serde_json::from_str(&content).map_err(|e| format!("Invalid holidays file: {}", e))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let registry = match &cli.themes_dir {
        Some(dir) => match ThemeRegistry::load_from_dir(dir) {
            Ok(r) => r,
            Err(e) => {
                eprintln!(r#"{{"error": "Failed to load themes: {}"}}"#, e);
                return ExitCode::FAILURE;
            }
        },
        None => ThemeRegistry::builtin(),
    };

    let engine = CalendarEngine::new(&registry, &BuiltinHolidays, glyphs::builtin());

    match cli.command {
        Commands::Themes => {
            let themes: Vec<_> = engine.themes().list()
                .iter()
                .map(|t| serde_json::json!({
                    "id": t.id,
                    "name": t.name,
                    "description": t.description,
                    "deprecated": t.deprecated,
                }))
                .collect();

            println!("{}", serde_json::to_string_pretty(&themes).unwrap());
            ExitCode::SUCCESS
        }

        Commands::Glyphs => {
            let table = glyphs::builtin();
            let entries: Vec<_> = table.symbols()
                .into_iter()
                .map(|symbol| {
                    let id = |variant| glyphs::GlyphProvider::lookup(table, &symbol, variant).map(|a| a.id);
                    serde_json::json!({
                        "symbol": symbol,
                        "color": id(glyphs::GlyphVariant::Color),
                        "mono": id(glyphs::GlyphVariant::Mono),
                    })
                })
                .collect();

            println!("{}", serde_json::to_string_pretty(&entries).unwrap());
            ExitCode::SUCCESS
        }

        Commands::Validate { payload } => {
            let config = match CalendarConfig::from_json(&payload) {
                Ok(c) => c,
                Err(e) => {
                    let output = serde_json::json!({"valid": false, "error": e.to_string()});
                    println!("{}", serde_json::to_string(&output).unwrap());
                    return ExitCode::from(2);
                }
            };

            match engine.validate(&config) {
                Ok(report) => {
                    let output = serde_json::json!({"valid": true, "report": report});
                    println!("{}", serde_json::to_string_pretty(&output).unwrap());
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    let output = serde_json::json!({"valid": false, "error": e.to_string()});
                    println!("{}", serde_json::to_string(&output).unwrap());
                    ExitCode::from(2)  // Validation failure
                }
            }
        }

        Commands::Render { payload, holidays, format, out } => {
            let config = match CalendarConfig::from_json(&payload) {
                Ok(c) => c,
                Err(e) => {
                    let output = serde_json::json!({"success": false, "error": e.to_string()});
                    println!("{}", serde_json::to_string(&output).unwrap());
                    return ExitCode::from(2);
                }
            };

            let holiday_map = match holidays.as_ref().map(load_holidays).transpose() {
                Ok(map) => map.unwrap_or_default(),
                Err(e) => {
                    println!(r#"{{"success": false, "error": "{}"}}"#, e);
                    return ExitCode::FAILURE;
                }
            };

            let rendered = match format {
                OutputFormat::Svg => engine
                    .render_vector(&config, &holiday_map)
                    .map_err(calendar_engine::EngineError::from)
                    .and_then(|doc| {
                        let manifest = engine.manifest(&config, &doc)?;
                        Ok((doc.into_string().into_bytes(), manifest))
                    }),
                OutputFormat::Pdf => engine
                    .render_print(&config, &holiday_map, &PrintSpec::default())
                    .map(|r| (r.print.into_bytes(), r.manifest)),
            };

            match rendered {
                Ok((bytes, manifest)) => {
                    let mut output = serde_json::json!({
                        "success": true,
                        "manifest": manifest,
                    });
                    match out {
                        Some(path) => {
                            if let Err(e) = std::fs::write(&path, &bytes) {
                                println!(r#"{{"success": false, "error": "Failed to write output: {}"}}"#, e);
                                return ExitCode::FAILURE;
                            }
                            output["path"] = serde_json::json!(path);
                        }
                        None => {
                            output["data_base64"] = serde_json::json!(
                                base64::engine::general_purpose::STANDARD.encode(&bytes)
                            );
                        }
                    }
                    println!("{}", serde_json::to_string_pretty(&output).unwrap());
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    let output = serde_json::json!({
                        "success": false,
                        "error": e.to_string(),
                    });
                    println!("{}", serde_json::to_string(&output).unwrap());
                    ExitCode::from(2)  // Render failure
                }
            }
        }

        Commands::Hebrew { year } => {
            let hebrew_year = year + 3760;
            let output = serde_json::json!({
                "gregorianYear": year,
                "hebrewYear": hebrew_year,
                "leapYear": hebrew::is_leap_year(hebrew_year),
                "months": hebrew::months_in_year(hebrew_year),
                "days": hebrew::year_mapping(year),
            });
            println!("{}", serde_json::to_string_pretty(&output).unwrap());
            ExitCode::SUCCESS
        }
    }
}
