//! Output formatters for the filtered event table.
//!
//! Supports human-readable (with 24-bit bin colors), JSON, and NDJSON formats.

use std::io::{self, Write};

use crate::filters::BinLegend;
use crate::models::{OutputEvent, ShapedEvent};
use crate::palette::Rgb;

// ANSI codes
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

const ICON_QUAKE: &str = "🌋";

/// Output format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// Human-readable terminal output (default)
    #[default]
    Human,
    /// JSON array
    Json,
    /// Newline-delimited JSON (one object per line)
    Ndjson,
}

impl std::str::FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" => Ok(Self::Human),
            "json" => Ok(Self::Json),
            "ndjson" => Ok(Self::Ndjson),
            _ => Err(format!("unknown format: {s} (expected: human, json, ndjson)")),
        }
    }
}

/// Foreground escape for a bin color.
fn fg(color: Rgb) -> String {
    format!("\x1b[38;2;{};{};{}m", color.r(), color.g(), color.b())
}

/// Get severity label for magnitude.
fn magnitude_label(mag: f64) -> &'static str {
    match mag {
        m if m >= 4.0 => "LIGHT",
        m if m >= 3.0 => "MINOR",
        m if m >= 2.0 => "FELT",
        m if m >= 0.0 => "MICRO",
        _ => "SUB-ZERO",
    }
}

/// Write events in human-readable format, one line each, colored by bin.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_human<W: Write>(writer: &mut W, events: &[ShapedEvent]) -> io::Result<()> {
    for event in events {
        let record = &event.record;
        let time = record.time.format("%Y-%m-%d %H:%M:%S");
        let mag_type = record.magnitude_type.as_deref().unwrap_or("?");
        let color = fg(event.color);
        let label = magnitude_label(record.magnitude);

        writeln!(
            writer,
            "{ICON_QUAKE} {color}{BOLD}M{mag:.1}{RESET} {DIM}{mag_type}{RESET} │ \
             {color}{label:8}{RESET} │ \
             {DIM}{depth:>5.1}km{RESET} │ \
             {time} UTC │ \
             {lat:.4}°N {lon:.4}°E │ \
             {place}",
            mag = record.magnitude,
            depth = record.depth_km,
            lat = event.point.y(),
            lon = event.point.x(),
            place = record.location_name,
        )?;
    }
    Ok(())
}

/// Write a bin legend line, e.g. for the end of a human listing.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_legend<W: Write>(writer: &mut W, legend: &[BinLegend]) -> io::Result<()> {
    if legend.is_empty() {
        return Ok(());
    }
    let entries: Vec<String> = legend
        .iter()
        .map(|b| {
            format!(
                "{}■{RESET} {:.1}–{:.1} {DIM}{}{RESET}",
                fg(b.color),
                b.min,
                b.max,
                b.hex
            )
        })
        .collect();
    writeln!(writer, "{DIM}bins:{RESET} {}", entries.join("  "))
}

/// Write events as a JSON array.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_json<W: Write>(writer: &mut W, events: &[ShapedEvent]) -> io::Result<()> {
    let output: Vec<OutputEvent> = events.iter().map(OutputEvent::from).collect();
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(writer, "{json}")
}

/// Write events as newline-delimited JSON.
///
/// Each event is written as a single line of JSON.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_ndjson<W: Write>(writer: &mut W, events: &[ShapedEvent]) -> io::Result<()> {
    for event in events {
        let output = OutputEvent::from(event);
        let json = serde_json::to_string(&output)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        writeln!(writer, "{json}")?;
    }
    Ok(())
}

/// Write events in the specified format.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_events<W: Write>(
    writer: &mut W,
    events: &[ShapedEvent],
    format: Format,
) -> io::Result<()> {
    match format {
        Format::Human => write_human(writer, events),
        Format::Json => write_json(writer, events),
        Format::Ndjson => write_ndjson(writer, events),
    }
}
