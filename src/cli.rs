//! Command-line interface definitions.
//!
//! Uses clap derive API for argument parsing.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::config::DEFAULT_BIN_COUNT;
use crate::dashboard::PanelId;
use crate::errors::FlegreiError;
use crate::output::Format;
use crate::range::{DateRange, Selection};

/// Campi Flegrei seismicity from the INGV catalogue, as tables and maps.
#[derive(Parser, Debug)]
#[command(name = "flegrei")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Command to run
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose debug logging
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    pub quiet: bool,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the filtered events
    Events(EventsArgs),

    /// Print the dashboard panels as JSON
    Layers(LayersArgs),

    /// Start the web dashboard
    Ui(UiArgs),
}

/// Date and bound selection shared by the data commands.
#[derive(Args, Debug, Clone)]
pub struct SelectionArgs {
    /// First day (YYYY-MM-DD, defaults to a week ago)
    #[arg(long, value_parser = parse_date)]
    pub start: Option<NaiveDate>,

    /// Last day (YYYY-MM-DD, defaults to today)
    #[arg(long, value_parser = parse_date)]
    pub end: Option<NaiveDate>,

    /// Minimum magnitude (defaults to the smallest fetched)
    #[arg(long, allow_negative_numbers = true)]
    pub min_magnitude: Option<f64>,

    /// Maximum magnitude (defaults to the largest fetched)
    #[arg(long, allow_negative_numbers = true)]
    pub max_magnitude: Option<f64>,

    /// Minimum depth in km (defaults to the shallowest fetched)
    #[arg(long, allow_negative_numbers = true)]
    pub min_depth: Option<f64>,

    /// Maximum depth in km (defaults to the deepest fetched)
    #[arg(long, allow_negative_numbers = true)]
    pub max_depth: Option<f64>,

    /// Number of magnitude color bins
    #[arg(long, default_value_t = DEFAULT_BIN_COUNT)]
    pub bins: usize,
}

impl SelectionArgs {
    /// Turn the flags into a selection for `today`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSelection` if the dates are out of order or fall
    /// entirely outside the selectable window.
    pub fn to_selection(&self, today: NaiveDate) -> Result<Selection, FlegreiError> {
        let defaults = Selection::default_for(today);
        let start = self.start.unwrap_or(defaults.date_range.start);
        let end = self.end.unwrap_or(defaults.date_range.end);

        Ok(Selection {
            date_range: DateRange::new(start, end)?.clamp(today)?,
            min_magnitude: self.min_magnitude,
            max_magnitude: self.max_magnitude,
            min_depth: self.min_depth,
            max_depth: self.max_depth,
            bins: self.bins,
        })
    }
}

/// Arguments for the `events` command.
#[derive(Parser, Debug)]
pub struct EventsArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Maximum number of events to show
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,

    /// Output format
    #[arg(long, short = 'f', default_value = "human", value_parser = parse_format)]
    pub format: Format,
}

/// Arguments for the `layers` command.
#[derive(Parser, Debug)]
pub struct LayersArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Only emit this panel (grid, heatmap, hexagon, scatter, timelapse, table)
    #[arg(long, value_parser = parse_panel)]
    pub panel: Option<PanelId>,

    /// Pretty-print the JSON
    #[arg(long)]
    pub pretty: bool,
}

/// Arguments for the `ui` command.
#[derive(Parser, Debug)]
pub struct UiArgs {
    /// Port to listen on
    #[arg(long, short = 'p', default_value = "8080")]
    pub port: u16,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Open browser automatically
    #[arg(long)]
    pub open: bool,
}

/// Parse a calendar date from string.
fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| format!("invalid date '{s}' (expected YYYY-MM-DD): {e}"))
}

/// Parse an output format from string.
fn parse_format(s: &str) -> Result<Format, String> {
    s.parse()
}

/// Parse a panel name from string.
fn parse_panel(s: &str) -> Result<PanelId, String> {
    s.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_events_command() {
        let cli = Cli::try_parse_from([
            "flegrei",
            "events",
            "--start",
            "2024-05-13",
            "--min-magnitude",
            "-0.5",
            "-f",
            "ndjson",
        ])
        .unwrap();

        let Command::Events(args) = cli.command else {
            panic!("expected events command");
        };
        assert_eq!(args.selection.start, Some(date("2024-05-13")));
        assert_eq!(args.selection.min_magnitude, Some(-0.5));
        assert_eq!(args.selection.bins, 3);
        assert_eq!(args.format, Format::Ndjson);
    }

    #[test]
    fn test_parse_layers_panel() {
        let cli = Cli::try_parse_from(["flegrei", "layers", "--panel", "hexagon", "--verbose"])
            .unwrap();
        assert!(cli.verbose);
        let Command::Layers(args) = cli.command else {
            panic!("expected layers command");
        };
        assert_eq!(args.panel, Some(PanelId::Hexagon));
    }

    #[test]
    fn test_bad_date_rejected() {
        assert!(Cli::try_parse_from(["flegrei", "events", "--start", "13/05/2024"]).is_err());
    }

    #[test]
    fn test_selection_defaults_to_last_week() {
        let args = SelectionArgs {
            start: None,
            end: None,
            min_magnitude: None,
            max_magnitude: None,
            min_depth: None,
            max_depth: None,
            bins: 3,
        };
        let selection = args.to_selection(date("2024-05-20")).unwrap();
        assert_eq!(selection.date_range.start, date("2024-05-13"));
        assert_eq!(selection.date_range.end, date("2024-05-20"));
    }

    #[test]
    fn test_selection_out_of_order() {
        let args = SelectionArgs {
            start: Some(date("2024-05-19")),
            end: Some(date("2024-05-12")),
            min_magnitude: None,
            max_magnitude: None,
            min_depth: None,
            max_depth: None,
            bins: 3,
        };
        assert!(args.to_selection(date("2024-05-20")).is_err());
    }
}
