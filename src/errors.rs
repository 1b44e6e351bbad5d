//! Error types for flegrei.
//!
//! Uses `thiserror` for library-style error definitions.

use thiserror::Error;

/// Errors raised while fetching or parsing the INGV feed.
///
/// Any of these halts the current pipeline run.
#[derive(Error, Debug)]
pub enum FetchFailure {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error status
    #[error("INGV API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// Delimited text could not be parsed
    #[error("Failed to parse feed text: {0}")]
    Parse(#[from] csv::Error),

    /// Response parsed but is missing required content
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Errors that can occur in flegrei operations.
#[derive(Error, Debug)]
pub enum FlegreiError {
    /// The feed could not be fetched or parsed
    #[error("fetch failure: {0}")]
    Fetch(#[from] FetchFailure),

    /// Date or bound selection is unusable
    #[error("invalid selection: {0}")]
    InvalidSelection(String),

    /// Output serialization failed
    #[error("failed to serialize output: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl FlegreiError {
    /// Whether this error came from the feed rather than from the input.
    #[must_use]
    pub fn is_fetch_failure(&self) -> bool {
        matches!(self, Self::Fetch(_))
    }

    /// Short machine-readable kind, used by the web UI.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Fetch(_) => "fetch_failure",
            Self::InvalidSelection(_) => "invalid_selection",
            Self::Serialize(_) => "serialize",
        }
    }
}
