//! INGV FDSN event service client.
//!
//! Provides blocking HTTP access to the INGV earthquake catalogue.
//! Uses reqwest with rustls for TLS and `csv` for the pipe-delimited body.

use std::time::Duration;

use chrono::NaiveDate;
use reqwest::StatusCode;
use reqwest::Url;
use reqwest::blocking::Client;
use tracing::{debug, instrument};

use crate::config::{
    FEED_LIMIT, FEED_MAX_DEPTH_KM, FEED_MAX_MAGNITUDE, FEED_MIN_DEPTH_KM, FEED_MIN_MAGNITUDE,
    FEED_MIN_VERSION, INGV_QUERY_URL, REGION_MAX_LAT, REGION_MAX_LON, REGION_MIN_LAT,
    REGION_MIN_LON,
};
use crate::errors::FetchFailure;
use crate::models::{EventRecord, FeedRow, REQUIRED_COLUMNS};
use crate::range::DateRange;

/// Default request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// User agent string for API requests.
const USER_AGENT: &str = concat!("flegrei/", env!("CARGO_PKG_VERSION"));

/// Anything that can produce the raw event list for a date range.
pub trait EventSource {
    /// Fetch every event in `range`.
    ///
    /// # Errors
    ///
    /// Returns a `FetchFailure` if the events cannot be retrieved or parsed.
    fn fetch_events(&self, range: &DateRange) -> Result<Vec<EventRecord>, FetchFailure>;
}

/// Start of the first day, as the feed expects it.
fn start_of_day(date: NaiveDate) -> String {
    format!("{}T00:00:00", date.format("%Y-%m-%d"))
}

/// Last second of the last day.
fn end_of_day(date: NaiveDate) -> String {
    format!("{}T23:59:59", date.format("%Y-%m-%d"))
}

/// Build the full query URL for a date range.
///
/// # Errors
///
/// Returns `InvalidResponse` only if `base_url` itself is malformed.
pub fn build_query_url(base_url: &str, range: &DateRange) -> Result<Url, FetchFailure> {
    let params = [
        ("starttime", start_of_day(range.start)),
        ("endtime", end_of_day(range.end)),
        ("minmag", FEED_MIN_MAGNITUDE.to_string()),
        ("maxmag", FEED_MAX_MAGNITUDE.to_string()),
        ("mindepth", FEED_MIN_DEPTH_KM.to_string()),
        ("maxdepth", FEED_MAX_DEPTH_KM.to_string()),
        ("minlat", REGION_MIN_LAT.to_string()),
        ("maxlat", REGION_MAX_LAT.to_string()),
        ("minlon", REGION_MIN_LON.to_string()),
        ("maxlon", REGION_MAX_LON.to_string()),
        ("minversion", FEED_MIN_VERSION.to_string()),
        ("orderby", "time-asc".to_string()),
        ("format", "text".to_string()),
        ("limit", FEED_LIMIT.to_string()),
    ];

    Url::parse_with_params(base_url, &params)
        .map_err(|e| FetchFailure::InvalidResponse(format!("bad feed URL '{base_url}': {e}")))
}

/// Parse a pipe-delimited feed body.
///
/// An empty body means no events. A body whose header lacks any required
/// column, or with a row that does not parse, is rejected as a whole.
///
/// # Errors
///
/// Returns `Parse` or `InvalidResponse` on malformed text.
pub fn parse_feed(text: &str) -> Result<Vec<EventRecord>, FetchFailure> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'|')
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|col| !headers.iter().any(|h| h == *col))
        .collect();
    if !missing.is_empty() {
        return Err(FetchFailure::InvalidResponse(format!(
            "missing columns: {}",
            missing.join(", ")
        )));
    }

    let mut records = Vec::new();
    for row in reader.deserialize::<FeedRow>() {
        records.push(EventRecord::try_from(row?)?);
    }
    Ok(records)
}

/// Client for the INGV event service.
pub struct IngvClient {
    client: Client,
    base_url: String,
}

impl IngvClient {
    /// Create a new INGV client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new() -> Result<Self, FetchFailure> {
        Self::with_base_url(INGV_QUERY_URL)
    }

    /// Create a client against another FDSN endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn with_base_url(base_url: &str) -> Result<Self, FetchFailure> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }
}

impl EventSource for IngvClient {
    #[instrument(skip(self), fields(start = %range.start, end = %range.end))]
    fn fetch_events(&self, range: &DateRange) -> Result<Vec<EventRecord>, FetchFailure> {
        let url = build_query_url(&self.base_url, range)?;

        debug!("fetching events from {}", url);

        let response = self.client.get(url).send()?;

        // FDSN services answer an empty result with 204
        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            debug!("feed returned no events");
            return Ok(Vec::new());
        }
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(FetchFailure::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let text = response.text()?;
        let records = parse_feed(&text)?;

        debug!("fetched {} events", records.len());
        Ok(records)
    }
}
