//! Data models for INGV FDSN text responses.
//!
//! The feed answers `format=text` queries with pipe-delimited rows under a
//! header line such as:
//!
//! ```text
//! #EventID|Time|Latitude|Longitude|Depth/Km|Author|Catalog|Contributor|ContributorID|MagType|Magnitude|MagAuthor|EventLocationName|EventType
//! ```

use chrono::{NaiveDate, NaiveDateTime};
use geo::Point;
use serde::{Deserialize, Serialize};

use crate::errors::FetchFailure;
use crate::palette::Rgb;

/// Header columns every response must carry.
pub const REQUIRED_COLUMNS: [&str; 6] = [
    "Time",
    "Latitude",
    "Longitude",
    "Depth/Km",
    "Magnitude",
    "EventLocationName",
];

/// One raw row of the text feed. Unlisted columns are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedRow {
    #[serde(rename = "#EventID", default)]
    pub event_id: Option<String>,

    #[serde(rename = "Time")]
    pub time: String,

    #[serde(rename = "Latitude")]
    pub latitude: f64,

    #[serde(rename = "Longitude")]
    pub longitude: f64,

    #[serde(rename = "Depth/Km")]
    pub depth_km: f64,

    #[serde(rename = "MagType", default)]
    pub magnitude_type: Option<String>,

    #[serde(rename = "Magnitude")]
    pub magnitude: f64,

    #[serde(rename = "EventLocationName")]
    pub location_name: String,
}

/// A single seismic event as returned by the feed.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    pub event_id: Option<String>,
    /// Origin time (UTC, as reported)
    pub time: NaiveDateTime,
    pub latitude: f64,
    pub longitude: f64,
    pub depth_km: f64,
    /// May be negative for micro-events
    pub magnitude: f64,
    pub magnitude_type: Option<String>,
    pub location_name: String,
}

impl TryFrom<FeedRow> for EventRecord {
    type Error = FetchFailure;

    fn try_from(row: FeedRow) -> Result<Self, Self::Error> {
        let time = row.time.trim().parse::<NaiveDateTime>().map_err(|e| {
            FetchFailure::InvalidResponse(format!("bad event time '{}': {e}", row.time))
        })?;

        Ok(Self {
            event_id: row.event_id.filter(|id| !id.is_empty()),
            time,
            latitude: row.latitude,
            longitude: row.longitude,
            depth_km: row.depth_km,
            magnitude: row.magnitude,
            magnitude_type: row.magnitude_type.filter(|t| !t.is_empty() && t != "--"),
            location_name: row.location_name,
        })
    }
}

/// An event that survived filtering, with its derived display fields.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapedEvent {
    pub record: EventRecord,
    /// (longitude, latitude) in WGS84
    pub point: Point<f64>,
    /// Zero-based magnitude bin
    pub bin: usize,
    pub color: Rgb,
    /// Animation frame key
    pub calendar_date: NaiveDate,
}

/// Simplified event for output.
///
/// This is the normalized structure we emit in JSON/NDJSON output and in
/// the dashboard's event table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputEvent {
    pub id: Option<String>,
    pub time: String,
    pub date: NaiveDate,
    pub magnitude: f64,
    pub magnitude_type: Option<String>,
    pub depth_km: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub location: String,
    pub bin: usize,
    pub color: Rgb,
}

impl From<&ShapedEvent> for OutputEvent {
    fn from(e: &ShapedEvent) -> Self {
        Self {
            id: e.record.event_id.clone(),
            time: e.record.time.format("%Y-%m-%dT%H:%M:%S%.3f").to_string(),
            date: e.calendar_date,
            magnitude: e.record.magnitude,
            magnitude_type: e.record.magnitude_type.clone(),
            depth_km: e.record.depth_km,
            latitude: e.point.y(),
            longitude: e.point.x(),
            location: e.record.location_name.clone(),
            bin: e.bin,
            color: e.color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(time: &str) -> FeedRow {
        FeedRow {
            event_id: Some("38715631".into()),
            time: time.into(),
            latitude: 40.8258,
            longitude: 14.1435,
            depth_km: 2.6,
            magnitude_type: Some("Md".into()),
            magnitude: 4.4,
            location_name: "Campi Flegrei".into(),
        }
    }

    #[test]
    fn test_record_from_row_with_fraction() {
        let record = EventRecord::try_from(row("2024-05-20T18:10:00.120000")).unwrap();
        assert_eq!(record.time.format("%H:%M:%S").to_string(), "18:10:00");
        assert_eq!(record.magnitude_type.as_deref(), Some("Md"));
    }

    #[test]
    fn test_record_from_row_without_fraction() {
        let record = EventRecord::try_from(row("2024-05-20T18:10:00")).unwrap();
        assert_eq!(record.time.date().to_string(), "2024-05-20");
    }

    #[test]
    fn test_record_rejects_bad_time() {
        let err = EventRecord::try_from(row("yesterday")).unwrap_err();
        assert!(matches!(err, FetchFailure::InvalidResponse(_)));
    }

    #[test]
    fn test_placeholder_mag_type_dropped() {
        let mut r = row("2024-05-20T18:10:00");
        r.magnitude_type = Some("--".into());
        let record = EventRecord::try_from(r).unwrap();
        assert!(record.magnitude_type.is_none());
    }
}
