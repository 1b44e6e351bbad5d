//! Geographic projection of shaped events.
//!
//! Events are placed as 2D WGS84 points; depth stays a plain attribute.

use geo::{Centroid, MultiPoint, Point};
use serde::Serialize;

use crate::filters::{MagnitudeBins, ShapedTable};
use crate::models::{EventRecord, ShapedEvent};

/// Coordinate reference system tag for a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Crs {
    /// Geographic lon/lat on the WGS84 ellipsoid
    #[default]
    #[serde(rename = "EPSG:4326")]
    Wgs84,
}

/// A map position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatLon {
    pub latitude: f64,
    pub longitude: f64,
}

/// Point geometry for an event: x = longitude, y = latitude.
#[must_use]
pub fn point_for(record: &EventRecord) -> Point<f64> {
    Point::new(record.longitude, record.latitude)
}

/// Shaped events with a reference system attached.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoTable {
    pub crs: Crs,
    pub events: Vec<ShapedEvent>,
    pub bins: Option<MagnitudeBins>,
}

impl GeoTable {
    #[must_use]
    pub fn project(table: ShapedTable) -> Self {
        Self {
            crs: Crs::Wgs84,
            events: table.events,
            bins: table.bins,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Arithmetic mean of latitudes and longitudes.
    ///
    /// `None` for an empty table: there is nothing to average.
    #[must_use]
    pub fn mean_center(&self) -> Option<LatLon> {
        let points: MultiPoint<f64> = self.events.iter().map(|e| e.point).collect();
        points.centroid().map(|c| LatLon {
            latitude: c.y(),
            longitude: c.x(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::shape;
    use crate::range::{DateRange, FilterCriteria};

    fn record(lat: f64, lon: f64) -> EventRecord {
        EventRecord {
            event_id: None,
            time: "2024-05-20T10:00:00".parse().unwrap(),
            latitude: lat,
            longitude: lon,
            depth_km: 2.0,
            magnitude: 1.0,
            magnitude_type: None,
            location_name: "Campi Flegrei".into(),
        }
    }

    fn table(records: Vec<EventRecord>) -> GeoTable {
        let criteria = FilterCriteria {
            date_range: DateRange::new("2024-05-20".parse().unwrap(), "2024-05-20".parse().unwrap())
                .unwrap(),
            magnitude: None,
            depth_km: None,
            location: "Campi Flegrei".into(),
        };
        GeoTable::project(shape(records, &criteria, 3))
    }

    #[test]
    fn test_point_axis_order() {
        let p = point_for(&record(40.8, 14.1));
        assert!((p.x() - 14.1).abs() < 1e-12);
        assert!((p.y() - 40.8).abs() < 1e-12);
    }

    #[test]
    fn test_mean_center() {
        let t = table(vec![
            record(40.80, 14.10),
            record(40.84, 14.16),
            record(40.83, 14.14),
        ]);
        let center = t.mean_center().unwrap();
        assert!((center.latitude - 40.823_333_333).abs() < 1e-6);
        assert!((center.longitude - 14.133_333_333).abs() < 1e-6);
        assert_eq!(serde_json::to_value(t.crs).unwrap(), "EPSG:4326");
    }

    #[test]
    fn test_mean_center_empty() {
        let t = table(Vec::new());
        assert!(t.is_empty());
        assert!(t.mean_center().is_none());
    }
}
