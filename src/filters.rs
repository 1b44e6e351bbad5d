//! Event filtering and shaping.
//!
//! Every step here is a pure transformation: location match, inclusive
//! magnitude and depth ranges, then magnitude binning into the warm ramp
//! and calendar-date extraction for the timelapse.

use serde::Serialize;
use tracing::debug;

use crate::models::{EventRecord, ShapedEvent};
use crate::palette::{Rgb, warm_ramp};
use crate::projection;
use crate::range::{Bounds, FilterCriteria};

/// Keep only events whose location label equals `location` exactly.
#[must_use]
pub fn by_location(records: Vec<EventRecord>, location: &str) -> Vec<EventRecord> {
    records
        .into_iter()
        .filter(|r| r.location_name == location)
        .collect()
}

impl FilterCriteria {
    /// Check if an event passes all filter criteria.
    #[must_use]
    pub fn matches(&self, event: &EventRecord) -> bool {
        self.check_location(event) && self.check_magnitude(event) && self.check_depth(event)
    }

    fn check_location(&self, event: &EventRecord) -> bool {
        event.location_name == self.location
    }

    fn check_magnitude(&self, event: &EventRecord) -> bool {
        self.magnitude.is_none_or(|b| b.contains(event.magnitude))
    }

    fn check_depth(&self, event: &EventRecord) -> bool {
        self.depth_km.is_none_or(|b| b.contains(event.depth_km))
    }
}

/// Equal-width magnitude bins, each tied to one ramp color.
///
/// Intervals are closed on the right, except the lowest which also
/// includes its left edge: `[e0, e1], (e1, e2], ..., (en-1, en]`.
#[derive(Debug, Clone, PartialEq)]
pub struct MagnitudeBins {
    edges: Vec<f64>,
    colors: Vec<Rgb>,
}

/// One legend entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinLegend {
    pub min: f64,
    pub max: f64,
    pub color: Rgb,
    /// CSS form of `color`
    pub hex: String,
}

impl MagnitudeBins {
    /// Split the span of `magnitudes` into `count` bins.
    ///
    /// Returns `None` for an empty input or a zero count.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn fit(magnitudes: &[f64], count: usize) -> Option<Self> {
        if count == 0 {
            return None;
        }
        let span = Bounds::spanning(magnitudes.iter().copied())?;
        let width = span.width() / count as f64;

        let mut edges: Vec<f64> = (0..count).map(|i| span.min + width * i as f64).collect();
        edges.push(span.max);

        Some(Self {
            edges,
            colors: warm_ramp(count),
        })
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.colors.len()
    }

    #[must_use]
    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    /// Bin index for a magnitude. Values beyond the fitted span fall into
    /// the nearest end bin.
    #[must_use]
    pub fn index_of(&self, magnitude: f64) -> usize {
        let last = self.count() - 1;
        self.edges[1..]
            .iter()
            .position(|&upper| magnitude <= upper)
            .unwrap_or(last)
    }

    #[must_use]
    pub fn color_of(&self, magnitude: f64) -> Rgb {
        self.colors[self.index_of(magnitude)]
    }

    #[must_use]
    pub fn legend(&self) -> Vec<BinLegend> {
        self.edges
            .windows(2)
            .zip(&self.colors)
            .map(|(pair, &color)| BinLegend {
                min: pair[0],
                max: pair[1],
                color,
                hex: color.hex(),
            })
            .collect()
    }
}

/// Filtered, colored events plus the bins used to color them.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapedTable {
    pub events: Vec<ShapedEvent>,
    /// `None` when nothing survived the filters
    pub bins: Option<MagnitudeBins>,
}

/// Filter `records` and derive per-event display fields.
///
/// Bins are fitted to the magnitudes that survive filtering, not to the
/// raw feed.
#[must_use]
pub fn shape(records: Vec<EventRecord>, criteria: &FilterCriteria, bin_count: usize) -> ShapedTable {
    let total = records.len();
    let kept: Vec<EventRecord> = records.into_iter().filter(|r| criteria.matches(r)).collect();

    let magnitudes: Vec<f64> = kept.iter().map(|r| r.magnitude).collect();
    let bins = MagnitudeBins::fit(&magnitudes, bin_count);

    debug!(
        "kept {} of {} events, bin edges {:?}",
        kept.len(),
        total,
        bins.as_ref().map(MagnitudeBins::edges)
    );

    let events = match &bins {
        None => Vec::new(),
        Some(bins) => kept
            .into_iter()
            .map(|record| {
                let bin = bins.index_of(record.magnitude);
                ShapedEvent {
                    point: projection::point_for(&record),
                    color: bins.color_of(record.magnitude),
                    calendar_date: record.time.date(),
                    bin,
                    record,
                }
            })
            .collect(),
    };

    ShapedTable { events, bins }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::range::DateRange;

    fn event(location: &str, magnitude: f64, depth_km: f64, time: &str) -> EventRecord {
        EventRecord {
            event_id: None,
            time: time.parse().unwrap(),
            latitude: 40.83,
            longitude: 14.14,
            depth_km,
            magnitude,
            magnitude_type: Some("Md".into()),
            location_name: location.into(),
        }
    }

    fn criteria(magnitude: Option<Bounds>, depth_km: Option<Bounds>) -> FilterCriteria {
        FilterCriteria {
            date_range: DateRange::new("2024-05-13".parse().unwrap(), "2024-05-20".parse().unwrap())
                .unwrap(),
            magnitude,
            depth_km,
            location: "Campi Flegrei".into(),
        }
    }

    #[test]
    fn test_location_exact_match_only() {
        let records = vec![
            event("Campi Flegrei", 1.0, 2.0, "2024-05-20T01:00:00"),
            event("campi flegrei", 1.0, 2.0, "2024-05-20T01:00:00"),
            event("Campi Flegrei (NA)", 1.0, 2.0, "2024-05-20T01:00:00"),
            event(" Campi Flegrei", 1.0, 2.0, "2024-05-20T01:00:00"),
        ];
        let kept = by_location(records, "Campi Flegrei");
        assert_eq!(kept.len(), 1);
        assert!(kept.iter().all(|r| r.location_name == "Campi Flegrei"));
    }

    #[test]
    fn test_ranges_inclusive() {
        let c = criteria(
            Some(Bounds { min: 0.5, max: 2.0 }),
            Some(Bounds { min: 1.0, max: 3.0 }),
        );
        assert!(c.matches(&event("Campi Flegrei", 0.5, 1.0, "2024-05-20T01:00:00")));
        assert!(c.matches(&event("Campi Flegrei", 2.0, 3.0, "2024-05-20T01:00:00")));
        assert!(!c.matches(&event("Campi Flegrei", 2.01, 2.0, "2024-05-20T01:00:00")));
        assert!(!c.matches(&event("Campi Flegrei", 1.0, 3.5, "2024-05-20T01:00:00")));
        assert!(!c.matches(&event("Pozzuoli", 1.0, 2.0, "2024-05-20T01:00:00")));
    }

    #[test]
    fn test_bins_scenario() {
        let bins = MagnitudeBins::fit(&[0.5, 1.2, 1.2, 3.9, 4.4], 3).unwrap();
        let edges = bins.edges();
        assert_eq!(edges.len(), 4);
        assert!((edges[1] - 1.8).abs() < 1e-9);
        assert!((edges[2] - 3.1).abs() < 1e-9);
        assert!((edges[3] - 4.4).abs() < 1e-12);

        let indices: Vec<usize> = [0.5, 1.2, 1.2, 3.9, 4.4]
            .iter()
            .map(|&m| bins.index_of(m))
            .collect();
        assert_eq!(indices, vec![0, 0, 0, 2, 2]);
        assert_eq!(bins.color_of(0.5), bins.color_of(1.2));
        assert_eq!(bins.color_of(3.9), bins.color_of(4.4));
        assert_ne!(bins.color_of(0.5), bins.color_of(4.4));
    }

    #[test]
    fn test_bins_right_closed_edges() {
        let bins = MagnitudeBins::fit(&[0.0, 3.0], 3).unwrap();
        assert_eq!(bins.index_of(0.0), 0);
        assert_eq!(bins.index_of(1.0), 0);
        assert_eq!(bins.index_of(1.000_001), 1);
        assert_eq!(bins.index_of(2.0), 1);
        assert_eq!(bins.index_of(3.0), 2);
    }

    #[test]
    fn test_bins_degenerate_span() {
        let bins = MagnitudeBins::fit(&[1.5, 1.5], 3).unwrap();
        assert_eq!(bins.index_of(1.5), 0);
        assert!(MagnitudeBins::fit(&[], 3).is_none());
        assert!(MagnitudeBins::fit(&[1.0], 0).is_none());
    }

    #[test]
    fn test_legend_covers_span() {
        let bins = MagnitudeBins::fit(&[-0.4, 2.6], 3).unwrap();
        let legend = bins.legend();
        assert_eq!(legend.len(), 3);
        assert!((legend[0].min - (-0.4)).abs() < 1e-12);
        assert!((legend[2].max - 2.6).abs() < 1e-12);
        assert_eq!(legend[0].hex, "#ffffcc");
    }

    #[test]
    fn test_shape_counts_and_colors() {
        let records = vec![
            event("Campi Flegrei", 0.5, 2.0, "2024-05-18T01:00:00"),
            event("Campi Flegrei", 1.2, 2.5, "2024-05-18T23:59:59"),
            event("Campi Flegrei", 1.2, 1.0, "2024-05-19T00:00:00"),
            event("Campi Flegrei", 3.9, 3.0, "2024-05-20T12:00:00"),
            event("Campi Flegrei", 4.4, 2.2, "2024-05-20T13:00:00"),
            event("Norcia", 2.0, 9.0, "2024-05-20T14:00:00"),
        ];
        let table = shape(records, &criteria(None, None), 3);

        assert_eq!(table.events.len(), 5);
        let bins: Vec<usize> = table.events.iter().map(|e| e.bin).collect();
        assert_eq!(bins, vec![0, 0, 0, 2, 2]);

        let ramp = warm_ramp(3);
        for e in &table.events {
            assert_eq!(e.color, ramp[e.bin]);
        }
        assert_eq!(table.events[1].calendar_date.to_string(), "2024-05-18");
        assert_eq!(table.events[2].calendar_date.to_string(), "2024-05-19");
    }

    #[test]
    fn test_shape_bins_follow_filtered_values() {
        let records = vec![
            event("Campi Flegrei", 0.0, 2.0, "2024-05-18T01:00:00"),
            event("Campi Flegrei", 1.0, 2.0, "2024-05-18T02:00:00"),
            event("Campi Flegrei", 4.0, 2.0, "2024-05-18T03:00:00"),
        ];
        let table = shape(records, &criteria(Some(Bounds { min: 0.0, max: 1.0 }), None), 2);
        let edges = table.bins.as_ref().unwrap().edges().to_vec();
        assert!((edges[2] - 1.0).abs() < 1e-12);
        assert_eq!(table.events[1].bin, 1);
    }

    #[test]
    fn test_shape_empty() {
        let records = vec![event("Norcia", 2.0, 9.0, "2024-05-20T14:00:00")];
        let table = shape(records, &criteria(None, None), 3);
        assert!(table.events.is_empty());
        assert!(table.bins.is_none());
    }
}
