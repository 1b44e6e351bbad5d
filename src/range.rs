//! Date and bound selection.
//!
//! A [`Selection`] holds what the user picked. Any magnitude or depth bound
//! left open is filled from the extent of the data actually fetched, so the
//! selector and the fetch are interleaved: dates first, then bounds.

use chrono::{Days, Months, NaiveDate};
use serde::Serialize;
use tracing::warn;

use crate::config::{
    DEFAULT_BIN_COUNT, DEFAULT_LOOKBACK_DAYS, MAX_BIN_COUNT, MAX_LOOKBACK_MONTHS, TARGET_LOCATION,
};
use crate::errors::FlegreiError;
use crate::models::EventRecord;

/// Inclusive calendar date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Create a range, rejecting `start > end`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSelection` if the dates are out of order.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, FlegreiError> {
        if start > end {
            return Err(FlegreiError::InvalidSelection(format!(
                "start date {start} is after end date {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// The default window: the last week, ending `today`.
    #[must_use]
    pub fn default_ending(today: NaiveDate) -> Self {
        let start = today
            .checked_sub_days(Days::new(DEFAULT_LOOKBACK_DAYS))
            .unwrap_or(today);
        Self { start, end: today }
    }

    /// Oldest start date the selector offers.
    #[must_use]
    pub fn earliest_start(today: NaiveDate) -> NaiveDate {
        today
            .checked_sub_months(Months::new(MAX_LOOKBACK_MONTHS))
            .unwrap_or(today)
    }

    /// Pull the range inside `[today - 3 months, today]`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSelection` if nothing of the range is left.
    pub fn clamp(self, today: NaiveDate) -> Result<Self, FlegreiError> {
        let earliest = Self::earliest_start(today);
        let mut clamped = self;

        if clamped.start < earliest {
            warn!("start date {} clamped to {}", clamped.start, earliest);
            clamped.start = earliest;
        }
        if clamped.end > today {
            warn!("end date {} clamped to {}", clamped.end, today);
            clamped.end = today;
        }

        Self::new(clamped.start, clamped.end)
    }
}

/// Inclusive numeric range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    /// Create bounds, rejecting `min > max` and NaN.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSelection` if the bounds are unordered.
    pub fn new(min: f64, max: f64) -> Result<Self, FlegreiError> {
        if min.is_nan() || max.is_nan() || min > max {
            return Err(FlegreiError::InvalidSelection(format!(
                "range minimum {min} must be <= maximum {max}"
            )));
        }
        Ok(Self { min, max })
    }

    /// Smallest bounds covering every value, `None` if there are none.
    #[must_use]
    pub fn spanning<I: IntoIterator<Item = f64>>(values: I) -> Option<Self> {
        values.into_iter().fold(None, |acc, v| match acc {
            None => Some(Self { min: v, max: v }),
            Some(b) => Some(Self {
                min: b.min.min(v),
                max: b.max.max(v),
            }),
        })
    }

    /// Check if a value is within the bounds (both ends inclusive).
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.max - self.min
    }
}

/// Full magnitude and depth span of the location-matched data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DataExtent {
    pub magnitude: Option<Bounds>,
    pub depth_km: Option<Bounds>,
}

impl DataExtent {
    #[must_use]
    pub fn of(records: &[EventRecord]) -> Self {
        Self {
            magnitude: Bounds::spanning(records.iter().map(|r| r.magnitude)),
            depth_km: Bounds::spanning(records.iter().map(|r| r.depth_km)),
        }
    }
}

/// Fully resolved filter criteria.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterCriteria {
    pub date_range: DateRange,
    /// `None` only when no data was fetched to derive it from
    pub magnitude: Option<Bounds>,
    pub depth_km: Option<Bounds>,
    pub location: String,
}

/// What the user selected. Open bounds default to the data extent.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub date_range: DateRange,
    pub min_magnitude: Option<f64>,
    pub max_magnitude: Option<f64>,
    pub min_depth: Option<f64>,
    pub max_depth: Option<f64>,
    pub bins: usize,
}

impl Selection {
    /// The selector's initial state for `today`.
    #[must_use]
    pub fn default_for(today: NaiveDate) -> Self {
        Self {
            date_range: DateRange::default_ending(today),
            min_magnitude: None,
            max_magnitude: None,
            min_depth: None,
            max_depth: None,
            bins: DEFAULT_BIN_COUNT,
        }
    }

    /// Combine user overrides with the fetched data extent.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSelection` if a resolved range ends up unordered or
    /// the bin count is outside `1..=MAX_BIN_COUNT`.
    pub fn resolve(&self, extent: &DataExtent) -> Result<FilterCriteria, FlegreiError> {
        if !(1..=MAX_BIN_COUNT).contains(&self.bins) {
            return Err(FlegreiError::InvalidSelection(format!(
                "bin count must be between 1 and {MAX_BIN_COUNT}, got {}",
                self.bins
            )));
        }

        Ok(FilterCriteria {
            date_range: self.date_range,
            magnitude: resolve_bounds(self.min_magnitude, self.max_magnitude, extent.magnitude)?,
            depth_km: resolve_bounds(self.min_depth, self.max_depth, extent.depth_km)?,
            location: TARGET_LOCATION.to_string(),
        })
    }
}

fn resolve_bounds(
    min: Option<f64>,
    max: Option<f64>,
    extent: Option<Bounds>,
) -> Result<Option<Bounds>, FlegreiError> {
    match (min, max, extent) {
        (Some(lo), Some(hi), _) => Bounds::new(lo, hi).map(Some),
        (Some(lo), None, Some(e)) => Bounds::new(lo, e.max.max(lo)).map(Some),
        (None, Some(hi), Some(e)) => Bounds::new(e.min.min(hi), hi).map(Some),
        (Some(lo), None, None) => Bounds::new(lo, f64::INFINITY).map(Some),
        (None, Some(hi), None) => Bounds::new(f64::NEG_INFINITY, hi).map(Some),
        (None, None, e) => Ok(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_default_range_is_last_week() {
        let range = DateRange::default_ending(date("2024-05-20"));
        assert_eq!(range.start, date("2024-05-13"));
        assert_eq!(range.end, date("2024-05-20"));
    }

    #[test]
    fn test_clamp_start_to_three_months() {
        let today = date("2024-05-20");
        let range = DateRange::new(date("2023-12-01"), date("2024-05-25"))
            .unwrap()
            .clamp(today)
            .unwrap();
        assert_eq!(range.start, date("2024-02-20"));
        assert_eq!(range.end, today);
    }

    #[test]
    fn test_out_of_order_dates_rejected() {
        assert!(DateRange::new(date("2024-05-20"), date("2024-05-19")).is_err());
    }

    #[test]
    fn test_clamp_range_entirely_too_old() {
        let range = DateRange::new(date("2023-01-01"), date("2023-01-10")).unwrap();
        assert!(range.clamp(date("2024-05-20")).is_err());
    }

    #[test]
    fn test_bounds_spanning() {
        let b = Bounds::spanning([1.2, -0.4, 3.9]).unwrap();
        assert!((b.min - (-0.4)).abs() < 1e-12);
        assert!((b.max - 3.9).abs() < 1e-12);
        assert!(Bounds::spanning(Vec::<f64>::new()).is_none());
    }

    #[test]
    fn test_bounds_inclusive() {
        let b = Bounds::new(0.5, 2.0).unwrap();
        assert!(b.contains(0.5));
        assert!(b.contains(2.0));
        assert!(!b.contains(2.000_001));
        assert!(Bounds::new(2.0, 1.0).is_err());
    }

    #[test]
    fn test_resolve_defaults_to_extent() {
        let extent = DataExtent {
            magnitude: Some(Bounds { min: -0.5, max: 4.4 }),
            depth_km: Some(Bounds { min: 0.8, max: 3.5 }),
        };
        let mut selection = Selection::default_for(date("2024-05-20"));
        selection.min_magnitude = Some(1.0);

        let criteria = selection.resolve(&extent).unwrap();
        assert_eq!(criteria.magnitude, Some(Bounds { min: 1.0, max: 4.4 }));
        assert_eq!(criteria.depth_km, extent.depth_km);
        assert_eq!(criteria.location, "Campi Flegrei");
    }

    #[test]
    fn test_resolve_without_data() {
        let extent = DataExtent {
            magnitude: None,
            depth_km: None,
        };
        let criteria = Selection::default_for(date("2024-05-20"))
            .resolve(&extent)
            .unwrap();
        assert!(criteria.magnitude.is_none());
        assert!(criteria.depth_km.is_none());
    }

    #[test]
    fn test_resolve_rejects_zero_bins() {
        let mut selection = Selection::default_for(date("2024-05-20"));
        selection.bins = 0;
        let extent = DataExtent {
            magnitude: None,
            depth_km: None,
        };
        assert!(selection.resolve(&extent).is_err());
    }

    #[test]
    fn test_resolve_rejects_too_many_bins() {
        let extent = DataExtent {
            magnitude: Some(Bounds { min: 0.0, max: 1.0 }),
            depth_km: None,
        };
        let mut selection = Selection::default_for(date("2024-05-20"));

        selection.bins = MAX_BIN_COUNT;
        assert!(selection.resolve(&extent).is_ok());

        for bins in [MAX_BIN_COUNT + 1, 10_000_000_000, usize::MAX] {
            selection.bins = bins;
            let err = selection.resolve(&extent).unwrap_err();
            assert!(matches!(err, FlegreiError::InvalidSelection(_)));
        }
    }
}
