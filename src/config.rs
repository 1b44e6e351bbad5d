//! Named constants for the Campi Flegrei dashboard.
//!
//! The single business rule ("only Campi Flegrei events") and every fixed
//! query, binning and rendering parameter live here so they can be tested
//! and changed in one place.

/// Location label an event must carry, verbatim, to be kept.
pub const TARGET_LOCATION: &str = "Campi Flegrei";

/// INGV FDSN event service endpoint.
pub const INGV_QUERY_URL: &str = "https://webservices.ingv.it/fdsnws/event/1/query";

/// Region requested from the feed (degrees).
pub const REGION_MIN_LAT: f64 = 35.0;
pub const REGION_MAX_LAT: f64 = 49.0;
pub const REGION_MIN_LON: f64 = 5.0;
pub const REGION_MAX_LON: f64 = 20.0;

/// Magnitude window requested from the feed.
pub const FEED_MIN_MAGNITUDE: f64 = -1.0;
pub const FEED_MAX_MAGNITUDE: f64 = 10.0;

/// Depth window requested from the feed (km).
pub const FEED_MIN_DEPTH_KM: f64 = -10.0;
pub const FEED_MAX_DEPTH_KM: f64 = 1000.0;

/// Minimum event version accepted by the feed.
pub const FEED_MIN_VERSION: u32 = 100;

/// Maximum rows returned per query.
pub const FEED_LIMIT: usize = 10_000;

/// Default number of equal-width magnitude bins.
pub const DEFAULT_BIN_COUNT: usize = 3;

/// Most bins a selection may ask for: one per YlOrRd class.
pub const MAX_BIN_COUNT: usize = 9;

/// Default date window, in days, ending today.
pub const DEFAULT_LOOKBACK_DAYS: u64 = 7;

/// Oldest selectable start date, in months before today.
pub const MAX_LOOKBACK_MONTHS: u32 = 3;

/// Camera zoom shared by every map panel.
pub const DEFAULT_ZOOM: f64 = 11.0;

/// Camera center used when no events are left to average.
pub const FALLBACK_CENTER_LAT: f64 = 40.827;
pub const FALLBACK_CENTER_LON: f64 = 14.139;

/// Screen grid cell edge in pixels.
pub const GRID_CELL_PIXELS: u32 = 30;
pub const GRID_OPACITY: f64 = 0.3;

pub const HEATMAP_OPACITY: f64 = 0.9;
pub const HEATMAP_THRESHOLD: f64 = 0.3;

/// Hexagon radius in meters.
pub const HEXAGON_RADIUS: f64 = 200.0;
pub const HEXAGON_ELEVATION_SCALE: f64 = 10.0;
pub const HEXAGON_PITCH: f64 = 40.5;
pub const HEXAGON_BEARING: f64 = -27.36;

/// Scatter radius in meters per magnitude unit.
pub const SCATTER_RADIUS_SCALE: f64 = 100.0;
/// Magnitudes below this still get a visible dot.
pub const SCATTER_MIN_MAGNITUDE: f64 = 0.1;

/// Fixed color scale of the timelapse, in magnitude units.
pub const ANIMATION_COLOR_MIN: f64 = 0.0;
pub const ANIMATION_COLOR_MAX: f64 = 5.0;
/// Timelapse marker size range, in pixels.
pub const ANIMATION_MIN_MARKER_PX: f64 = 2.0;
pub const ANIMATION_MAX_MARKER_PX: f64 = 20.0;
pub const ANIMATION_FRAME_MS: u64 = 500;

/// Dark base map for the timelapse.
pub const DARK_MAP_STYLE: &str =
    "https://basemaps.cartocdn.com/gl/dark-matter-gl-style/style.json";
/// Light base map for the other panels.
pub const LIGHT_MAP_STYLE: &str =
    "https://basemaps.cartocdn.com/gl/positron-gl-style/style.json";
