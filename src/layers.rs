//! Map layer descriptors.
//!
//! Each builder turns the projected table into one self-contained visual:
//! a deck.gl-style JSON description (`"@@type"` class tag, camelCase
//! properties, `"@@="` accessor expressions) that any deck.gl front end can
//! render. Builders never look at each other's output.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::warn;

use crate::config::{
    ANIMATION_COLOR_MAX, ANIMATION_COLOR_MIN, ANIMATION_FRAME_MS, ANIMATION_MAX_MARKER_PX,
    ANIMATION_MIN_MARKER_PX, DARK_MAP_STYLE, DEFAULT_ZOOM, FALLBACK_CENTER_LAT,
    FALLBACK_CENTER_LON, GRID_CELL_PIXELS, GRID_OPACITY, HEATMAP_OPACITY, HEATMAP_THRESHOLD,
    HEXAGON_BEARING, HEXAGON_ELEVATION_SCALE, HEXAGON_PITCH, HEXAGON_RADIUS, LIGHT_MAP_STYLE,
    SCATTER_MIN_MAGNITUDE, SCATTER_RADIUS_SCALE,
};
use crate::models::ShapedEvent;
use crate::palette::{self, Rgb};
use crate::projection::GeoTable;

const POSITION: &str = "@@=[longitude, latitude]";

/// Camera for a map panel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    pub latitude: f64,
    pub longitude: f64,
    pub zoom: f64,
    pub pitch: f64,
    pub bearing: f64,
}

impl ViewState {
    /// Top-down camera over the mean event position.
    ///
    /// An empty table has no mean; the camera then sits over the caldera.
    #[must_use]
    pub fn centered_on(table: &GeoTable) -> Self {
        let (latitude, longitude) = match table.mean_center() {
            Some(c) => (c.latitude, c.longitude),
            None => {
                warn!("no events to center on, using default camera");
                (FALLBACK_CENTER_LAT, FALLBACK_CENTER_LON)
            }
        };

        Self {
            latitude,
            longitude,
            zoom: DEFAULT_ZOOM,
            pitch: 0.0,
            bearing: 0.0,
        }
    }

    #[must_use]
    pub fn tilted(self, pitch: f64, bearing: f64) -> Self {
        Self {
            pitch,
            bearing,
            ..self
        }
    }
}

/// One event as seen by the map layers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerDatum {
    pub longitude: f64,
    pub latitude: f64,
    pub magnitude: f64,
    pub depth_km: f64,
    pub time: String,
    pub color: Rgb,
    /// Scatter radius in meters
    pub radius: f64,
}

impl From<&ShapedEvent> for LayerDatum {
    fn from(e: &ShapedEvent) -> Self {
        Self {
            longitude: e.point.x(),
            latitude: e.point.y(),
            magnitude: e.record.magnitude,
            depth_km: e.record.depth_km,
            time: e.record.time.format("%Y-%m-%d %H:%M:%S").to_string(),
            color: e.color,
            radius: e.record.magnitude.max(SCATTER_MIN_MAGNITUDE) * SCATTER_RADIUS_SCALE,
        }
    }
}

fn layer_data(table: &GeoTable) -> Vec<LayerDatum> {
    table.events.iter().map(LayerDatum::from).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenGridLayer {
    pub id: &'static str,
    pub data: Vec<LayerDatum>,
    pub pickable: bool,
    pub opacity: f64,
    pub cell_size_pixels: u32,
    pub get_position: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapLayer {
    pub id: &'static str,
    pub data: Vec<LayerDatum>,
    pub opacity: f64,
    pub threshold: f64,
    pub get_position: &'static str,
    pub get_weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HexagonLayer {
    pub id: &'static str,
    pub data: Vec<LayerDatum>,
    pub pickable: bool,
    pub extruded: bool,
    pub radius: f64,
    pub elevation_scale: f64,
    pub get_position: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScatterplotLayer {
    pub id: &'static str,
    pub data: Vec<LayerDatum>,
    pub pickable: bool,
    pub stroked: bool,
    pub get_position: &'static str,
    pub get_radius: &'static str,
    pub get_fill_color: &'static str,
}

/// A deck.gl layer, tagged with its class name.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "@@type")]
pub enum Layer {
    ScreenGridLayer(ScreenGridLayer),
    HeatmapLayer(HeatmapLayer),
    HexagonLayer(HexagonLayer),
    ScatterplotLayer(ScatterplotLayer),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tooltip {
    pub text: String,
}

/// A complete map panel: layers, camera and base map.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Deck {
    pub layers: Vec<Layer>,
    pub initial_view_state: ViewState,
    pub tooltip: Option<Tooltip>,
    pub map_style: &'static str,
}

impl Deck {
    fn single(layer: Layer, view: ViewState, tooltip: &str) -> Self {
        Self {
            layers: vec![layer],
            initial_view_state: view,
            tooltip: Some(Tooltip {
                text: tooltip.to_string(),
            }),
            map_style: LIGHT_MAP_STYLE,
        }
    }
}

/// Event counts per fixed-size screen cell.
#[must_use]
pub fn screen_grid(table: &GeoTable, view: ViewState) -> Deck {
    let layer = Layer::ScreenGridLayer(ScreenGridLayer {
        id: "screen-grid",
        data: layer_data(table),
        pickable: true,
        opacity: GRID_OPACITY,
        cell_size_pixels: GRID_CELL_PIXELS,
        get_position: POSITION,
    });
    Deck::single(layer, view, "Number of earthquakes: {cellCount}")
}

/// Kernel density surface.
#[must_use]
pub fn heatmap(table: &GeoTable, view: ViewState) -> Deck {
    let layer = Layer::HeatmapLayer(HeatmapLayer {
        id: "heatmap",
        data: layer_data(table),
        opacity: HEATMAP_OPACITY,
        threshold: HEATMAP_THRESHOLD,
        get_position: POSITION,
        get_weight: 1.0,
    });
    Deck {
        tooltip: None,
        ..Deck::single(layer, view, "")
    }
}

/// Extruded hexagon bins, seen from a tilted camera.
#[must_use]
pub fn hexagon(table: &GeoTable, view: ViewState) -> Deck {
    let layer = Layer::HexagonLayer(HexagonLayer {
        id: "hexagon",
        data: layer_data(table),
        pickable: true,
        extruded: true,
        radius: HEXAGON_RADIUS,
        elevation_scale: HEXAGON_ELEVATION_SCALE,
        get_position: POSITION,
    });
    Deck::single(
        layer,
        view.tilted(HEXAGON_PITCH, HEXAGON_BEARING),
        "{elevationValue} earthquakes",
    )
}

/// One dot per event, sized by magnitude and filled with its bin color.
#[must_use]
pub fn scatter(table: &GeoTable, view: ViewState) -> Deck {
    let layer = Layer::ScatterplotLayer(ScatterplotLayer {
        id: "scatter",
        data: layer_data(table),
        pickable: true,
        stroked: false,
        get_position: POSITION,
        get_radius: "@@=radius",
        get_fill_color: "@@=color",
    });
    Deck::single(
        layer,
        view,
        "Time: {time}\nMagnitude: {magnitude}\nDepth: {depthKm} km",
    )
}

/// One timelapse marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimatedPoint {
    pub longitude: f64,
    pub latitude: f64,
    pub magnitude: f64,
    pub depth_km: f64,
    pub time: String,
    /// Marker size in pixels, from depth
    pub size: f64,
    /// Color from magnitude on the fixed scale
    pub color: Rgb,
}

/// All events of one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnimationFrame {
    pub date: NaiveDate,
    pub points: Vec<AnimatedPoint>,
}

/// Day-by-day animated scatter over a dark base map.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Timelapse {
    pub frames: Vec<AnimationFrame>,
    pub color_range: [f64; 2],
    pub frame_duration_ms: u64,
    pub map_style: &'static str,
    pub initial_view_state: ViewState,
}

/// Group events into one frame per calendar date, oldest first.
#[must_use]
pub fn timelapse(table: &GeoTable, view: ViewState) -> Timelapse {
    let deepest = table
        .events
        .iter()
        .map(|e| e.record.depth_km)
        .fold(0.0_f64, f64::max);

    let mut by_date: BTreeMap<NaiveDate, Vec<AnimatedPoint>> = BTreeMap::new();
    for e in &table.events {
        by_date
            .entry(e.calendar_date)
            .or_default()
            .push(AnimatedPoint {
                longitude: e.point.x(),
                latitude: e.point.y(),
                magnitude: e.record.magnitude,
                depth_km: e.record.depth_km,
                time: e.record.time.format("%Y-%m-%d %H:%M:%S").to_string(),
                size: marker_size(e.record.depth_km, deepest),
                color: palette::continuous(
                    e.record.magnitude,
                    ANIMATION_COLOR_MIN,
                    ANIMATION_COLOR_MAX,
                ),
            });
    }

    Timelapse {
        frames: by_date
            .into_iter()
            .map(|(date, points)| AnimationFrame { date, points })
            .collect(),
        color_range: [ANIMATION_COLOR_MIN, ANIMATION_COLOR_MAX],
        frame_duration_ms: ANIMATION_FRAME_MS,
        map_style: DARK_MAP_STYLE,
        initial_view_state: view,
    }
}

/// Depth scaled into the marker size range; events above sea level get
/// the smallest marker.
fn marker_size(depth_km: f64, deepest: f64) -> f64 {
    if deepest <= 0.0 {
        return ANIMATION_MIN_MARKER_PX;
    }
    let t = (depth_km.max(0.0) / deepest).min(1.0);
    ANIMATION_MIN_MARKER_PX + (ANIMATION_MAX_MARKER_PX - ANIMATION_MIN_MARKER_PX) * t
}
