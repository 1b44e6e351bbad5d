//! Dashboard assembly.
//!
//! A dashboard is the full result of one pipeline run: the resolved
//! criteria, a bin legend, and the rendered panels in a fixed order.

use serde::Serialize;

use crate::filters::BinLegend;
use crate::layers::{self, Deck, Timelapse, ViewState};
use crate::models::OutputEvent;
use crate::projection::{Crs, GeoTable};
use crate::range::{DataExtent, FilterCriteria};

/// Panels shown by the dashboard, in tab order.
pub const DASHBOARD_PANELS: [PanelId; 5] = [
    PanelId::Grid,
    PanelId::Heatmap,
    PanelId::Hexagon,
    PanelId::Timelapse,
    PanelId::Table,
];

/// Every panel the builders can produce, dashboard or not.
const ALL_PANELS: [PanelId; 6] = [
    PanelId::Grid,
    PanelId::Heatmap,
    PanelId::Hexagon,
    PanelId::Scatter,
    PanelId::Timelapse,
    PanelId::Table,
];

/// Identifies one panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelId {
    Grid,
    Heatmap,
    Hexagon,
    Scatter,
    Timelapse,
    Table,
}

impl PanelId {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Grid => "grid",
            Self::Heatmap => "heatmap",
            Self::Hexagon => "hexagon",
            Self::Scatter => "scatter",
            Self::Timelapse => "timelapse",
            Self::Table => "table",
        }
    }

    /// Tab label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Grid => "Grid density",
            Self::Heatmap => "Heatmap",
            Self::Hexagon => "Hexagon bins",
            Self::Scatter => "Magnitude scatter",
            Self::Timelapse => "Timelapse",
            Self::Table => "Event table",
        }
    }
}

impl std::str::FromStr for PanelId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.to_lowercase();
        ALL_PANELS
            .into_iter()
            .find(|p| p.as_str() == wanted)
            .ok_or_else(|| {
                let names: Vec<&str> = ALL_PANELS.iter().map(|p| p.as_str()).collect();
                format!("unknown panel: {s} (expected: {})", names.join(", "))
            })
    }
}

/// What a panel renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum PanelContent {
    Map(Deck),
    Timelapse(Timelapse),
    Table(Vec<OutputEvent>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Panel {
    pub id: PanelId,
    pub label: &'static str,
    pub content: PanelContent,
}

impl Panel {
    /// Render one panel from the projected table.
    #[must_use]
    pub fn build(id: PanelId, table: &GeoTable, view: ViewState) -> Self {
        let content = match id {
            PanelId::Grid => PanelContent::Map(layers::screen_grid(table, view)),
            PanelId::Heatmap => PanelContent::Map(layers::heatmap(table, view)),
            PanelId::Hexagon => PanelContent::Map(layers::hexagon(table, view)),
            PanelId::Scatter => PanelContent::Map(layers::scatter(table, view)),
            PanelId::Timelapse => PanelContent::Timelapse(layers::timelapse(table, view)),
            PanelId::Table => {
                PanelContent::Table(table.events.iter().map(OutputEvent::from).collect())
            }
        };

        Self {
            id,
            label: id.label(),
            content,
        }
    }
}

/// The full output of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub criteria: FilterCriteria,
    /// Slider limits: the span of the location-matched data
    pub extent: DataExtent,
    pub crs: Crs,
    pub event_count: usize,
    pub legend: Vec<BinLegend>,
    /// Set when nothing matched the filters
    pub notice: Option<String>,
    pub panels: Vec<Panel>,
}

impl Dashboard {
    /// Build the given panels over a shared top-down camera.
    #[must_use]
    pub fn assemble(
        criteria: FilterCriteria,
        extent: DataExtent,
        table: &GeoTable,
        panels: &[PanelId],
    ) -> Self {
        let view = ViewState::centered_on(table);
        let notice = table.is_empty().then(|| {
            format!(
                "No {} events between {} and {} match the selected filters",
                criteria.location, criteria.date_range.start, criteria.date_range.end
            )
        });

        Self {
            extent,
            crs: table.crs,
            event_count: table.len(),
            legend: table.bins.as_ref().map(|b| b.legend()).unwrap_or_default(),
            notice,
            panels: panels
                .iter()
                .map(|&id| Panel::build(id, table, view))
                .collect(),
            criteria,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::shape;
    use crate::models::EventRecord;
    use crate::range::{Bounds, DateRange};

    fn criteria() -> FilterCriteria {
        FilterCriteria {
            date_range: DateRange::new("2024-05-18".parse().unwrap(), "2024-05-20".parse().unwrap())
                .unwrap(),
            magnitude: Some(Bounds { min: 0.0, max: 5.0 }),
            depth_km: None,
            location: "Campi Flegrei".into(),
        }
    }

    fn records() -> Vec<EventRecord> {
        [("2024-05-18T02:14:07", 1.2), ("2024-05-20T18:10:00", 4.4)]
            .into_iter()
            .map(|(time, magnitude)| EventRecord {
                event_id: None,
                time: time.parse().unwrap(),
                latitude: 40.83,
                longitude: 14.14,
                depth_km: 2.5,
                magnitude,
                magnitude_type: None,
                location_name: "Campi Flegrei".into(),
            })
            .collect()
    }

    fn extent() -> DataExtent {
        DataExtent {
            magnitude: None,
            depth_km: None,
        }
    }

    #[test]
    fn test_panel_id_parse() {
        assert_eq!("Hexagon".parse::<PanelId>().unwrap(), PanelId::Hexagon);
        assert_eq!("scatter".parse::<PanelId>().unwrap(), PanelId::Scatter);
        assert!("owl".parse::<PanelId>().is_err());
    }

    #[test]
    fn test_panel_order_and_labels() {
        let table = GeoTable::project(shape(records(), &criteria(), 3));
        let dashboard = Dashboard::assemble(criteria(), extent(), &table, &DASHBOARD_PANELS);

        let labels: Vec<&str> = dashboard.panels.iter().map(|p| p.label).collect();
        assert_eq!(
            labels,
            vec!["Grid density", "Heatmap", "Hexagon bins", "Timelapse", "Event table"]
        );
        assert!(!dashboard.panels.iter().any(|p| p.id == PanelId::Scatter));
        assert_eq!(dashboard.event_count, 2);
        assert_eq!(dashboard.legend.len(), 3);
        assert!(dashboard.notice.is_none());
    }

    #[test]
    fn test_table_panel_rows() {
        let table = GeoTable::project(shape(records(), &criteria(), 3));
        let panel = Panel::build(PanelId::Table, &table, ViewState::centered_on(&table));
        let PanelContent::Table(rows) = panel.content else {
            panic!("expected table");
        };
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].location, "Campi Flegrei");
    }

    #[test]
    fn test_empty_dashboard_has_notice() {
        let table = GeoTable::project(shape(Vec::new(), &criteria(), 3));
        let dashboard = Dashboard::assemble(criteria(), extent(), &table, &DASHBOARD_PANELS);

        assert_eq!(dashboard.event_count, 0);
        assert!(dashboard.legend.is_empty());
        assert!(dashboard.notice.as_deref().unwrap().contains("Campi Flegrei"));
        assert_eq!(dashboard.panels.len(), DASHBOARD_PANELS.len());
    }

    #[test]
    fn test_serialized_shape() {
        let table = GeoTable::project(shape(records(), &criteria(), 3));
        let dashboard = Dashboard::assemble(criteria(), extent(), &table, &[PanelId::Grid]);
        let json = serde_json::to_value(&dashboard).unwrap();

        assert_eq!(json["crs"], "EPSG:4326");
        assert_eq!(json["panels"][0]["id"], "grid");
        assert_eq!(json["panels"][0]["content"]["kind"], "map");
        assert_eq!(
            json["panels"][0]["content"]["data"]["layers"][0]["@@type"],
            "ScreenGridLayer"
        );
    }
}
