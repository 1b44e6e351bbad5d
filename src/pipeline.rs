//! The fetch, filter, project and render pipeline.
//!
//! Each call is a full, stateless run: nothing is cached between calls, so
//! every interaction simply calls [`run`] again.

use tracing::{debug, warn};

use crate::client::EventSource;
use crate::config::TARGET_LOCATION;
use crate::dashboard::{Dashboard, PanelId};
use crate::errors::FlegreiError;
use crate::filters;
use crate::projection::GeoTable;
use crate::range::{DataExtent, FilterCriteria, Selection};

/// The shaped table with the criteria that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Projected {
    pub criteria: FilterCriteria,
    pub extent: DataExtent,
    pub table: GeoTable,
}

/// Fetch, filter and project, stopping at the first fetch failure.
///
/// # Errors
///
/// Returns `Fetch` if the source fails and `InvalidSelection` if the
/// user bounds cannot be resolved.
pub fn project<S: EventSource + ?Sized>(
    source: &S,
    selection: &Selection,
) -> Result<Projected, FlegreiError> {
    let records = source.fetch_events(&selection.date_range)?;
    let fetched = records.len();

    let located = filters::by_location(records, TARGET_LOCATION);
    debug!("{} of {} events at {}", located.len(), fetched, TARGET_LOCATION);

    let extent = DataExtent::of(&located);
    let criteria = selection.resolve(&extent)?;
    let table = GeoTable::project(filters::shape(located, &criteria, selection.bins));

    if table.is_empty() {
        warn!("no events left after filtering");
    }

    Ok(Projected {
        criteria,
        extent,
        table,
    })
}

/// Run the whole pipeline and assemble the requested panels.
///
/// # Errors
///
/// See [`project`]; on error no panel is built.
pub fn run<S: EventSource + ?Sized>(
    source: &S,
    selection: &Selection,
    panels: &[PanelId],
) -> Result<Dashboard, FlegreiError> {
    let Projected {
        criteria,
        extent,
        table,
    } = project(source, selection)?;

    Ok(Dashboard::assemble(criteria, extent, &table, panels))
}
