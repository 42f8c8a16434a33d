use chrono::Utc;
use itertools::Itertools;
use tracing::{debug, info};

use crate::analyzers::breakdown::breakdown;
use crate::analyzers::routes::top_routes;
use crate::analyzers::stations::station_summary;
use crate::analyzers::types::{PipelineOutput, SummaryMetrics, TimeDimension};
use crate::filter::{self, FilterCriteria};
use crate::records::{Dataset, TripRecord};
use crate::schema::Column;

/// Runs one full pass: filter, then breakdown, routes and stations over the
/// filtered subset.
///
/// Never fails. Missing columns and empty selections produce empty outputs,
/// and the schema notices are carried along so the caller can report them.
#[tracing::instrument(skip_all, fields(total = dataset.len()))]
pub fn analyze(dataset: &Dataset, criteria: &FilterCriteria) -> PipelineOutput {
    let schema = dataset.schema();
    let filtered = filter::apply(dataset, criteria);

    let dimension = TimeDimension::for_months(&criteria.months);
    let breakdown = breakdown(&filtered, schema, dimension);
    let routes = top_routes(&filtered, schema);
    let stations = station_summary(&routes, &filtered);

    let summary = summarize(dataset, &filtered);

    debug!(
        ?dimension,
        breakdown_rows = breakdown.rows.len(),
        routes = routes.len(),
        stations = stations.len(),
        "Pipeline outputs ready"
    );
    info!(
        total = summary.total_trips,
        filtered = summary.filtered_trips,
        "Analysis complete"
    );

    PipelineOutput {
        generated_at: Utc::now(),
        summary,
        breakdown,
        routes,
        stations,
        notices: schema.missing().to_vec(),
    }
}

fn summarize(dataset: &Dataset, filtered: &[&TripRecord]) -> SummaryMetrics {
    let distinct_riders = dataset.schema().has(Column::RiderId).then(|| {
        filtered
            .iter()
            .filter_map(|t| t.rider_id.as_deref())
            .unique()
            .count()
    });

    SummaryMetrics {
        total_trips: dataset.len(),
        filtered_trips: filtered.len(),
        distinct_riders,
    }
}
