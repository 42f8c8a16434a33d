//! Busiest origin/destination pairs for the map.

use std::collections::BTreeMap;
use tracing::debug;

use crate::analyzers::types::RouteAggregate;
use crate::analyzers::utility::{min_max, scale_weight};
use crate::records::{Coordinate, TripRecord};
use crate::schema::{Column, Schema};

/// Upper bound on the number of routes handed to the map.
pub const MAX_ROUTES: usize = 200;

const ROUTE_COLUMNS: [Column; 6] = [
    Column::StartStationName,
    Column::EndStationName,
    Column::StartLat,
    Column::StartLon,
    Column::EndLat,
    Column::EndLon,
];

type RouteKey<'a> = (&'a str, &'a str, Coordinate, Coordinate);

/// Groups trips by station names and both coordinates, ranks the groups by
/// trip count and keeps the top [`MAX_ROUTES`]. Equal counts keep ascending
/// key order.
pub fn top_routes(trips: &[&TripRecord], schema: &Schema) -> Vec<RouteAggregate> {
    if trips.is_empty() || !schema.has_all(&ROUTE_COLUMNS) {
        return Vec::new();
    }

    let mut groups: BTreeMap<RouteKey<'_>, usize> = BTreeMap::new();
    for trip in trips {
        if let Some(key) = route_key(trip) {
            *groups.entry(key).or_default() += 1;
        }
    }

    let mut ranked: Vec<(RouteKey<'_>, usize)> = groups.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked.truncate(MAX_ROUTES);

    let Some((min, max)) = min_max(ranked.iter().map(|(_, count)| *count)) else {
        return Vec::new();
    };

    debug!(routes = ranked.len(), min, max, "Routes ranked");

    ranked
        .into_iter()
        .map(|((start, end, start_coord, end_coord), count)| RouteAggregate {
            start_station: start.to_string(),
            end_station: end.to_string(),
            start: start_coord,
            end: end_coord,
            trips: count,
            weight: scale_weight(count, min, max),
        })
        .collect()
}

fn route_key(trip: &TripRecord) -> Option<RouteKey<'_>> {
    Some((
        trip.start_station_name.as_deref()?,
        trip.end_station_name.as_deref()?,
        trip.start_coordinate()?,
        trip.end_coordinate()?,
    ))
}
