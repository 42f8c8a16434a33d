//! Stations shown on the map, with start/end counts over the whole filtered
//! subset.

use itertools::Itertools;
use std::collections::HashSet;

use crate::analyzers::types::{RouteAggregate, StationAggregate};
use crate::records::TripRecord;

/// Collects every station named by `routes`, keeping the coordinate seen on its
/// first appearance in rank order (start endpoint before end endpoint), then
/// counts starts and ends across all of `trips` so the counts are not capped by
/// route truncation.
pub fn station_summary(routes: &[RouteAggregate], trips: &[&TripRecord]) -> Vec<StationAggregate> {
    let mut seen = HashSet::new();
    let mut stations = Vec::new();

    for route in routes {
        for (name, coordinate) in [
            (&route.start_station, route.start),
            (&route.end_station, route.end),
        ] {
            if seen.insert(name.as_str()) {
                stations.push(StationAggregate {
                    name: name.clone(),
                    coordinate,
                    start_count: 0,
                    end_count: 0,
                });
            }
        }
    }

    if stations.is_empty() {
        return stations;
    }

    let starts = trips
        .iter()
        .filter_map(|t| t.start_station_name.as_deref())
        .counts();
    let ends = trips
        .iter()
        .filter_map(|t| t.end_station_name.as_deref())
        .counts();

    for station in &mut stations {
        station.start_count = starts.get(station.name.as_str()).copied().unwrap_or(0);
        station.end_count = ends.get(station.name.as_str()).copied().unwrap_or(0);
    }

    stations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::Coordinate;

    fn route(start: &str, end: &str, start_coord: Coordinate, end_coord: Coordinate) -> RouteAggregate {
        RouteAggregate {
            start_station: start.to_string(),
            end_station: end.to_string(),
            start: start_coord,
            end: end_coord,
            trips: 1,
            weight: 1.0,
        }
    }

    fn trip(start: &str, end: &str) -> TripRecord {
        TripRecord {
            start_station_name: Some(start.to_string()),
            end_station_name: Some(end.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_first_appearance_wins_coordinate() {
        let a1 = Coordinate::new(1.0, 1.0);
        let a2 = Coordinate::new(2.0, 2.0);
        let b = Coordinate::new(3.0, 3.0);
        let routes = vec![route("B", "A", b, a1), route("A", "B", a2, b)];
        let stations = station_summary(&routes, &[]);

        let names: Vec<&str> = stations.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["B", "A"]);
        assert_eq!(stations[1].coordinate, a1);
    }

    #[test]
    fn test_counts_use_full_trip_list() {
        let c = Coordinate::new(0.0, 0.0);
        let routes = vec![route("A", "B", c, c)];
        // C->A is not among the routes, but A's end count still includes it.
        let trips = vec![trip("A", "B"), trip("A", "B"), trip("C", "A")];
        let refs: Vec<&TripRecord> = trips.iter().collect();
        let stations = station_summary(&routes, &refs);

        assert_eq!(stations.len(), 2);
        assert_eq!(stations[0].name, "A");
        assert_eq!((stations[0].start_count, stations[0].end_count), (2, 1));
        assert_eq!((stations[1].start_count, stations[1].end_count), (0, 2));
    }

    #[test]
    fn test_no_routes_no_stations() {
        let trips = vec![trip("A", "B")];
        let refs: Vec<&TripRecord> = trips.iter().collect();
        assert!(station_summary(&[], &refs).is_empty());
    }
}
