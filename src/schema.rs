//! Column-presence validation, run once when a [`Dataset`](crate::records::Dataset)
//! is built.
//!
//! Aggregators consult the resulting [`Schema`] instead of probing columns
//! themselves. A missing column never aborts the pipeline; it only degrades the
//! outputs listed in its [`MissingColumn`] notice.

use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

/// Canonical trip-log columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    RiderId,
    StartStationName,
    EndStationName,
    StartNeighborhood,
    EndNeighborhood,
    ProductName,
    Year,
    Month,
    PittRider,
    StartLat,
    StartLon,
    EndLat,
    EndLon,
}

impl Column {
    pub const ALL: [Column; 13] = [
        Column::RiderId,
        Column::StartStationName,
        Column::EndStationName,
        Column::StartNeighborhood,
        Column::EndNeighborhood,
        Column::ProductName,
        Column::Year,
        Column::Month,
        Column::PittRider,
        Column::StartLat,
        Column::StartLon,
        Column::EndLat,
        Column::EndLon,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Column::RiderId => "rider_id",
            Column::StartStationName => "start_station_name",
            Column::EndStationName => "end_station_name",
            Column::StartNeighborhood => "start_neighborhood",
            Column::EndNeighborhood => "end_neighborhood",
            Column::ProductName => "product_name",
            Column::Year => "year",
            Column::Month => "month",
            Column::PittRider => "pitt_rider",
            Column::StartLat => "start_lat",
            Column::StartLon => "start_lon",
            Column::EndLat => "end_lat",
            Column::EndLon => "end_lon",
        }
    }

    pub fn from_name(name: &str) -> Option<Column> {
        Column::ALL.into_iter().find(|c| c.name() == name)
    }

    /// Outputs that cannot be fully produced without this column.
    pub fn affects(self) -> &'static [Output] {
        match self {
            Column::RiderId => &[Output::Summary],
            Column::StartStationName | Column::EndStationName => {
                &[Output::Filter, Output::Breakdown, Output::Routes, Output::Stations]
            }
            Column::StartNeighborhood | Column::EndNeighborhood => &[Output::Filter],
            Column::ProductName | Column::PittRider => &[Output::Filter, Output::Breakdown],
            Column::Year | Column::Month => &[Output::Filter, Output::Breakdown],
            Column::StartLat | Column::StartLon | Column::EndLat | Column::EndLon => {
                &[Output::Routes, Output::Stations]
            }
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Pipeline outputs a missing column can degrade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Output {
    Filter,
    Breakdown,
    Routes,
    Stations,
    Summary,
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Output::Filter => "filter",
            Output::Breakdown => "breakdown",
            Output::Routes => "routes",
            Output::Stations => "stations",
            Output::Summary => "summary",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("Missing column {column} (degrades: {})", join(.affects))]
pub struct MissingColumn {
    pub column: Column,
    pub affects: Vec<Output>,
}

fn join(outputs: &[Output]) -> String {
    outputs
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Which canonical columns a dataset provides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    present: BTreeSet<Column>,
    missing: Vec<MissingColumn>,
}

impl Schema {
    /// Checks every canonical column against the normalized source header.
    /// Unknown extra columns are ignored.
    pub fn validate(columns: &BTreeSet<String>) -> Self {
        let mut present = BTreeSet::new();
        let mut missing = Vec::new();

        for column in Column::ALL {
            if columns.contains(column.name()) {
                present.insert(column);
            } else {
                missing.push(MissingColumn {
                    column,
                    affects: column.affects().to_vec(),
                });
            }
        }

        Self { present, missing }
    }

    pub fn complete() -> Self {
        Self {
            present: Column::ALL.into_iter().collect(),
            missing: Vec::new(),
        }
    }

    pub fn has(&self, column: Column) -> bool {
        self.present.contains(&column)
    }

    pub fn has_all(&self, columns: &[Column]) -> bool {
        columns.iter().all(|c| self.has(*c))
    }

    pub fn has_any(&self, columns: &[Column]) -> bool {
        columns.iter().any(|c| self.has(*c))
    }

    pub fn present(&self) -> impl Iterator<Item = Column> + '_ {
        self.present.iter().copied()
    }

    pub fn missing(&self) -> &[MissingColumn] {
        &self.missing
    }

    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_complete_schema_has_no_notices() {
        let all: Vec<&str> = Column::ALL.iter().map(|c| c.name()).collect();
        let schema = Schema::validate(&columns(&all));
        assert!(schema.is_complete());
        assert_eq!(schema, Schema::complete());
    }

    #[test]
    fn test_missing_coordinates_degrade_routes() {
        let schema = Schema::validate(&columns(&[
            "start_station_name",
            "end_station_name",
            "year",
            "month",
            "unrelated_column",
        ]));

        assert!(schema.has(Column::Year));
        assert!(!schema.has_all(&[Column::StartLat, Column::EndLat]));
        assert!(schema.has_any(&[Column::ProductName, Column::StartStationName]));

        let notice = schema
            .missing()
            .iter()
            .find(|m| m.column == Column::StartLat)
            .unwrap();
        assert!(notice.affects.contains(&Output::Routes));
        assert_eq!(
            notice.to_string(),
            "Missing column start_lat (degrades: routes, stations)"
        );
    }

    #[test]
    fn test_from_name_round_trips_names() {
        for column in Column::ALL {
            assert_eq!(Column::from_name(column.name()), Some(column));
        }
        assert_eq!(Column::from_name("bogus"), None);
    }
}
