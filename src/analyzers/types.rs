//! Data types produced by the aggregation pipeline.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fmt;

use crate::records::{Coordinate, TripRecord};
use crate::schema::{Column, MissingColumn};

/// Rendered in place of a categorical value whose column is absent from the
/// dataset.
pub const UNKNOWN_MARKER: &str = "(unknown)";

/// A categorical value, or the placeholder used when the whole column is
/// missing. `Unknown` sorts after every real value and never equals one.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category<T> {
    Value(T),
    Unknown,
}

impl<T: Serialize> Serialize for Category<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Category::Value(v) => v.serialize(serializer),
            Category::Unknown => serializer.serialize_str(UNKNOWN_MARKER),
        }
    }
}

impl<T: fmt::Display> fmt::Display for Category<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Value(v) => fmt::Display::fmt(v, f),
            Category::Unknown => f.write_str(UNKNOWN_MARKER),
        }
    }
}

/// Fixed grouping key of the breakdown table. Field order is the grouping
/// (and therefore tie-break) order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BreakdownKey {
    pub start_station: Category<String>,
    pub end_station: Category<String>,
    pub product: Category<String>,
    pub pitt_rider: Category<bool>,
}

impl BreakdownKey {
    pub const COLUMNS: [Column; 4] = [
        Column::StartStationName,
        Column::EndStationName,
        Column::ProductName,
        Column::PittRider,
    ];
}

/// Which time value the breakdown columns are keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeDimension {
    Year,
    /// Month and year, used once more than one month is selected.
    Period,
}

impl TimeDimension {
    pub fn for_months(months: &BTreeSet<u32>) -> Self {
        if months.len() > 1 {
            TimeDimension::Period
        } else {
            TimeDimension::Year
        }
    }

    pub fn columns(self) -> &'static [Column] {
        match self {
            TimeDimension::Year => &[Column::Year],
            TimeDimension::Period => &[Column::Year, Column::Month],
        }
    }

    pub fn value_of(self, trip: &TripRecord) -> Option<TimeValue> {
        let year = trip.year?;
        let month = match self {
            TimeDimension::Year => None,
            TimeDimension::Period => Some(trip.valid_month()?),
        };
        Some(TimeValue { year, month })
    }
}

/// One time column. Orders chronologically: by year, then month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeValue {
    pub year: i32,
    pub month: Option<u32>,
}

impl fmt::Display for TimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.month {
            Some(month) => write!(f, "{:02}-{:04}", month, self.year),
            None => write!(f, "{}", self.year),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakdownRow {
    pub key: BreakdownKey,
    /// One count per entry of [`BreakdownTable::time_columns`].
    pub counts: Vec<usize>,
}

impl BreakdownRow {
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

/// Pivoted count table: one row per categorical key, one column per time value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakdownTable {
    pub dimension: TimeDimension,
    /// Ascending time order.
    pub time_columns: Vec<TimeValue>,
    pub rows: Vec<BreakdownRow>,
}

impl BreakdownTable {
    pub fn empty(dimension: TimeDimension) -> Self {
        Self {
            dimension,
            time_columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Categorical key columns first, then time labels.
    pub fn columns(&self) -> Vec<String> {
        BreakdownKey::COLUMNS
            .iter()
            .map(|c| c.name().to_string())
            .chain(self.time_columns.iter().map(ToString::to_string))
            .collect()
    }

    /// Count for `key` in the column labelled `time`, if both exist.
    pub fn count(&self, key: &BreakdownKey, time: &str) -> Option<usize> {
        let column = self
            .time_columns
            .iter()
            .position(|t| t.to_string() == time)?;
        let row = self.rows.iter().find(|r| &r.key == key)?;
        row.counts.get(column).copied()
    }

    /// Each row as an ordered column → value mapping.
    pub fn to_records(&self) -> Vec<Map<String, Value>> {
        let labels: Vec<String> = self.time_columns.iter().map(ToString::to_string).collect();

        self.rows
            .iter()
            .map(|row| {
                let mut record = Map::new();
                record.insert(
                    Column::StartStationName.name().to_string(),
                    category_value(&row.key.start_station),
                );
                record.insert(
                    Column::EndStationName.name().to_string(),
                    category_value(&row.key.end_station),
                );
                record.insert(
                    Column::ProductName.name().to_string(),
                    category_value(&row.key.product),
                );
                record.insert(
                    Column::PittRider.name().to_string(),
                    category_value(&row.key.pitt_rider),
                );
                for (label, count) in labels.iter().zip(&row.counts) {
                    record.insert(label.clone(), Value::from(*count));
                }
                record
            })
            .collect()
    }
}

fn category_value<T: Serialize>(category: &Category<T>) -> Value {
    serde_json::to_value(category).unwrap_or(Value::Null)
}

impl Serialize for BreakdownTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct TableView {
            dimension: TimeDimension,
            columns: Vec<String>,
            rows: Vec<Map<String, Value>>,
        }

        TableView {
            dimension: self.dimension,
            columns: self.columns(),
            rows: self.to_records(),
        }
        .serialize(serializer)
    }
}

/// A ranked origin/destination pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteAggregate {
    pub start_station: String,
    pub end_station: String,
    pub start: Coordinate,
    pub end: Coordinate,
    pub trips: usize,
    /// Visual weight in [1, 5].
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationAggregate {
    pub name: String,
    pub coordinate: Coordinate,
    pub start_count: usize,
    pub end_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryMetrics {
    pub total_trips: usize,
    pub filtered_trips: usize,
    /// Absent when the dataset has no rider column.
    pub distinct_riders: Option<usize>,
}

/// Everything one pipeline run produces.
#[derive(Debug, Serialize)]
pub struct PipelineOutput {
    pub generated_at: DateTime<Utc>,
    pub summary: SummaryMetrics,
    pub breakdown: BreakdownTable,
    pub routes: Vec<RouteAggregate>,
    pub stations: Vec<StationAggregate>,
    pub notices: Vec<MissingColumn>,
}
