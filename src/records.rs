//! Trip records and the immutable dataset handle the pipeline runs against.

use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::schema::Schema;

/// One logged ride, with every column already normalized to its canonical name.
///
/// All fields are optional: a value absent here only excludes the record from
/// the aggregates that need that value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TripRecord {
    #[serde(default)]
    pub rider_id: Option<String>,
    #[serde(default)]
    pub start_station_name: Option<String>,
    #[serde(default)]
    pub end_station_name: Option<String>,
    #[serde(default)]
    pub start_neighborhood: Option<String>,
    #[serde(default)]
    pub end_neighborhood: Option<String>,
    #[serde(default)]
    pub product_name: Option<String>,

    #[serde(default, deserialize_with = "flexible_int")]
    pub year: Option<i32>,
    #[serde(default, deserialize_with = "flexible_int")]
    pub month: Option<u32>,
    #[serde(default, deserialize_with = "flexible_bool")]
    pub pitt_rider: Option<bool>,

    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub start_lat: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub start_lon: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub end_lat: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub end_lon: Option<f64>,
}

impl TripRecord {
    pub fn start_coordinate(&self) -> Option<Coordinate> {
        Some(Coordinate::new(self.start_lat?, self.start_lon?))
    }

    pub fn end_coordinate(&self) -> Option<Coordinate> {
        Some(Coordinate::new(self.end_lat?, self.end_lon?))
    }

    /// Month in 1..=12, or `None` when absent or out of range.
    pub fn valid_month(&self) -> Option<u32> {
        self.month.filter(|m| (1..=12).contains(m))
    }
}

/// Accepts `2023` as well as `2023.0`, which is how float-typed exports write
/// integer columns. Anything else is treated as absent.
fn flexible_int<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<i64>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| parse_int(&s)))
}

fn parse_int<T: TryFrom<i64>>(s: &str) -> Option<T> {
    let s = s.trim();
    let value = match s.parse::<i64>() {
        Ok(v) => v,
        Err(_) => {
            let f = s.parse::<f64>().ok()?;
            if f.fract() != 0.0 || !f.is_finite() {
                return None;
            }
            f as i64
        }
    };
    T::try_from(value).ok()
}

fn flexible_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| parse_bool(&s)))
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "1" | "1.0" | "yes" | "y" => Some(true),
        "false" | "f" | "0" | "0.0" | "no" | "n" => Some(false),
        _ => None,
    }
}

/// A latitude/longitude pair.
///
/// Ordered and compared with `f64::total_cmp` so it can take part in grouping
/// keys.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl PartialEq for Coordinate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Coordinate {}

impl PartialOrd for Coordinate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Coordinate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.lat
            .total_cmp(&other.lat)
            .then_with(|| self.lon.total_cmp(&other.lon))
    }
}

/// Loaded trip log. Built once, then only read.
#[derive(Debug)]
pub struct Dataset {
    records: Vec<TripRecord>,
    schema: Schema,
}

impl Dataset {
    /// Builds a dataset from records and the (normalized) column names the
    /// source actually provided. The schema is validated here, once.
    pub fn new<I, S>(columns: I, records: Vec<TripRecord>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: BTreeSet<String> = columns.into_iter().map(Into::into).collect();
        Self {
            records,
            schema: Schema::validate(&columns),
        }
    }

    /// A dataset that claims every canonical column.
    pub fn from_records(records: Vec<TripRecord>) -> Self {
        Self {
            records,
            schema: Schema::complete(),
        }
    }

    pub fn records(&self) -> &[TripRecord] {
        &self.records
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
