//! Narrowing the trip log down to the records a user asked for.

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::records::{Dataset, TripRecord};

/// Three-state selector over the pitt-rider flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum RiderCategory {
    #[default]
    All,
    /// Keep pitt riders only.
    Only,
    /// Drop pitt riders.
    Exclude,
}

impl RiderCategory {
    fn matches(self, pitt_rider: Option<bool>) -> bool {
        match self {
            RiderCategory::All => true,
            RiderCategory::Only => pitt_rider == Some(true),
            RiderCategory::Exclude => pitt_rider == Some(false),
        }
    }
}

/// User-chosen criteria. Unset fields (and empty sets) match everything; set
/// fields are combined with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub start_station: Option<String>,
    pub end_station: Option<String>,
    pub start_neighborhood: Option<String>,
    pub end_neighborhood: Option<String>,
    pub products: BTreeSet<String>,
    pub years: BTreeSet<i32>,
    pub months: BTreeSet<u32>,
    pub rider: RiderCategory,
}

impl FilterCriteria {
    pub fn is_unset(&self) -> bool {
        *self == FilterCriteria::default()
    }

    /// Whether a single record passes every criterion.
    pub fn matches(&self, record: &TripRecord) -> bool {
        exact(&self.start_station, &record.start_station_name)
            && exact(&self.end_station, &record.end_station_name)
            && exact(&self.start_neighborhood, &record.start_neighborhood)
            && exact(&self.end_neighborhood, &record.end_neighborhood)
            && member(&self.products, record.product_name.as_ref())
            && member(&self.years, record.year.as_ref())
            && member(&self.months, record.month.as_ref())
            && self.rider.matches(record.pitt_rider)
    }
}

fn exact(wanted: &Option<String>, value: &Option<String>) -> bool {
    match wanted {
        None => true,
        Some(w) => value.as_deref() == Some(w.as_str()),
    }
}

fn member<T: Ord>(set: &BTreeSet<T>, value: Option<&T>) -> bool {
    set.is_empty() || value.is_some_and(|v| set.contains(v))
}

/// Returns references to the records matching `criteria`, in dataset order.
#[tracing::instrument(skip_all, fields(total = dataset.len()))]
pub fn apply<'a>(dataset: &'a Dataset, criteria: &FilterCriteria) -> Vec<&'a TripRecord> {
    if criteria.is_unset() {
        return dataset.records().iter().collect();
    }

    let filtered: Vec<&TripRecord> = dataset
        .records()
        .iter()
        .filter(|record| criteria.matches(record))
        .collect();

    tracing::debug!(filtered = filtered.len(), "Filter applied");
    filtered
}

/// Distinct values offered for each criterion, taken from the full dataset.
#[derive(Debug, Default, Serialize)]
pub struct FilterOptions {
    pub start_stations: Vec<String>,
    pub end_stations: Vec<String>,
    pub start_neighborhoods: Vec<String>,
    pub end_neighborhoods: Vec<String>,
    pub products: Vec<String>,
    pub years: Vec<i32>,
    pub months: Vec<u32>,
}

impl FilterOptions {
    pub fn from_dataset(dataset: &Dataset) -> Self {
        let records = dataset.records();

        fn distinct<T, F>(records: &[TripRecord], field: F) -> Vec<T>
        where
            T: Ord + Clone,
            F: Fn(&TripRecord) -> Option<&T>,
        {
            records
                .iter()
                .filter_map(field)
                .cloned()
                .sorted()
                .dedup()
                .collect()
        }

        Self {
            start_stations: distinct(records, |r| r.start_station_name.as_ref()),
            end_stations: distinct(records, |r| r.end_station_name.as_ref()),
            start_neighborhoods: distinct(records, |r| r.start_neighborhood.as_ref()),
            end_neighborhoods: distinct(records, |r| r.end_neighborhood.as_ref()),
            products: distinct(records, |r| r.product_name.as_ref()),
            years: distinct(records, |r| r.year.as_ref()),
            months: records
                .iter()
                .filter_map(TripRecord::valid_month)
                .sorted()
                .dedup()
                .collect(),
        }
    }
}
