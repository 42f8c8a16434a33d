//! Pivoted trip counts by (start, end, product, pitt flag) and time.

use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::analyzers::types::{
    BreakdownKey, BreakdownRow, BreakdownTable, Category, TimeDimension, TimeValue,
};
use crate::records::TripRecord;
use crate::schema::{Column, Schema};

/// Builds the breakdown table for the filtered trips.
///
/// Rows come out of grouping in ascending key order and are then stably
/// sorted by the rightmost (latest) time column, highest count first. The
/// table is empty when there are no trips, when none of the key columns
/// exist, or when the time dimension's columns are missing.
pub fn breakdown(trips: &[&TripRecord], schema: &Schema, dimension: TimeDimension) -> BreakdownTable {
    if trips.is_empty()
        || !schema.has_any(&BreakdownKey::COLUMNS)
        || !schema.has_all(dimension.columns())
    {
        return BreakdownTable::empty(dimension);
    }

    let mut groups: BTreeMap<BreakdownKey, BTreeMap<TimeValue, usize>> = BTreeMap::new();
    let mut time_columns = BTreeSet::new();
    let mut skipped = 0usize;

    for trip in trips {
        let (Some(key), Some(time)) = (breakdown_key(trip, schema), dimension.value_of(trip)) else {
            skipped += 1;
            continue;
        };
        *groups.entry(key).or_default().entry(time).or_default() += 1;
        time_columns.insert(time);
    }

    let time_columns: Vec<TimeValue> = time_columns.into_iter().collect();

    let mut rows: Vec<BreakdownRow> = groups
        .into_iter()
        .map(|(key, cells)| BreakdownRow {
            key,
            counts: time_columns
                .iter()
                .map(|t| cells.get(t).copied().unwrap_or(0))
                .collect(),
        })
        .collect();

    // slice::sort_by is stable, so equal counts keep grouping order.
    rows.sort_by(|a, b| b.counts.last().cmp(&a.counts.last()));

    debug!(
        rows = rows.len(),
        columns = time_columns.len(),
        skipped,
        "Breakdown table built"
    );

    BreakdownTable {
        dimension,
        time_columns,
        rows,
    }
}

fn breakdown_key(trip: &TripRecord, schema: &Schema) -> Option<BreakdownKey> {
    Some(BreakdownKey {
        start_station: category(schema, Column::StartStationName, trip.start_station_name.as_ref())?,
        end_station: category(schema, Column::EndStationName, trip.end_station_name.as_ref())?,
        product: category(schema, Column::ProductName, trip.product_name.as_ref())?,
        pitt_rider: category(schema, Column::PittRider, trip.pitt_rider.as_ref())?,
    })
}

/// `Unknown` when the column is absent; `None` (skip the record) when the
/// column exists but this record has no value.
fn category<T: Clone>(schema: &Schema, column: Column, value: Option<&T>) -> Option<Category<T>> {
    if !schema.has(column) {
        return Some(Category::Unknown);
    }
    value.cloned().map(Category::Value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn trip(start: &str, end: &str, product: &str, pitt: bool, year: i32, month: u32) -> TripRecord {
        TripRecord {
            start_station_name: Some(start.to_string()),
            end_station_name: Some(end.to_string()),
            product_name: Some(product.to_string()),
            pitt_rider: Some(pitt),
            year: Some(year),
            month: Some(month),
            ..Default::default()
        }
    }

    fn key(start: &str, end: &str, product: &str, pitt: bool) -> BreakdownKey {
        BreakdownKey {
            start_station: Category::Value(start.to_string()),
            end_station: Category::Value(end.to_string()),
            product: Category::Value(product.to_string()),
            pitt_rider: Category::Value(pitt),
        }
    }

    #[test]
    fn test_empty_input_gives_empty_table() {
        let table = breakdown(&[], &Schema::complete(), TimeDimension::Year);
        assert!(table.is_empty());
        assert!(table.time_columns.is_empty());
    }

    #[test]
    fn test_year_breakdown_orders_by_last_column() {
        let trips = vec![
            trip("B", "C", "Premium", true, 2023, 2),
            trip("A", "B", "Basic", false, 2023, 1),
            trip("A", "B", "Basic", false, 2023, 1),
        ];
        let refs: Vec<&TripRecord> = trips.iter().collect();
        let table = breakdown(&refs, &Schema::complete(), TimeDimension::Year);

        assert_eq!(table.columns().last().map(String::as_str), Some("2023"));
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].key, key("A", "B", "Basic", false));
        assert_eq!(table.rows[0].counts, vec![2]);
        assert_eq!(table.rows[1].key, key("B", "C", "Premium", true));
        assert_eq!(table.rows[1].counts, vec![1]);
    }

    #[test]
    fn test_missing_combinations_are_zero_and_ties_keep_group_order() {
        let trips = vec![
            trip("C", "A", "Basic", false, 2022, 5),
            trip("C", "A", "Basic", false, 2022, 6),
            trip("B", "A", "Basic", false, 2023, 5),
            trip("A", "B", "Basic", false, 2023, 5),
        ];
        let refs: Vec<&TripRecord> = trips.iter().collect();
        let table = breakdown(&refs, &Schema::complete(), TimeDimension::Year);

        assert_eq!(table.columns()[4..], ["2022".to_string(), "2023".to_string()]);
        // A and B tie on 2023 and keep ascending key order; C has no 2023 trips.
        assert_eq!(table.rows[0].key, key("A", "B", "Basic", false));
        assert_eq!(table.rows[1].key, key("B", "A", "Basic", false));
        assert_eq!(table.rows[2].key, key("C", "A", "Basic", false));
        assert_eq!(table.rows[2].counts, vec![2, 0]);
    }

    #[test]
    fn test_period_dimension_sorts_chronologically() {
        let trips = vec![
            trip("A", "B", "Basic", false, 2023, 1),
            trip("A", "B", "Basic", false, 2022, 12),
            trip("A", "B", "Basic", false, 2022, 12),
        ];
        let refs: Vec<&TripRecord> = trips.iter().collect();
        let table = breakdown(&refs, &Schema::complete(), TimeDimension::Period);

        let labels: Vec<String> = table.time_columns.iter().map(ToString::to_string).collect();
        assert_eq!(labels, vec!["12-2022", "01-2023"]);
        assert_eq!(table.rows[0].counts, vec![2, 1]);
    }

    #[test]
    fn test_row_totals_match_key_counts() {
        let trips = vec![
            trip("A", "B", "Basic", false, 2021, 1),
            trip("A", "B", "Basic", false, 2022, 1),
            trip("A", "B", "Basic", false, 2023, 1),
            trip("A", "B", "Basic", true, 2023, 1),
        ];
        let refs: Vec<&TripRecord> = trips.iter().collect();
        let table = breakdown(&refs, &Schema::complete(), TimeDimension::Year);

        for row in &table.rows {
            let expected = trips
                .iter()
                .filter(|t| key(
                    t.start_station_name.as_deref().unwrap(),
                    t.end_station_name.as_deref().unwrap(),
                    t.product_name.as_deref().unwrap(),
                    t.pitt_rider.unwrap(),
                ) == row.key)
                .count();
            assert_eq!(row.total(), expected);
        }
    }

    #[test]
    fn test_records_missing_a_value_are_skipped() {
        let mut incomplete = trip("A", "B", "Basic", false, 2023, 1);
        incomplete.pitt_rider = None;
        let trips = vec![incomplete, trip("A", "B", "Basic", false, 2023, 1)];
        let refs: Vec<&TripRecord> = trips.iter().collect();
        let table = breakdown(&refs, &Schema::complete(), TimeDimension::Year);

        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].total(), 1);
    }

    #[test]
    fn test_absent_key_column_uses_unknown_marker() {
        let columns: BTreeSet<String> = ["start_station_name", "end_station_name", "pitt_rider", "year"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let schema = Schema::validate(&columns);
        let mut t = trip("A", "B", "ignored", false, 2023, 1);
        t.product_name = None;
        let trips = vec![t];
        let refs: Vec<&TripRecord> = trips.iter().collect();

        let table = breakdown(&refs, &schema, TimeDimension::Year);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].key.product, Category::Unknown);
    }

    #[test]
    fn test_no_key_columns_or_time_column_gives_empty_table() {
        let trips = vec![trip("A", "B", "Basic", false, 2023, 1)];
        let refs: Vec<&TripRecord> = trips.iter().collect();

        let only_time: BTreeSet<String> = ["year", "month"].iter().map(|s| s.to_string()).collect();
        assert!(breakdown(&refs, &Schema::validate(&only_time), TimeDimension::Year).is_empty());

        let no_month: BTreeSet<String> = ["start_station_name", "year"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let schema = Schema::validate(&no_month);
        assert!(breakdown(&refs, &schema, TimeDimension::Period).is_empty());
        assert!(!breakdown(&refs, &schema, TimeDimension::Year).is_empty());
    }
}
