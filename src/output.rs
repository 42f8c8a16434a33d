//! Output formatting and persistence for pipeline results.
//!
//! Supports pretty-printing, JSON serialization, and CSV export of the
//! breakdown table.

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::fs::File;
use std::io::{BufWriter, Write};
use tracing::{debug, info};

use crate::analyzers::types::{BreakdownTable, PipelineOutput};

/// Logs pipeline output using Rust's debug pretty-print format.
pub fn print_pretty(output: &PipelineOutput) {
    debug!("{:#?}", output);
}

/// Emits the headline numbers of a run as a single info event.
pub fn log_summary(output: &PipelineOutput) {
    info!(
        total = output.summary.total_trips,
        filtered = output.summary.filtered_trips,
        distinct_riders = output.summary.distinct_riders,
        breakdown_rows = output.breakdown.rows.len(),
        routes = output.routes.len(),
        stations = output.stations.len(),
        notices = output.notices.len(),
        "Pipeline summary"
    );
}

/// Writes any serializable value as pretty JSON to `path`, or to stdout when
/// no path is given.
pub fn write_json(path: Option<&str>, value: &impl Serialize) -> Result<()> {
    match path {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("Failed to create '{path}'"))?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, value)?;
            writer.flush()?;
            debug!(path, "JSON written");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            serde_json::to_writer_pretty(&mut stdout, value)?;
            writeln!(stdout)?;
        }
    }
    Ok(())
}

/// Writes the breakdown table as CSV: key columns, then one column per time
/// value.
pub fn write_breakdown_csv(path: &str, table: &BreakdownTable) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("Failed to create '{path}'"))?;

    writer.write_record(table.columns())?;
    for record in table.to_records() {
        writer.write_record(record.values().map(cell))?;
    }
    writer.flush()?;

    debug!(path, rows = table.rows.len(), "Breakdown CSV written");
    Ok(())
}

fn cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::analyzer::analyze;
    use crate::filter::FilterCriteria;
    use crate::records::{Dataset, TripRecord};
    use std::env;
    use std::fs;

    fn temp_path(name: &str) -> String {
        format!("{}/{}", env::temp_dir().display(), name)
    }

    fn output() -> PipelineOutput {
        let trip = TripRecord {
            start_station_name: Some("A".to_string()),
            end_station_name: Some("B".to_string()),
            product_name: Some("Basic".to_string()),
            pitt_rider: Some(false),
            year: Some(2023),
            month: Some(4),
            ..Default::default()
        };
        let dataset = Dataset::from_records(vec![trip.clone(), trip]);
        analyze(&dataset, &FilterCriteria::default())
    }

    #[test]
    fn test_print_pretty_does_not_panic() {
        print_pretty(&output());
        log_summary(&output());
    }

    #[test]
    fn test_write_json_file() {
        let path = temp_path("bikeshare_explorer_test_output.json");
        let _ = fs::remove_file(&path);

        write_json(Some(path.as_str()), &output()).unwrap();

        let json: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["summary"]["filtered_trips"], 2);
        assert_eq!(json["breakdown"]["dimension"], "year");
        assert_eq!(json["breakdown"]["rows"][0]["2023"], 2);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_breakdown_csv() {
        let path = temp_path("bikeshare_explorer_test_breakdown.csv");
        let _ = fs::remove_file(&path);

        write_breakdown_csv(&path, &output().breakdown).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(
            lines,
            vec![
                "start_station_name,end_station_name,product_name,pitt_rider,2023",
                "A,B,Basic,false,2",
            ]
        );

        fs::remove_file(&path).unwrap();
    }
}
