//! CSV ingestion: header normalization, renaming and typed record parsing.

use anyhow::{Context, Result, bail};
use csv::StringRecord;
use flate2::read::GzDecoder;
use regex::Regex;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, info, warn};

use crate::config::ColumnMapping;
use crate::records::{Dataset, TripRecord};
use crate::schema::Column;

static SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s()\-]+").expect("valid separator pattern"));
static DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9_]").expect("valid identifier pattern"));

/// Turns a raw header into a snake_case ASCII identifier: trim, lowercase,
/// collapse whitespace/parentheses/hyphens into `_`, drop everything else.
pub fn normalize_column(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    let joined = SEPARATORS.replace_all(&lowered, "_");
    DISALLOWED.replace_all(&joined, "").into_owned()
}

/// Normalized and renamed headers. A name claimed twice keeps its first
/// column; later ones get a `__dup<N>` suffix so they cannot shadow it.
fn canonical_headers(headers: &StringRecord, mapping: &ColumnMapping) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();

    headers
        .iter()
        .map(|raw| {
            let normalized = normalize_column(raw);
            let name = mapping.resolve(&normalized).to_string();
            let count = seen.entry(name.clone()).or_default();
            *count += 1;
            if *count == 1 {
                name
            } else {
                warn!(column = %name, raw, "Duplicate column after normalization");
                format!("{name}__dup{}", *count - 1)
            }
        })
        .collect()
}

/// Parses a trip CSV from any reader.
///
/// # Errors
///
/// Returns an error if the CSV is structurally invalid (unreadable header,
/// rows with the wrong number of fields) or if the header names none of the
/// expected columns, which usually means the payload is not a trip log at all.
/// Bad values inside a row are treated as missing instead.
pub fn parse_dataset<R: Read>(reader: R, mapping: &ColumnMapping) -> Result<Dataset> {
    let mut rdr = csv::Reader::from_reader(reader);

    let headers = rdr.headers().context("Failed to read CSV header")?.clone();
    if !mapping.is_empty() {
        debug!(entries = mapping.len(), "Applying column mapping");
    }
    let columns = canonical_headers(&headers, mapping);
    if !columns.iter().any(|c| Column::from_name(c).is_some()) {
        bail!(
            "None of the expected trip columns found in header ({} columns)",
            columns.len()
        );
    }
    rdr.set_headers(StringRecord::from(columns.clone()));

    let mut records = Vec::new();
    for (row, result) in rdr.deserialize::<TripRecord>().enumerate() {
        let record = result.with_context(|| format!("Malformed trip row {}", row + 1))?;
        records.push(record);
    }

    let dataset = Dataset::new(columns, records);

    if dataset.is_empty() {
        warn!("Dataset has a header but no trip rows");
    }
    for notice in dataset.schema().missing() {
        warn!(column = %notice.column, "{notice}");
    }
    info!(
        records = dataset.len(),
        complete_schema = dataset.schema().is_complete(),
        "Dataset parsed"
    );

    Ok(dataset)
}

/// Loads a dataset from a local file, gunzipping it when `gzip` is set.
#[tracing::instrument(skip(mapping))]
pub fn load_dataset(path: &Path, gzip: bool, mapping: &ColumnMapping) -> Result<Dataset> {
    let file = File::open(path).with_context(|| format!("Failed to open '{}'", path.display()))?;
    let reader = BufReader::new(file);

    if gzip {
        parse_dataset(GzDecoder::new(reader), mapping)
    } else {
        parse_dataset(reader, mapping)
    }
}
