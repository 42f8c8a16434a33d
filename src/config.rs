use anyhow::{Context, Result};
use std::collections::HashMap;

use crate::ingest::normalize_column;

/// Declarative rename table applied to source columns after normalization.
///
/// Stored as a plain JSON object on disk, source column on the left and the
/// canonical name on the right:
/// ```json
/// {
///   "from_station_name": "start_station_name",
///   "Product Name": "product_name"
/// }
/// ```
/// Keys are normalized on load, so either spelling of a header matches.
#[derive(Debug, Default, Clone)]
pub struct ColumnMapping {
    entries: HashMap<String, String>,
}

impl ColumnMapping {
    /// Loads the table from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read column mapping '{path}'"))?;
        Self::from_json(&content).with_context(|| format!("Invalid column mapping '{path}'"))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let entries: HashMap<String, String> = serde_json::from_str(content)?;
        Ok(Self::from_pairs(entries))
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let entries = pairs
            .into_iter()
            .map(|(k, v)| (normalize_column(k.as_ref()), normalize_column(v.as_ref())))
            .collect();
        Self { entries }
    }

    /// Canonical name for an already-normalized column; unmapped columns pass
    /// through unchanged.
    pub fn resolve<'a>(&'a self, column: &'a str) -> &'a str {
        self.entries.get(column).map(String::as_str).unwrap_or(column)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
