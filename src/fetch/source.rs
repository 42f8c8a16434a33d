use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{HttpClient, fetch_bytes};

/// Where the trip log comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Local(PathBuf),
    /// Downloaded once into the cache directory under `cache_name`.
    Remote { url: String, cache_name: String },
}

impl DataSource {
    /// Accepts a file path, an `http(s)://` URL, or `gdrive:<FILE_ID>`.
    pub fn parse(source: &str) -> Self {
        if let Some(file_id) = source.strip_prefix("gdrive:") {
            return DataSource::Remote {
                url: drive_download_url(file_id),
                cache_name: sanitize(&format!("gdrive_{file_id}.csv")),
            };
        }

        if source.starts_with("http://") || source.starts_with("https://") {
            return DataSource::Remote {
                url: source.to_string(),
                cache_name: cache_name_for(source),
            };
        }

        DataSource::Local(PathBuf::from(source))
    }

    /// Whether the payload should be gunzipped before CSV parsing.
    pub fn is_gzip(&self) -> bool {
        match self {
            DataSource::Local(path) => path.extension().is_some_and(|ext| ext == "gz"),
            DataSource::Remote { cache_name, .. } => cache_name.ends_with(".gz"),
        }
    }
}

/// Direct-download URL for a Google Drive file share.
pub fn drive_download_url(file_id: &str) -> String {
    format!("https://drive.google.com/uc?export=download&id={file_id}")
}

/// Cache file name for a URL. Drive download links map to the same name as
/// `gdrive:<id>`; otherwise the query string is folded in ahead of the last
/// path segment so `download?id=1` and `download?id=2` stay apart.
fn cache_name_for(url: &str) -> String {
    let Ok(parsed) = reqwest::Url::parse(url) else {
        return sanitize(url);
    };

    if parsed.host_str() == Some("drive.google.com")
        && let Some((_, file_id)) = parsed.query_pairs().find(|(key, _)| key == "id")
    {
        return sanitize(&format!("gdrive_{file_id}.csv"));
    }

    let segment = parsed
        .path_segments()
        .and_then(|segments| segments.rev().find(|s| !s.is_empty()))
        .unwrap_or("dataset.csv");

    match parsed.query().filter(|q| !q.is_empty()) {
        Some(query) => sanitize(&format!("{query}_{segment}")),
        None => sanitize(segment),
    }
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Returns a local path holding the dataset, downloading remote sources into
/// `cache_dir` unless a cached copy exists and `refresh` is off.
#[tracing::instrument(skip(client))]
pub async fn resolve<C: HttpClient>(
    client: &C,
    source: &DataSource,
    cache_dir: &Path,
    refresh: bool,
) -> Result<PathBuf> {
    match source {
        DataSource::Local(path) => {
            if !path.exists() {
                bail!("Dataset file '{}' does not exist", path.display());
            }
            Ok(path.clone())
        }
        DataSource::Remote { url, cache_name } => {
            let path = cache_dir.join(cache_name);
            if path.exists() && !refresh {
                info!(path = %path.display(), "Using cached dataset");
                return Ok(path);
            }

            std::fs::create_dir_all(cache_dir).with_context(|| {
                format!("Failed to create cache directory '{}'", cache_dir.display())
            })?;

            debug!(url = %url, "Downloading dataset");
            let bytes = fetch_bytes(client, url)
                .await
                .with_context(|| format!("Failed to download '{url}'"))?;

            // Only a complete download may appear under the cache name.
            let partial = cache_dir.join(format!("{cache_name}.part"));
            if let Err(e) = std::fs::write(&partial, &bytes) {
                let _ = std::fs::remove_file(&partial);
                return Err(e).with_context(|| format!("Failed to write '{}'", partial.display()));
            }
            std::fs::rename(&partial, &path)
                .with_context(|| format!("Failed to move download into '{}'", path.display()))?;

            info!(bytes = bytes.len(), path = %path.display(), "Dataset downloaded");
            Ok(path)
        }
    }
}
