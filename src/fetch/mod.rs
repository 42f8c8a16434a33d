//! Dataset retrieval: local files, plain URLs and Google Drive file ids.

mod basic;
mod client;
mod source;

pub use basic::BasicClient;
pub use client::HttpClient;
pub use source::{DataSource, drive_download_url, resolve};

use anyhow::{Result, bail};
use reqwest::header::{CONTENT_TYPE, HeaderMap};

/// Downloads `url` and returns the body.
///
/// # Errors
///
/// Fails on non-2xx statuses and on HTML bodies. Google Drive answers files
/// too large to virus-scan with an HTML confirmation page instead of the data.
pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Vec<u8>> {
    let req = reqwest::Request::new(reqwest::Method::GET, url.parse()?);

    let resp = client.execute(req).await?.error_for_status()?;
    ensure_not_html(resp.headers())?;
    Ok(resp.bytes().await?.to_vec())
}

fn ensure_not_html(headers: &HeaderMap) -> Result<()> {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if content_type.trim_start().to_ascii_lowercase().starts_with("text/html") {
        bail!(
            "Server returned an HTML page instead of a data file \
             (for large Google Drive files, download it manually and pass the local path)"
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_html_content_type_is_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/html; charset=utf-8"));
        assert!(ensure_not_html(&headers).is_err());
    }

    #[test]
    fn test_data_content_types_pass() {
        let mut headers = HeaderMap::new();
        assert!(ensure_not_html(&headers).is_ok());

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/csv"));
        assert!(ensure_not_html(&headers).is_ok());

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/octet-stream"));
        assert!(ensure_not_html(&headers).is_ok());
    }
}
