//! JSON report files.
//!
//! A search report is written so that later `ask` runs can reload it.
//!
//! # Output Structure
//!
//! ```text
//! json_output_dir/
//! └── 2025-05-06/
//!     ├── asus_083015.json
//!     └── acme_142200.json
//! ```

use crate::models::SearchReport;
use crate::utils::slugify_title;
use std::error::Error;
use tokio::fs;
use tracing::{error, info, instrument};

/// File name (without directory) for a report: `{keyword-slug}_{HHMMSS}.json`.
pub fn report_filename(report: &SearchReport) -> String {
    let slug = slugify_title(&report.keyword);
    let slug = if slug.is_empty() { "search".to_string() } else { slug };
    format!("{}_{}.json", slug, report.local_time.replace(':', ""))
}

/// Write a [`SearchReport`] under a per-date directory and return the file path.
///
/// # Output Path
///
/// `{json_output_dir}/{local_date}/{keyword-slug}_{HHMMSS}.json`
#[instrument(level = "info", skip_all, fields(json_output_dir = %json_output_dir))]
pub async fn write_report(
    report: &SearchReport,
    json_output_dir: &str,
) -> Result<String, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(report)?;

    let full_json_dir = format!(
        "{}/{}",
        json_output_dir.trim_end_matches('/'),
        report.local_date
    );
    info!(%full_json_dir, "Ensuring JSON directory exists");
    if let Err(e) = fs::create_dir_all(&full_json_dir).await {
        error!(%full_json_dir, error = %e, "Failed to create JSON dir");
        return Err(e.into());
    }

    let path = format!("{}/{}", full_json_dir, report_filename(report));
    fs::write(&path, json).await?;
    info!(%path, items = report.items.len(), "Wrote JSON report");
    Ok(path)
}

/// Load a report previously written by [`write_report`].
#[instrument(level = "info")]
pub async fn read_report(path: &str) -> Result<SearchReport, Box<dyn Error>> {
    let raw = fs::read_to_string(path)
        .await
        .map_err(|e| format!("cannot read report {path}: {e}"))?;
    let report: SearchReport = serde_json::from_str(&raw)?;
    info!(items = report.items.len(), keyword = %report.keyword, "Loaded report");
    Ok(report)
}
