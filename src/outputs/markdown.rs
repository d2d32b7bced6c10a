//! Markdown digest of a search.
//!
//! The digest has a header, any warnings the run produced, the per-topic
//! distribution, and one table row per item.

use crate::analysis::topic_counts;
use crate::models::{NewsItem, SearchReport};
use crate::utils::truncate_chars;
use std::error::Error;
use std::fmt::Write;
use tokio::fs;
use tracing::{info, instrument};

/// Snippet length shown in the items table.
const TABLE_SNIPPET_CHARS: usize = 120;

fn cell(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ").replace('|', "\\|")
}

/// Render `items` (usually the report's items after a topic filter) as Markdown.
pub fn report_to_markdown(report: &SearchReport, items: &[&NewsItem]) -> String {
    let mut md = String::new();

    writeln!(md, "# News search: {}\n", report.keyword).unwrap();
    writeln!(
        md,
        "_{} {} · sources: {}_\n",
        report.local_date,
        report.local_time,
        if report.sources.is_empty() {
            "(none)".to_string()
        } else {
            report.sources.join(", ")
        }
    )
    .unwrap();

    if !report.warnings.is_empty() {
        writeln!(md, "## Warnings\n").unwrap();
        for warning in &report.warnings {
            writeln!(md, "- {}", cell(warning)).unwrap();
        }
        writeln!(md).unwrap();
    }

    if items.is_empty() {
        writeln!(
            md,
            "No headlines to show. Try another keyword, more sources, or a wider topic filter."
        )
        .unwrap();
        return md;
    }

    writeln!(md, "## Topic distribution\n").unwrap();
    writeln!(md, "| Topic | Items |").unwrap();
    writeln!(md, "| --- | ---: |").unwrap();
    for count in topic_counts(items) {
        writeln!(md, "| {} | {} |", cell(&count.topic), count.count).unwrap();
    }
    writeln!(md).unwrap();

    writeln!(md, "## Items\n").unwrap();
    writeln!(md, "| Topic | Source | Title | Snippet |").unwrap();
    writeln!(md, "| --- | --- | --- | --- |").unwrap();
    for item in items {
        let snippet = cell(&item.content_snippet);
        let snippet = if snippet.chars().count() > TABLE_SNIPPET_CHARS {
            format!("{}…", truncate_chars(&snippet, TABLE_SNIPPET_CHARS))
        } else {
            snippet
        };
        writeln!(
            md,
            "| {} | {} | [{}](<{}>) | {} |",
            cell(&item.topic),
            cell(&item.source_name),
            cell(&item.title),
            item.article_url,
            snippet
        )
        .unwrap();
    }

    md
}

/// Write a digest next to other digests and return its path.
///
/// # Output Path
///
/// `{markdown_output_dir}/{local_date}_{keyword-slug}_{HHMMSS}.md`
#[instrument(level = "info", skip_all, fields(%markdown_output_dir))]
pub async fn write_markdown(
    report: &SearchReport,
    markdown: &str,
    markdown_output_dir: &str,
) -> Result<String, Box<dyn Error>> {
    fs::create_dir_all(markdown_output_dir).await?;
    let stem = super::json::report_filename(report);
    let path = format!(
        "{}/{}_{}",
        markdown_output_dir.trim_end_matches('/'),
        report.local_date,
        stem.trim_end_matches(".json")
    ) + ".md";
    fs::write(&path, markdown).await?;
    info!(%path, "Wrote Markdown digest");
    Ok(path)
}
