//! Data models for collected headlines and the reports built from them.
//!
//! This module defines the core data structures used throughout the application:
//! - [`Source`]: A news list page to search and the tag its headlines live in
//! - [`NewsItem`]: One keyword-matching headline with its snippet and topic
//! - [`SourceBatch`]: Everything a single source produced during a run
//! - [`SearchReport`]: The aggregated result of one search, written to JSON
//! - [`TopicCount`]: Number of items carrying a given topic label

use serde::{Deserialize, Serialize};

/// Topic assigned before classification runs, and when the model replies with nothing.
pub const UNCLASSIFIED: &str = "unclassified";

/// A news list page to scrape.
///
/// The `tag` is a heuristic: every element with that name is treated as a
/// headline candidate, whether or not the site actually uses it for headlines.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Source {
    /// Display label, e.g. `"ETtoday"`.
    pub name: String,
    /// URL of the list or search page.
    pub url: String,
    /// HTML element name wrapping each headline, e.g. `"h2"`.
    pub tag: String,
}

impl Source {
    pub fn new(name: impl Into<String>, url: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            tag: tag.into(),
        }
    }
}

/// A single headline that matched the search keyword.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct NewsItem {
    /// Label of the site the headline was found on.
    pub source_name: String,
    /// Headline text; always contains the search keyword.
    pub title: String,
    /// Up to 500 characters of article text, or a placeholder when the fetch failed.
    pub content_snippet: String,
    /// Absolute URL of the article.
    pub article_url: String,
    /// Topic label from the classifier, or a sentinel string on failure.
    pub topic: String,
}

/// Output of one collector call for one source.
#[derive(Debug, Default)]
pub struct SourceBatch {
    pub source_name: String,
    pub items: Vec<NewsItem>,
    /// Set when the list page could not be fetched or parsed.
    pub warning: Option<String>,
}

impl SourceBatch {
    /// An empty batch that records why the source produced nothing.
    pub fn failed(source_name: &str, warning: String) -> Self {
        Self {
            source_name: source_name.to_string(),
            items: Vec::new(),
            warning: Some(warning),
        }
    }
}

/// The result of one search run.
///
/// Serialized to JSON so that `ask` can reload it later.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct SearchReport {
    /// The keyword headlines were filtered by.
    pub keyword: String,
    /// The date of the run in `YYYY-MM-DD` format.
    pub local_date: String,
    /// The local time of the run in `HH:MM:SS` format.
    pub local_time: String,
    /// Names of the sources that were searched, in order.
    pub sources: Vec<String>,
    /// Soft failures collected during the run (unreachable sources and the like).
    pub warnings: Vec<String>,
    /// Classified items in per-source, then per-headline order.
    pub items: Vec<NewsItem>,
}

/// How many items carry a given topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopicCount {
    pub topic: String,
    pub count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(topic: &str) -> NewsItem {
        NewsItem {
            source_name: "Example".to_string(),
            title: "Acme launches".to_string(),
            content_snippet: "Body".to_string(),
            article_url: "http://example.test/news/1".to_string(),
            topic: topic.to_string(),
        }
    }

    #[test]
    fn test_source_new() {
        let source = Source::new("Example", "http://example.test/list", "h2");
        assert_eq!(source.name, "Example");
        assert_eq!(source.url, "http://example.test/list");
        assert_eq!(source.tag, "h2");
    }

    #[test]
    fn test_failed_batch_is_empty_with_warning() {
        let batch = SourceBatch::failed("Example", "HTTP 500".to_string());
        assert_eq!(batch.source_name, "Example");
        assert!(batch.items.is_empty());
        assert_eq!(batch.warning.as_deref(), Some("HTTP 500"));
    }

    #[test]
    fn test_report_serialization() {
        let report = SearchReport {
            keyword: "Acme".to_string(),
            local_date: "2025-05-06".to_string(),
            local_time: "20:30:00".to_string(),
            sources: vec!["Example".to_string()],
            warnings: vec![],
            items: vec![item("Technology")],
        };

        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"keyword\":\"Acme\""));
        assert!(json.contains("Technology"));
        assert!(json.contains("http://example.test/news/1"));
    }

    #[test]
    fn test_report_deserialization() {
        let json = r#"{
            "keyword": "Acme",
            "local_date": "2025-05-06",
            "local_time": "08:00:00",
            "sources": ["Example"],
            "warnings": ["Other: HTTP 503"],
            "items": [{
                "source_name": "Example",
                "title": "Acme launches",
                "content_snippet": "Body",
                "article_url": "http://example.test/news/1",
                "topic": "Business"
            }]
        }"#;

        let report: SearchReport = serde_json::from_str(json).unwrap();
        assert_eq!(report.items.len(), 1);
        assert_eq!(report.items[0].topic, "Business");
        assert_eq!(report.warnings, vec!["Other: HTTP 503".to_string()]);
    }
}
