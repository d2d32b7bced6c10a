//! Batch orchestration: collect, classify, aggregate.
//!
//! For each selected source in order, the collector gathers keyword-matching
//! items; each item is then classified, with the throttle pausing between
//! consecutive classifier calls. Everything runs sequentially. A failing
//! source only adds a warning to the report; a failing classification only
//! degrades that item's topic.

use crate::api::ChatCompletion;
use crate::classifier::TopicClassifier;
use crate::models::{SearchReport, Source};
use crate::scrapers::headlines::HeadlineCollector;
use crate::throttle::Throttle;
use chrono::Local;
use tracing::{info, instrument, warn};

/// The search-and-classify pipeline, wired with its collaborators.
#[derive(Debug)]
pub struct Pipeline<C, T> {
    collector: HeadlineCollector,
    classifier: TopicClassifier<C>,
    throttle: T,
}

impl<C, T> Pipeline<C, T>
where
    C: ChatCompletion,
    T: Throttle,
{
    pub fn new(collector: HeadlineCollector, classifier: TopicClassifier<C>, throttle: T) -> Self {
        Self {
            collector,
            classifier,
            throttle,
        }
    }

    /// Search `sources` for `keyword` and label every matching item with a topic.
    ///
    /// Always returns a report. Items appear in source order, then list-page
    /// order. An empty keyword or source list produces an empty report with a
    /// warning instead of searching.
    #[instrument(level = "info", skip_all, fields(%keyword, sources = sources.len()))]
    pub async fn run(&self, sources: &[Source], keyword: &str) -> SearchReport {
        let now = Local::now();
        let mut report = SearchReport {
            keyword: keyword.to_string(),
            local_date: now.date_naive().to_string(),
            local_time: now.format("%H:%M:%S").to_string(),
            ..SearchReport::default()
        };

        if keyword.trim().is_empty() {
            warn!("Empty keyword; nothing to search");
            report.warnings.push("keyword is empty; nothing was searched".to_string());
            return report;
        }
        if sources.is_empty() {
            warn!("No sources selected; nothing to search");
            report.warnings.push("no sources selected; nothing was searched".to_string());
            return report;
        }

        let mut classified = 0usize;
        for source in sources {
            report.sources.push(source.name.clone());
            let batch = self.collector.collect(source, keyword).await;
            if let Some(warning) = batch.warning {
                report.warnings.push(warning);
            }

            let found = batch.items.len();
            for mut item in batch.items {
                if classified > 0 {
                    self.throttle.pause().await;
                }
                item.topic = self
                    .classifier
                    .classify(&item.title, &item.content_snippet)
                    .await;
                classified += 1;
                report.items.push(item);
            }
            info!(source = %batch.source_name, items = found, "Source done");
        }

        info!(
            items = report.items.len(),
            warnings = report.warnings.len(),
            "Search complete"
        );
        report
    }
}
