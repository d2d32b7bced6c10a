//! Headline collector.
//!
//! Given a list page, the tag its headlines are (presumably) wrapped in, and a
//! keyword, this module finds matching headlines, resolves their links, and
//! fetches a snippet of each article.
//!
//! # Matching
//!
//! Every element named `tag` is a candidate. Its text, trimmed, is the title;
//! titles that are empty or do not contain the keyword (case-sensitive) are
//! skipped, as are candidates without a nested `a[href]`. Nothing guarantees the
//! matched elements are actually headlines: a site redesign can silently change
//! what matches.
//!
//! # Links
//!
//! Links are resolved against the list page origin (`scheme://host[:port]`),
//! so `/news/1` and `news/1` both land at the site root. Absolute links pass
//! through. Links that resolve to something without a host are dropped.

use crate::config::HttpConfig;
use crate::models::{NewsItem, Source, SourceBatch, UNCLASSIFIED};
use crate::scrapers::{build_client, fetch_html};
use crate::utils::truncate_chars;
use futures::stream::{self, StreamExt};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::error::Error;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Maximum length of a content snippet, in characters.
pub const SNIPPET_MAX_CHARS: usize = 500;

/// Tags whose text makes up the article snippet, in extraction order.
pub const CONTENT_TAGS: [&str; 4] = ["article", "p", "div", "span"];

/// Prefix of the snippet used when an article page cannot be fetched.
pub const CONTENT_FETCH_FAILED: &str = "content fetch failed";

/// Snippet used when an article page has no extractable text.
pub const NO_CONTENT: &str = "no article content extracted";

static ANCHOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("valid anchor selector"));

static CONTENT_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    CONTENT_TAGS
        .iter()
        .map(|tag| Selector::parse(tag).expect("valid content selector"))
        .collect()
});

/// A keyword-matching headline with its resolved link, before its article is fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct Headline {
    pub title: String,
    pub url: String,
}

/// Collects keyword-matching headlines from list pages.
#[derive(Debug, Clone)]
pub struct HeadlineCollector {
    client: reqwest::Client,
}

impl HeadlineCollector {
    pub fn new(config: &HttpConfig) -> Result<Self, Box<dyn Error>> {
        Ok(Self {
            client: build_client(config)?,
        })
    }

    /// Collect every headline on `source` containing `keyword`, with article snippets.
    ///
    /// Never fails: a list page that cannot be fetched or parsed yields an empty
    /// batch carrying a warning, and an article that cannot be fetched yields an
    /// item with a placeholder snippet. Items keep list-page order and have their
    /// topic set to [`UNCLASSIFIED`].
    #[instrument(level = "info", skip_all, fields(source = %source.name, url = %source.url, tag = %source.tag))]
    pub async fn collect(&self, source: &Source, keyword: &str) -> SourceBatch {
        let body = match fetch_html(&self.client, &source.url).await {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, "List page fetch failed; skipping source");
                return SourceBatch::failed(
                    &source.name,
                    format!("{}: list page fetch failed: {}", source.name, e),
                );
            }
        };

        let headlines = match find_headlines(&body, &source.url, &source.tag, keyword) {
            Ok(headlines) => headlines,
            Err(e) => {
                warn!(error = %e, "List page could not be scanned; skipping source");
                return SourceBatch::failed(&source.name, format!("{}: {}", source.name, e));
            }
        };
        info!(count = headlines.len(), "Indexed matching headlines");

        let items: Vec<NewsItem> = stream::iter(headlines)
            .then(|headline| async move {
                let content_snippet = self.fetch_snippet(&headline.url).await;
                NewsItem {
                    source_name: source.name.clone(),
                    title: headline.title,
                    content_snippet,
                    article_url: headline.url,
                    topic: UNCLASSIFIED.to_string(),
                }
            })
            .collect()
            .await;

        info!(count = items.len(), "Fetched article snippets");
        SourceBatch {
            source_name: source.name.clone(),
            items,
            warning: None,
        }
    }

    /// Fetch an article and return at most [`SNIPPET_MAX_CHARS`] characters of its text.
    ///
    /// Fetch failures come back as a `"content fetch failed: …"` placeholder.
    #[instrument(level = "debug", skip(self))]
    pub async fn fetch_snippet(&self, url: &str) -> String {
        match fetch_html(&self.client, url).await {
            Ok(body) => extract_snippet(&body),
            Err(e) => {
                warn!(%url, error = %e, "Article fetch failed; using placeholder snippet");
                truncate_chars(&format!("{CONTENT_FETCH_FAILED}: {e}"), SNIPPET_MAX_CHARS)
            }
        }
    }
}

/// Scan a list page for headlines whose text contains `keyword`.
///
/// # Errors
///
/// Fails only when `list_url` has no usable origin or `tag` is not a valid
/// selector. Non-matching elements are skipped, not errors.
pub fn find_headlines(
    html: &str,
    list_url: &str,
    tag: &str,
    keyword: &str,
) -> Result<Vec<Headline>, Box<dyn Error>> {
    let base = list_origin(list_url)?;
    let selector =
        Selector::parse(tag).map_err(|e| format!("invalid headline tag {tag:?}: {e}"))?;
    let document = Html::parse_document(html);

    let mut headlines = Vec::new();
    for element in document.select(&selector) {
        let title = element.text().collect::<String>().trim().to_string();
        if title.is_empty() || !title.contains(keyword) {
            continue;
        }
        let Some(href) = element
            .select(&ANCHOR)
            .next()
            .and_then(|a| a.value().attr("href"))
        else {
            debug!(%title, "Headline has no link; skipping");
            continue;
        };
        match resolve_link(&base, href) {
            Some(url) => headlines.push(Headline {
                title,
                url: url.to_string(),
            }),
            None => debug!(%title, %href, "Headline link is not a web URL; skipping"),
        }
    }
    Ok(headlines)
}

/// The `scheme://host[:port]/` origin of a list page, used as the link base.
pub fn list_origin(list_url: &str) -> Result<Url, Box<dyn Error>> {
    let origin = Url::parse(list_url)?.origin();
    if !origin.is_tuple() {
        return Err(format!("list URL has no host: {list_url}").into());
    }
    Ok(Url::parse(&origin.ascii_serialization())?)
}

/// Resolve `href` against `base`, keeping only results that have a host.
pub fn resolve_link(base: &Url, href: &str) -> Option<Url> {
    base.join(href.trim()).ok().filter(|url| url.has_host())
}

/// Concatenate the text of all content-bearing elements and cut it to size.
pub fn extract_snippet(html: &str) -> String {
    let document = Html::parse_document(html);
    let merged = CONTENT_SELECTORS
        .iter()
        .flat_map(|selector| document.select(selector))
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    let merged = merged.trim();
    if merged.is_empty() {
        NO_CONTENT.to_string()
    } else {
        truncate_chars(merged, SNIPPET_MAX_CHARS)
    }
}
