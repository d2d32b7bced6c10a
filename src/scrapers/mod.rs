//! Keyword-driven headline scraping.
//!
//! Scraping happens in two phases per source:
//!
//! 1. **Indexing**: Fetch the list page, keep every element of the configured
//!    tag whose text contains the keyword, and resolve its first link
//! 2. **Fetching**: Download each linked article and keep a short text snippet
//!
//! Both phases share one [`reqwest::Client`] built by [`build_client`], so the
//! timeout and `User-Agent` are configured once.
//!
//! Failures never propagate out of a source: an unreachable list page yields an
//! empty batch with a warning, an unreachable article yields a placeholder
//! snippet. See [`headlines`].

pub mod headlines;

use crate::config::HttpConfig;
use crate::utils::error_chain;
use reqwest::StatusCode;
use std::error::Error;
use tracing::{debug, instrument};

/// Build the HTTP client used for list and article pages.
pub fn build_client(config: &HttpConfig) -> Result<reqwest::Client, Box<dyn Error>> {
    let client = reqwest::Client::builder()
        .timeout(config.timeout())
        .user_agent(config.user_agent.as_str())
        .build()?;
    Ok(client)
}

/// GET a page and return its body decoded as UTF-8.
///
/// The body is decoded as UTF-8 regardless of the declared charset; invalid
/// sequences are replaced. Any status other than `200 OK` is an error.
#[instrument(level = "debug", skip(client))]
pub async fn fetch_html(client: &reqwest::Client, url: &str) -> Result<String, Box<dyn Error>> {
    let response = client.get(url).send().await.map_err(describe)?;
    let status = response.status();
    if status != StatusCode::OK {
        return Err(format!("HTTP {}", status.as_u16()).into());
    }
    let bytes = response.bytes().await.map_err(describe)?;
    debug!(bytes = bytes.len(), "Fetched page");
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Turn a transport error into a message naming its root cause.
fn describe(e: reqwest::Error) -> Box<dyn Error> {
    let chain = error_chain(&e);
    if e.is_timeout() {
        format!("timed out ({chain})").into()
    } else {
        chain.into()
    }
}
