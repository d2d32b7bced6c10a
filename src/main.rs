//! # headline_topics
//!
//! Searches news list pages for a keyword, collects the matching headlines
//! with a snippet of each article, and labels every headline with a topic
//! from an OpenAI-compatible chat-completion API (OpenRouter by default).
//!
//! ## Features
//!
//! - Tag-based headline scraping with keyword filtering and link resolution
//! - Single-label topic classification, one request per headline
//! - JSON reports and Markdown digests with the per-topic distribution
//! - Free-form questions about a saved report, optionally filtered by topic
//! - A CSV assistant that previews a file and asks questions about it
//!
//! ## Usage
//!
//! ```sh
//! OPENROUTER_API_KEY=... headline_topics search -k ASUS -j ./json -m ./markdown
//! ```
//!
//! ## Architecture
//!
//! A search runs as a sequential pipeline:
//! 1. **Collecting**: For each source, find keyword headlines and fetch article snippets
//! 2. **Classifying**: Label each item with a topic, pausing between requests
//! 3. **Output**: Print a digest; optionally write JSON and Markdown files

use clap::Parser;
use std::error::Error;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod analysis;
mod api;
mod classifier;
mod cli;
mod config;
mod csv_assistant;
mod models;
mod outputs;
mod pipeline;
mod scrapers;
mod throttle;
mod utils;

use analysis::{NewsAssistant, filter_by_topics, unique_topics};
use api::ChatClient;
use classifier::{TopicClassifier, is_failure_sentinel};
use cli::{Cli, Command};
use config::AppConfig;
use csv_assistant::{CsvAssistant, CsvPreview};
use models::NewsItem;
use outputs::{json, markdown};
use pipeline::Pipeline;
use scrapers::headlines::HeadlineCollector;
use throttle::FixedDelay;
use utils::{ensure_writable_dir, truncate_for_log};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = Instant::now();
    info!("headline_topics starting up");

    let args = Cli::parse();
    debug!(config = ?args.config, "Parsed CLI arguments");

    let mut config = AppConfig::load(args.config.as_deref())?;
    args.apply_overrides(&mut config);

    match args.command {
        Command::Search {
            keyword,
            sources,
            topics,
            json_output_dir,
            markdown_output_dir,
            throttle_ms,
        } => {
            run_search(
                &config,
                &keyword,
                &sources,
                &topics,
                json_output_dir.as_deref(),
                markdown_output_dir.as_deref(),
                throttle_ms,
            )
            .await?
        }
        Command::Ask {
            report,
            topics,
            question,
        } => run_ask(&config, &report, &topics, &question).await?,
        Command::AnalyzeCsv { path, question } => {
            run_analyze_csv(&config, &path, question.as_deref()).await?
        }
        Command::Sources => {
            for source in &config.sources {
                println!("{}\t{}\t{}", source.name, source.tag, source.url);
            }
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );
    Ok(())
}

#[instrument(level = "info", skip_all, fields(%keyword))]
async fn run_search(
    config: &AppConfig,
    keyword: &str,
    source_names: &[String],
    topics: &[String],
    json_output_dir: Option<&str>,
    markdown_output_dir: Option<&str>,
    throttle_ms: Option<u64>,
) -> Result<(), Box<dyn Error>> {
    let sources = config.select_sources(source_names)?;

    // Early check: fail before scraping if the outputs cannot be written
    for dir in [json_output_dir, markdown_output_dir].into_iter().flatten() {
        if let Err(e) = ensure_writable_dir(dir).await {
            error!(path = %dir, error = %e, "Output directory is not writable");
            return Err(e);
        }
    }

    let chat = ChatClient::from_config(&config.llm)?;
    let throttle = FixedDelay::from_millis(throttle_ms.unwrap_or(config.throttle_ms));
    info!(
        model = %chat.model(),
        sources = sources.len(),
        throttle_ms = throttle.delay().as_millis() as u64,
        "Starting search"
    );

    let collector = HeadlineCollector::new(&config.http)?;
    let pipeline = Pipeline::new(collector, TopicClassifier::new(chat), throttle);
    let report = pipeline.run(&sources, keyword).await;

    for warning in &report.warnings {
        warn!(%warning, "Search warning");
    }
    let failed = report
        .items
        .iter()
        .filter(|item| is_failure_sentinel(&item.topic))
        .count();
    info!(
        items = report.items.len(),
        failed_classifications = failed,
        topics = ?unique_topics(&report.items),
        "Search finished"
    );

    let shown: Vec<&NewsItem> = filter_by_topics(&report.items, topics);
    let digest = markdown::report_to_markdown(&report, &shown);
    println!("{digest}");

    if let Some(dir) = json_output_dir {
        let path = json::write_report(&report, dir).await?;
        info!(%path, "Report saved");
    }
    if let Some(dir) = markdown_output_dir {
        let path = markdown::write_markdown(&report, &digest, dir).await?;
        info!(%path, "Digest saved");
    }
    Ok(())
}

#[instrument(level = "info", skip_all, fields(report = %report_path))]
async fn run_ask(
    config: &AppConfig,
    report_path: &str,
    topics: &[String],
    question: &str,
) -> Result<(), Box<dyn Error>> {
    let report = json::read_report(report_path).await?;
    let items = filter_by_topics(&report.items, topics);
    if items.is_empty() {
        warn!(
            available = ?unique_topics(&report.items),
            "No news items match the topic filter; nothing to ask about"
        );
        return Ok(());
    }

    let assistant = NewsAssistant::new(ChatClient::from_config(&config.llm)?);
    let answer = assistant.ask(question, &items).await?;
    debug!(answer = %truncate_for_log(&answer, 200), "Answer received");
    println!("{answer}");
    Ok(())
}

#[instrument(level = "info", skip_all, fields(%path))]
async fn run_analyze_csv(
    config: &AppConfig,
    path: &str,
    question: Option<&str>,
) -> Result<(), Box<dyn Error>> {
    let preview = CsvPreview::load(path)?;
    println!("{}\n\n{}", preview.summary(), preview.to_markdown());
    if !preview.chartable() {
        info!("Charting needs at least one categorical and one numeric column");
    }

    let Some(question) = question else {
        return Ok(());
    };
    let chat = ChatClient::from_config(&config.llm)?;
    let assistant = CsvAssistant::new(chat, Some(config.llm.csv_model.clone()));
    let answer = assistant.ask(&preview, question).await?;
    debug!(answer = %truncate_for_log(&answer, 200), "Answer received");
    println!("\n{answer}");
    Ok(())
}
