//! Command-line interface definitions for headline_topics.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Endpoint settings can come from flags, environment variables, or the YAML
//! config file; flags and environment variables win.

use crate::config::AppConfig;
use clap::{Parser, Subcommand};

/// Command-line arguments for the headline_topics application.
///
/// # Examples
///
/// ```sh
/// # Search every configured source for a keyword
/// headline_topics search -k ASUS -j ./json -m ./markdown
///
/// # Ask about the Technology items of a saved search
/// headline_topics ask -r ./json/2025-05-06/asus_083015.json -t Technology "What launches are planned?"
///
/// # Ask about a CSV file
/// headline_topics analyze-csv sales.csv "Which product sells best?"
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to config.yaml file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// API key for the chat-completion endpoint
    #[arg(long, env = "OPENROUTER_API_KEY", global = true, hide_env_values = true)]
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible API
    #[arg(long, env = "OPENROUTER_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Site URL sent as HTTP-Referer for app attribution
    #[arg(long, env = "APP_URL", global = true)]
    pub app_url: Option<String>,

    /// App name sent as X-Title for app attribution (ASCII only)
    #[arg(long, env = "APP_NAME", global = true)]
    pub app_name: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Search news sources for a keyword and label each matching headline with a topic
    Search {
        /// Keyword headlines must contain (case-sensitive)
        #[arg(short, long)]
        keyword: String,

        /// Source to search, by name; repeat for several (default: all configured)
        #[arg(short, long = "source")]
        sources: Vec<String>,

        /// Only show items with this topic in the digest; repeat for several
        #[arg(short, long = "topic")]
        topics: Vec<String>,

        /// Output directory for the JSON report
        #[arg(short, long)]
        json_output_dir: Option<String>,

        /// Output directory for the Markdown digest
        #[arg(short, long)]
        markdown_output_dir: Option<String>,

        /// Pause between classifier calls, in milliseconds
        #[arg(long)]
        throttle_ms: Option<u64>,
    },

    /// Ask a question about the items of a saved search report
    Ask {
        /// Path to a JSON report written by `search`
        #[arg(short, long)]
        report: String,

        /// Only use items with this topic; repeat for several (default: all)
        #[arg(short, long = "topic")]
        topics: Vec<String>,

        /// The question
        question: String,
    },

    /// Summarise a CSV file and optionally ask a question about it
    AnalyzeCsv {
        /// Path to the CSV file
        path: String,

        /// The question; without one only the preview is printed
        question: Option<String>,
    },

    /// List the configured sources
    Sources,
}

impl Cli {
    /// Apply endpoint flags and environment variables on top of the file configuration.
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(api_key) = &self.api_key {
            config.llm.api_key = Some(api_key.clone());
        }
        if let Some(base_url) = &self.base_url {
            config.llm.base_url = base_url.clone();
        }
        if let Some(app_url) = &self.app_url {
            config.llm.app_url = Some(app_url.clone());
        }
        if let Some(app_name) = &self.app_name {
            config.llm.app_name = Some(app_name.clone());
        }
    }
}
