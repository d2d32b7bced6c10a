//! Runtime configuration.
//!
//! Settings come from an optional YAML file and are then overridden by CLI
//! flags / environment variables (see [`crate::cli`]). The resulting
//! [`AppConfig`] is handed to the scraper and the chat client when they are
//! built; nothing reads the environment after startup.
//!
//! ```yaml
//! throttle_ms: 800
//! http:
//!   timeout_secs: 12
//! llm:
//!   base_url: https://openrouter.ai/api/v1
//!   model: deepseek/deepseek-chat
//! sources:
//!   - name: Example
//!     url: https://example.com/search/acme
//!     tag: h2
//! ```

use crate::models::Source;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::time::Duration;
use tracing::{debug, instrument};

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub http: HttpConfig,
    /// Pause between consecutive classifier calls, in milliseconds.
    pub throttle_ms: u64,
    /// List pages that can be searched.
    pub sources: Vec<Source>,
}

/// Chat-completion endpoint settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL of the OpenAI-compatible API; `/chat/completions` is appended.
    pub base_url: String,
    /// Bearer token. Usually supplied through `OPENROUTER_API_KEY` instead of the file.
    pub api_key: Option<String>,
    /// Model used for topic labels and news questions.
    pub model: String,
    /// Model used by the CSV assistant.
    pub csv_model: String,
    /// Sent as `HTTP-Referer` for OpenRouter app attribution.
    pub app_url: Option<String>,
    /// Sent as `X-Title` for OpenRouter app attribution. Keep it ASCII.
    pub app_name: Option<String>,
    pub timeout_secs: u64,
}

/// Scraper HTTP settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            llm: LlmConfig::default(),
            http: HttpConfig::default(),
            throttle_ms: 800,
            sources: default_sources(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            model: "deepseek/deepseek-chat".to_string(),
            csv_model: "deepseek/deepseek-r1:free".to_string(),
            app_url: None,
            app_name: None,
            timeout_secs: 60,
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 12,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl LlmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// The API key, or an error telling the user how to provide one.
    pub fn require_api_key(&self) -> Result<&str, Box<dyn Error>> {
        match self.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err("OPENROUTER_API_KEY is not set; pass --api-key, export it, or add llm.api_key to the config file".into()),
        }
    }
}

impl AppConfig {
    /// Load configuration from a YAML file, or fall back to defaults when no path is given.
    ///
    /// Missing keys in the file take their default values.
    #[instrument(level = "info")]
    pub fn load(path: Option<&str>) -> Result<Self, Box<dyn Error>> {
        let Some(path) = path else {
            debug!("No config file given; using defaults");
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read config file {path}: {e}"))?;
        Self::from_yaml(&raw)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, Box<dyn Error>> {
        let config: AppConfig = serde_yaml::from_str(raw)?;
        debug!(sources = config.sources.len(), "Parsed configuration");
        Ok(config)
    }

    /// Resolve source names to configured sources, keeping the requested order.
    ///
    /// An empty `names` slice selects every configured source.
    pub fn select_sources(&self, names: &[String]) -> Result<Vec<Source>, Box<dyn Error>> {
        if names.is_empty() {
            return Ok(self.sources.clone());
        }
        names
            .iter()
            .map(|name| {
                self.sources
                    .iter()
                    .find(|s| s.name == *name)
                    .cloned()
                    .ok_or_else(|| -> Box<dyn Error> { format!("unknown source: {name}").into() })
            })
            .collect()
    }
}

/// The list pages shipped by default: tag pages of four Taiwanese outlets.
pub fn default_sources() -> Vec<Source> {
    vec![
        Source::new("ETtoday", "https://www.ettoday.net/news/tag/ASUS/", "h3"),
        Source::new("UDN", "https://udn.com/search/tagging/2/ASUS", "h2"),
        Source::new("NextApple", "https://tw.nextapple.com/search/asus", "h2"),
        Source::new("ChinaTimes", "https://www.chinatimes.com/search/ASUS?chdtv", "h3"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.throttle_ms, 800);
        assert_eq!(config.http.timeout_secs, 12);
        assert_eq!(config.llm.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.llm.model, "deepseek/deepseek-chat");
        assert_eq!(config.sources.len(), 4);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = AppConfig::from_yaml(
            r#"
throttle_ms: 0
llm:
  model: openai/gpt-4o-mini
sources:
  - name: Example
    url: http://example.test/list
    tag: h2
"#,
        )
        .unwrap();

        assert_eq!(config.throttle_ms, 0);
        assert_eq!(config.llm.model, "openai/gpt-4o-mini");
        assert_eq!(config.llm.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.http.timeout_secs, 12);
        assert_eq!(config.sources, vec![Source::new("Example", "http://example.test/list", "h2")]);
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        assert!(AppConfig::from_yaml("throttle_ms: [not a number").is_err());
    }

    #[test]
    fn test_load_without_path_uses_defaults() {
        let config = AppConfig::load(None).unwrap();
        assert_eq!(config.sources, default_sources());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "http:\n  timeout_secs: 3\n").unwrap();
        let config = AppConfig::load(path.to_str()).unwrap();
        assert_eq!(config.http.timeout(), Duration::from_secs(3));
    }

    #[test]
    fn test_select_sources() {
        let config = AppConfig::default();
        assert_eq!(config.select_sources(&[]).unwrap().len(), 4);

        let picked = config
            .select_sources(&["UDN".to_string(), "ETtoday".to_string()])
            .unwrap();
        assert_eq!(picked[0].name, "UDN");
        assert_eq!(picked[1].name, "ETtoday");

        let err = config.select_sources(&["Nope".to_string()]).unwrap_err();
        assert!(err.to_string().contains("unknown source: Nope"));
    }

    #[test]
    fn test_require_api_key() {
        let mut llm = LlmConfig::default();
        assert!(llm.require_api_key().is_err());
        llm.api_key = Some("   ".to_string());
        assert!(llm.require_api_key().is_err());
        llm.api_key = Some("sk-test".to_string());
        assert_eq!(llm.require_api_key().unwrap(), "sk-test");
    }
}
