//! Chat-completion API client.
//!
//! This module talks to an OpenAI-compatible `/chat/completions` endpoint
//! (OpenRouter by default). Every call is a single attempt: failures are
//! returned to the caller, which decides whether to degrade (the topic
//! classifier turns them into a sentinel label) or to surface them.
//!
//! # Architecture
//!
//! - [`ChatCompletion`]: Core trait defining one async request/response exchange
//! - [`ChatClient`]: HTTP implementation built from [`LlmConfig`]
//! - [`ChatRequest`] / [`ChatMessage`]: The request shape shared by all callers

use crate::config::LlmConfig;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::time::Instant;
use tracing::{debug, instrument, warn};

/// A role-tagged chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// One chat-completion request.
///
/// `model` is optional so callers can fall back to the client's configured model.
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    pub model: Option<String>,
    pub messages: Vec<ChatMessage>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

/// Trait for async chat-completion calls.
///
/// Implementors send a request and return the text of the first choice.
/// This abstraction lets the classifier and assistants run against a fake
/// backend in tests.
pub trait ChatCompletion {
    /// Send `request` and return the generated message text (possibly empty).
    async fn complete(&self, request: &ChatRequest) -> Result<String, Box<dyn Error>>;
}

#[derive(Debug, Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// HTTP client for an OpenAI-compatible chat-completion API.
#[derive(Debug, Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl ChatClient {
    /// Build a client from configuration.
    ///
    /// # Errors
    ///
    /// Fails when no API key is configured, when an attribution header value
    /// is not valid ASCII, or when the underlying HTTP client cannot be built.
    pub fn from_config(config: &LlmConfig) -> Result<Self, Box<dyn Error>> {
        let api_key = config.require_api_key()?.to_string();

        let mut headers = HeaderMap::new();
        if let Some(app_url) = config.app_url.as_deref() {
            headers.insert("http-referer", HeaderValue::from_str(app_url)?);
        }
        if let Some(app_name) = config.app_name.as_deref() {
            headers.insert("x-title", HeaderValue::from_str(app_name)?);
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key,
            model: config.model.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl ChatCompletion for ChatClient {
    #[instrument(level = "debug", skip_all, fields(endpoint = %self.endpoint))]
    async fn complete(&self, request: &ChatRequest) -> Result<String, Box<dyn Error>> {
        let t0 = Instant::now();
        let model = request.model.as_deref().unwrap_or(&self.model);
        let body = CompletionBody {
            model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!(
                %status,
                elapsed_ms = t0.elapsed().as_millis() as u64,
                "Chat completion request rejected"
            );
            return Err(format!("LLM API error {status}: {}", text.trim()).into());
        }

        let parsed: CompletionResponse = response.json().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .ok_or("LLM response has no choices")?
            .message
            .content
            .unwrap_or_default();

        debug!(
            %model,
            elapsed_ms = t0.elapsed().as_millis() as u64,
            chars = content.chars().count(),
            "Chat completion succeeded"
        );
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn config(base_url: String) -> LlmConfig {
        LlmConfig {
            base_url,
            api_key: Some("test-key".to_string()),
            ..LlmConfig::default()
        }
    }

    fn request() -> ChatRequest {
        ChatRequest {
            model: None,
            messages: vec![ChatMessage::system("Be brief."), ChatMessage::user("Hi")],
            temperature: Some(0.3),
            max_tokens: Some(20),
        }
    }

    #[test]
    fn test_from_config_requires_api_key() {
        let llm = LlmConfig::default();
        assert!(ChatClient::from_config(&llm).is_err());
    }

    #[tokio::test]
    async fn test_complete_sends_openai_shaped_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer test-key")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "model": "deepseek/deepseek-chat",
                "messages": [
                    {"role": "system", "content": "Be brief."},
                    {"role": "user", "content": "Hi"}
                ],
                "max_tokens": 20
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"Hello"}}]}"#)
            .create_async()
            .await;

        let client = ChatClient::from_config(&config(server.url())).unwrap();
        let reply = client.complete(&request()).await.unwrap();

        assert_eq!(reply, "Hello");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_complete_sends_attribution_headers() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("http-referer", "https://example.test")
            .match_header("x-title", "headline-topics")
            .with_status(200)
            .with_body(r#"{"choices":[{"message":{"content":"ok"}}]}"#)
            .create_async()
            .await;

        let mut llm = config(format!("{}/", server.url()));
        llm.app_url = Some("https://example.test".to_string());
        llm.app_name = Some("headline-topics".to_string());
        let client = ChatClient::from_config(&llm).unwrap();

        assert_eq!(client.complete(&request()).await.unwrap(), "ok");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_complete_null_content_is_empty() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[{"message":{"content":null}}]}"#)
            .create_async()
            .await;

        let client = ChatClient::from_config(&config(server.url())).unwrap();
        assert_eq!(client.complete(&request()).await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_complete_error_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(429)
            .with_body(r#"{"error":{"message":"Rate limit exceeded"}}"#)
            .create_async()
            .await;

        let client = ChatClient::from_config(&config(server.url())).unwrap();
        let err = client.complete(&request()).await.unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("429"));
        assert!(msg.contains("Rate limit exceeded"));
    }

    #[tokio::test]
    async fn test_complete_without_choices() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[]}"#)
            .create_async()
            .await;

        let client = ChatClient::from_config(&config(server.url())).unwrap();
        let err = client.complete(&request()).await.unwrap_err();
        assert!(err.to_string().contains("no choices"));
    }
}
