//! Single-label topic classification through the chat-completion API.
//!
//! The classifier never fails from the caller's point of view: an empty reply
//! becomes [`UNCLASSIFIED`] and an API error becomes a
//! `"classification failed: …"` sentinel stored in the topic field. Mixing
//! diagnostics into the label field is kept for output compatibility; callers
//! that need to tell the two apart can use [`is_failure_sentinel`].

use crate::api::{ChatCompletion, ChatMessage, ChatRequest};
use crate::models::UNCLASSIFIED;
use crate::utils::{error_chain, truncate_chars};
use tracing::{debug, instrument, warn};

/// Prefix of the topic assigned when the classification request fails.
pub const CLASSIFICATION_FAILED: &str = "classification failed";

/// How much of the article content is sent along with the title.
pub const CONTENT_PROMPT_CHARS: usize = 500;

const TEMPERATURE: f32 = 0.3;
const MAX_TOKENS: u32 = 20;

const SYSTEM_PROMPT: &str = "You are an expert at classifying news stories by topic. \
Given a news headline and its content, reply with the single most fitting topic label, \
for example: Technology, Finance, Politics, Industry Trends, International, Profiles, \
Consumer, AI, Startups, Education, Health. \
Reply with the label only, without any explanation.";

/// Labels news items with one topic each.
#[derive(Debug)]
pub struct TopicClassifier<C> {
    chat: C,
}

impl<C: ChatCompletion> TopicClassifier<C> {
    pub fn new(chat: C) -> Self {
        Self { chat }
    }

    #[cfg(test)]
    pub(crate) fn chat(&self) -> &C {
        &self.chat
    }

    /// Build the request sent for one headline.
    pub fn request(&self, title: &str, content: &str) -> ChatRequest {
        ChatRequest {
            model: None,
            messages: vec![
                ChatMessage::system(SYSTEM_PROMPT),
                ChatMessage::user(format!(
                    "Title: {}\nContent: {}",
                    title,
                    truncate_chars(content, CONTENT_PROMPT_CHARS)
                )),
            ],
            temperature: Some(TEMPERATURE),
            max_tokens: Some(MAX_TOKENS),
        }
    }

    /// Return a topic label for `title` and `content`.
    ///
    /// One attempt, no retry. See the module docs for the failure sentinels.
    #[instrument(level = "info", skip_all, fields(%title))]
    pub async fn classify(&self, title: &str, content: &str) -> String {
        match self.chat.complete(&self.request(title, content)).await {
            Ok(reply) => {
                let topic = reply.trim();
                if topic.is_empty() {
                    debug!("Empty classification reply");
                    UNCLASSIFIED.to_string()
                } else {
                    debug!(%topic, "Classified");
                    topic.to_string()
                }
            }
            Err(e) => {
                let reason = error_chain(&*e);
                warn!(error = %reason, "Classification failed; storing sentinel topic");
                format!("{CLASSIFICATION_FAILED}: {reason}")
            }
        }
    }
}

/// Whether a topic is the sentinel produced by a failed classification.
pub fn is_failure_sentinel(topic: &str) -> bool {
    topic.starts_with(CLASSIFICATION_FAILED)
}
