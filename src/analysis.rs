//! Working with a classified batch: topic filters, topic counts, and free-form
//! questions answered from the collected snippets.

use crate::api::{ChatCompletion, ChatMessage, ChatRequest};
use crate::models::{NewsItem, TopicCount, UNCLASSIFIED};
use crate::utils::truncate_chars;
use itertools::Itertools;
use std::error::Error;
use tracing::{info, instrument};

/// Upper bound on the news context sent with a question, in characters.
pub const QA_CONTEXT_MAX_CHARS: usize = 3000;

const QA_SYSTEM_PROMPT: &str = "You are a news analysis assistant. Using only the news items \
provided and the user's question, give a clear, concise and concrete answer.";

/// Sorted distinct topics in `items`; `["unclassified"]` when there are none.
pub fn unique_topics(items: &[NewsItem]) -> Vec<String> {
    let topics: Vec<String> = items
        .iter()
        .map(|item| item.topic.clone())
        .filter(|topic| !topic.is_empty())
        .unique()
        .sorted()
        .collect();
    if topics.is_empty() {
        vec![UNCLASSIFIED.to_string()]
    } else {
        topics
    }
}

/// Items whose topic is in `topics`. An empty `topics` slice keeps everything.
pub fn filter_by_topics<'a>(items: &'a [NewsItem], topics: &[String]) -> Vec<&'a NewsItem> {
    items
        .iter()
        .filter(|item| topics.is_empty() || topics.contains(&item.topic))
        .collect()
}

/// Number of items per topic, most frequent first, ties in alphabetical order.
pub fn topic_counts(items: &[&NewsItem]) -> Vec<TopicCount> {
    items
        .iter()
        .map(|item| item.topic.as_str())
        .counts()
        .into_iter()
        .map(|(topic, count)| TopicCount {
            topic: topic.to_string(),
            count,
        })
        .sorted_by(|a, b| b.count.cmp(&a.count).then_with(|| a.topic.cmp(&b.topic)))
        .collect()
}

/// One `[topic] title: snippet` paragraph per item, cut to [`QA_CONTEXT_MAX_CHARS`].
pub fn build_context(items: &[&NewsItem]) -> String {
    let joined = items
        .iter()
        .map(|item| format!("[{}] {}: {}", item.topic, item.title, item.content_snippet))
        .join("\n\n");
    truncate_chars(&joined, QA_CONTEXT_MAX_CHARS)
}

/// Answers questions about a set of news items.
#[derive(Debug)]
pub struct NewsAssistant<C> {
    chat: C,
}

impl<C: ChatCompletion> NewsAssistant<C> {
    pub fn new(chat: C) -> Self {
        Self { chat }
    }

    pub fn request(&self, question: &str, items: &[&NewsItem]) -> ChatRequest {
        let prompt = format!(
            "Below are several news items. Answer the user's question based on them.\n\n\
             Question: {}\n\n\
             News items:\n{}",
            question.trim(),
            build_context(items)
        );
        ChatRequest {
            model: None,
            messages: vec![ChatMessage::system(QA_SYSTEM_PROMPT), ChatMessage::user(prompt)],
            temperature: Some(0.5),
            max_tokens: Some(600),
        }
    }

    /// Ask `question` about `items`.
    ///
    /// # Errors
    ///
    /// Fails without calling the API when `items` is empty or the question is
    /// blank, and propagates API errors otherwise.
    #[instrument(level = "info", skip_all, fields(items = items.len()))]
    pub async fn ask(&self, question: &str, items: &[&NewsItem]) -> Result<String, Box<dyn Error>> {
        if question.trim().is_empty() {
            return Err("question is empty".into());
        }
        if items.is_empty() {
            return Err("no news items to analyse; run a search or widen the topic filter".into());
        }
        let answer = self.chat.complete(&self.request(question, items)).await?;
        info!(chars = answer.chars().count(), "Received answer");
        Ok(answer.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::tests::ScriptedChat;

    fn item(title: &str, topic: &str) -> NewsItem {
        NewsItem {
            source_name: "Example".to_string(),
            title: title.to_string(),
            content_snippet: format!("{title} body"),
            article_url: "http://example.test/news/1".to_string(),
            topic: topic.to_string(),
        }
    }

    fn batch() -> Vec<NewsItem> {
        vec![
            item("Acme one", "Technology"),
            item("Acme two", "Finance"),
            item("Acme three", "Technology"),
            item("Acme four", "AI"),
        ]
    }

    #[test]
    fn test_unique_topics() {
        assert_eq!(unique_topics(&batch()), vec!["AI", "Finance", "Technology"]);
        assert_eq!(unique_topics(&[]), vec![UNCLASSIFIED]);
    }

    #[test]
    fn test_filter_by_topics() {
        let items = batch();
        assert_eq!(filter_by_topics(&items, &[]).len(), 4);

        let tech = filter_by_topics(&items, &["Technology".to_string()]);
        let titles: Vec<&str> = tech.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["Acme one", "Acme three"]);

        assert!(filter_by_topics(&items, &["Sports".to_string()]).is_empty());
    }

    #[test]
    fn test_topic_counts() {
        let items = batch();
        let all = filter_by_topics(&items, &[]);
        let counts = topic_counts(&all);
        assert_eq!(
            counts,
            vec![
                TopicCount { topic: "Technology".to_string(), count: 2 },
                TopicCount { topic: "AI".to_string(), count: 1 },
                TopicCount { topic: "Finance".to_string(), count: 1 },
            ]
        );
        assert!(topic_counts(&[]).is_empty());
    }

    #[test]
    fn test_build_context() {
        let items = batch();
        let all = filter_by_topics(&items, &[]);
        let context = build_context(&all[..2]);
        assert_eq!(
            context,
            "[Technology] Acme one: Acme one body\n\n[Finance] Acme two: Acme two body"
        );
    }

    #[test]
    fn test_build_context_is_bounded() {
        let long: Vec<NewsItem> = (0..50).map(|i| item(&format!("Acme {i} {}", "x".repeat(100)), "AI")).collect();
        let refs = filter_by_topics(&long, &[]);
        assert_eq!(build_context(&refs).chars().count(), QA_CONTEXT_MAX_CHARS);
    }

    #[tokio::test]
    async fn test_ask_sends_question_and_context() {
        let assistant = NewsAssistant::new(ScriptedChat::new(vec![Ok("  Two launches are planned.\n")]));
        let items = batch();
        let tech = filter_by_topics(&items, &["Technology".to_string()]);

        let answer = assistant.ask("What is planned?", &tech).await.unwrap();
        assert_eq!(answer, "Two launches are planned.");

        let seen = assistant.chat.seen.borrow();
        let request = &seen[0];
        assert_eq!(request.temperature, Some(0.5));
        assert_eq!(request.max_tokens, Some(600));
        assert!(request.messages[1].content.contains("Question: What is planned?"));
        assert!(request.messages[1].content.contains("[Technology] Acme three"));
        assert!(!request.messages[1].content.contains("Acme two"));
    }

    #[tokio::test]
    async fn test_ask_without_items_skips_api() {
        let assistant = NewsAssistant::new(ScriptedChat::default());
        let err = assistant.ask("Anything?", &[]).await.unwrap_err();
        assert!(err.to_string().contains("no news items"));
        assert!(assistant.chat.seen.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_ask_propagates_api_errors() {
        let assistant = NewsAssistant::new(ScriptedChat::new(vec![Err("LLM API error 500: boom")]));
        let items = batch();
        let all = filter_by_topics(&items, &[]);
        let err = assistant.ask("Anything?", &all).await.unwrap_err();
        assert!(err.to_string().contains("boom"));
    }
}
