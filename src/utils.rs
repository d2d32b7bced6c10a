//! Utility functions for string handling and file system checks.
//!
//! This module provides helper functions used throughout the application:
//! - Character-safe truncation for snippets, prompts and logging
//! - Slugification for output filenames
//! - Removal of `<think>` reasoning blocks from model replies
//! - File system validation for output directories

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fs as stdfs;
use tokio::fs;
use tracing::{info, instrument};

static THINK_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<think>.*?</think>").expect("valid think-block regex"));

/// Keep at most `max` characters of `s`.
///
/// Counts Unicode scalar values, not bytes, so multi-byte text (CJK headlines
/// in particular) is never split inside a character.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_chars("華碩新聞", 2), "華碩");
/// assert_eq!(truncate_chars("short", 100), "short");
/// ```
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((byte_idx, _)) => s[..byte_idx].to_string(),
        None => s.to_string(),
    }
}

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to `max` characters with an ellipsis and
/// byte count indicator appended.
///
/// # Arguments
///
/// * `s` - The string to potentially truncate
/// * `max` - Maximum number of characters to keep
///
/// # Returns
///
/// `s` unchanged if shorter than `max`, otherwise a truncated version
/// with `"…(+N bytes)"` appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    let kept = truncate_chars(s, max);
    if kept.len() == s.len() {
        kept
    } else {
        format!("{}…(+{} bytes)", kept, s.len() - kept.len())
    }
}

/// Convert a keyword or title to a filename-friendly slug.
///
/// Lowercases the text, removes punctuation, and replaces spaces with hyphens.
/// Non-Latin letters are kept as-is.
pub fn slugify_title(title: &str) -> String {
    title
        .trim()
        .to_lowercase()
        .replace(|c: char| !c.is_alphanumeric() && c != ' ' && c != '-', "")
        .replace(' ', "-")
}

/// Render an error with every cause in its `source()` chain, joined by `": "`.
///
/// `reqwest` keeps the useful part (refused connection, timeout) in the
/// sources, so the top-level message alone is vague. Consecutive duplicate
/// messages are collapsed.
pub fn error_chain(err: &dyn Error) -> String {
    let mut parts = vec![err.to_string()];
    let mut source = err.source();
    while let Some(cause) = source {
        let message = cause.to_string();
        if parts.last() != Some(&message) {
            parts.push(message);
        }
        source = cause.source();
    }
    parts.join(": ")
}

/// Remove `<think>…</think>` reasoning blocks some models emit, then trim.
pub fn strip_think(text: &str) -> String {
    THINK_BLOCK.replace_all(text, "").trim().to_string()
}

/// Ensure a directory exists and is writable.
///
/// This function creates the directory if it doesn't exist, then performs
/// a write test by creating and immediately deleting a probe file.
///
/// # Errors
///
/// Returns an error if:
/// - The directory cannot be created
/// - The directory is not writable (permission denied, read-only filesystem, etc.)
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    // Try a small sync write using std fs (simpler error surface)
    let probe_path = format!("{}/..__probe_write__", path.trim_end_matches('/'));
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!("Output directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars_counts_characters() {
        assert_eq!(truncate_chars("華碩新聞快訊", 2), "華碩");
        assert_eq!(truncate_chars("abc", 3), "abc");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("", 5), "");
    }

    #[test]
    fn test_truncate_for_log_short_string() {
        let s = "Hello, world!";
        assert_eq!(truncate_for_log(s, 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_multibyte() {
        let s = "華".repeat(10);
        let result = truncate_for_log(&s, 4);
        assert!(result.starts_with(&"華".repeat(4)));
        assert!(result.contains("…(+18 bytes)"));
    }

    #[derive(Debug)]
    struct Wrapped(std::io::Error);

    impl std::fmt::Display for Wrapped {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "error sending request")
        }
    }

    impl Error for Wrapped {
        fn source(&self) -> Option<&(dyn Error + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn test_error_chain_includes_causes() {
        let err = Wrapped(std::io::Error::from(std::io::ErrorKind::ConnectionRefused));
        assert_eq!(error_chain(&err), "error sending request: connection refused");

        let plain: Box<dyn Error> = "HTTP 404".into();
        assert_eq!(error_chain(&*plain), "HTTP 404");
    }

    #[test]
    fn test_slugify_title() {
        assert_eq!(slugify_title("Hello World"), "hello-world");
        assert_eq!(slugify_title("Test-Article!"), "test-article");
        assert_eq!(slugify_title("  華碩 ASUS "), "華碩-asus");
    }

    #[test]
    fn test_strip_think() {
        let raw = "<think>\nlet me reason\n</think>\n\n- Sales peak in Q3";
        assert_eq!(strip_think(raw), "- Sales peak in Q3");
        assert_eq!(strip_think("  plain answer "), "plain answer");
        assert_eq!(
            strip_think("<think>a</think>one<think>b</think> two"),
            "one two"
        );
    }

    #[tokio::test]
    async fn test_ensure_writable_dir_creates_nested() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("a/b");
        let path = nested.to_str().unwrap();
        ensure_writable_dir(path).await.unwrap();
        assert!(nested.is_dir());
        assert!(!nested.join("..__probe_write__").exists());
    }
}
