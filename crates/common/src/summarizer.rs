use crate::error::DigestResult;
use async_trait::async_trait;

#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, text: &str) -> DigestResult<String>;
    fn name(&self) -> &'static str;
}

/// Uses the leading characters of the text as its summary.
///
/// Stands in for a model when no inference token is configured.
#[derive(Debug, Clone)]
pub struct ExcerptSummarizer {
    max_chars: usize,
}

impl ExcerptSummarizer {
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }
}

impl Default for ExcerptSummarizer {
    fn default() -> Self {
        Self::new(200)
    }
}

#[async_trait]
impl Summarizer for ExcerptSummarizer {
    async fn summarize(&self, text: &str) -> DigestResult<String> {
        Ok(truncate_chars(text.trim(), self.max_chars).to_string())
    }

    fn name(&self) -> &'static str {
        "excerpt"
    }
}

/// Cuts `text` to at most `max_chars` characters without splitting a char.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
