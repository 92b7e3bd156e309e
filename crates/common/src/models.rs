use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A candidate post pulled from an item source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub id: String,
    pub title: String,
    pub source: String,
    pub content: Vec<String>,
    pub url: Option<String>,
}

impl Item {
    pub fn new(id: impl Into<String>, title: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            source: source.into(),
            content: Vec::new(),
            url: None,
        }
    }

    pub fn with_content(mut self, content: Vec<String>) -> Self {
        self.content = content;
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Title followed by each content entry, separated by blank lines.
    pub fn summary_input(&self) -> String {
        let mut text = self.title.clone();
        for entry in &self.content {
            text.push_str("\n\n");
            text.push_str(entry);
        }
        text
    }
}

/// One summarized, tagged item as stored in a snapshot file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigestRecord {
    pub timestamp: String,
    #[serde(alias = "subreddit")]
    pub source: String,
    #[serde(alias = "post_id")]
    pub item_id: String,
    pub title: String,
    #[serde(default, alias = "comments")]
    pub content: Vec<String>,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl DigestRecord {
    pub fn from_item(item: Item, timestamp: &str, summary: String, tags: BTreeSet<String>) -> Self {
        Self {
            timestamp: timestamp.to_string(),
            source: item.source,
            item_id: item.id,
            title: item.title,
            content: item.content,
            summary,
            tags,
            url: item.url,
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        let wanted = tag.to_lowercase();
        self.tags.iter().any(|t| t.to_lowercase() == wanted)
    }

    pub fn to_markdown_string(&self) -> String {
        let tags = self.tags.iter().cloned().collect::<Vec<_>>().join(", ");
        let link = self
            .url
            .as_ref()
            .map(|u| format!("\n\n[View Post]({})", u))
            .unwrap_or_default();

        format!(
            "## [{}] {}\n\n{}\n\n_Tags: {}_{}",
            self.source, self.title, self.summary, tags, link
        )
    }
}
