use scraper::Html;
use serde::Deserialize;

/// `{"kind": "Listing", "data": {"children": [...]}}`
#[derive(Debug, Deserialize)]
pub struct Listing<T> {
    pub data: ListingData<T>,
}

#[derive(Debug, Deserialize)]
pub struct ListingData<T> {
    pub children: Vec<Thing<T>>,
}

#[derive(Debug, Deserialize)]
pub struct Thing<T> {
    pub kind: String,
    pub data: T,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedditPost {
    pub id: String,
    pub title: String,
    pub subreddit: String,
    #[serde(default)]
    pub permalink: Option<String>,
    #[serde(default)]
    pub selftext: Option<String>,
    #[serde(default)]
    pub selftext_html: Option<String>,
}

impl RedditPost {
    /// Self-text as plain text, preferring the rendered HTML over the raw markdown.
    pub fn body_text(&self) -> Option<String> {
        let text = match self.selftext_html.as_deref().filter(|h| !h.trim().is_empty()) {
            // The API entity-escapes the markup: one pass yields HTML, the next plain text.
            Some(escaped) => html_to_text(&html_to_text(escaped)),
            None => self.selftext.clone().unwrap_or_default(),
        };
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }

    pub fn permalink_url(&self) -> Option<String> {
        self.permalink
            .as_ref()
            .map(|p| format!("https://www.reddit.com{}", p))
    }
}

fn html_to_text(html: &str) -> String {
    Html::parse_fragment(html)
        .root_element()
        .text()
        .collect::<String>()
}

/// Comment listings mix `t1` comments with `more` stubs, so every field is optional.
#[derive(Debug, Deserialize)]
pub struct RedditComment {
    #[serde(default)]
    pub body: Option<String>,
}

pub const COMMENT_KIND: &str = "t1";

/// Top-level comment bodies from the second listing of a `/comments/<id>.json` response.
pub fn top_comment_bodies(listings: Vec<Listing<serde_json::Value>>, limit: usize) -> Vec<String> {
    listings
        .into_iter()
        .nth(1)
        .map(|listing| listing.data.children)
        .unwrap_or_default()
        .into_iter()
        .filter(|thing| thing.kind == COMMENT_KIND)
        .filter_map(|thing| serde_json::from_value::<RedditComment>(thing.data).ok())
        .filter_map(|comment| comment.body)
        .filter(|body| !body.trim().is_empty())
        .take(limit)
        .collect()
}
