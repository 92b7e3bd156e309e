use crate::models::{top_comment_bodies, Listing, RedditPost};
use common::{DigestError, DigestResult};
use reqwest::Client;
use std::time::Duration;

pub const REDDIT_BASE_URL: &str = "https://www.reddit.com";
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Read-only client for Reddit's public JSON endpoints.
#[derive(Clone)]
pub struct RedditAPI {
    client: Client,
    base_url: String,
}

impl RedditAPI {
    pub fn new(user_agent: &str) -> DigestResult<Self> {
        Self::with_base_url(user_agent, REDDIT_BASE_URL)
    }

    pub fn with_base_url(user_agent: &str, base_url: &str) -> DigestResult<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn search_posts(&self, query: &str, limit: usize) -> DigestResult<Vec<RedditPost>> {
        let url = format!("{}/search.json", self.base_url);
        let limit = limit.to_string();
        let resp = self
            .client
            .get(&url)
            .query(&[("q", query), ("limit", limit.as_str())])
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(DigestError::Api(format!(
                "Reddit search returned {}",
                resp.status()
            )));
        }

        let listing: Listing<RedditPost> = resp.json().await?;
        Ok(listing
            .data
            .children
            .into_iter()
            .map(|thing| thing.data)
            .collect())
    }

    pub async fn top_comments(&self, post_id: &str, limit: usize) -> DigestResult<Vec<String>> {
        let url = format!("{}/comments/{}.json", self.base_url, post_id);
        let resp = self
            .client
            .get(&url)
            .query(&[("limit", limit.to_string())])
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(DigestError::Api(format!(
                "Reddit comments for {} returned {}",
                post_id,
                resp.status()
            )));
        }

        let listings: Vec<Listing<serde_json::Value>> = resp.json().await?;
        Ok(top_comment_bodies(listings, limit))
    }
}
