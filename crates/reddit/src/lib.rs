pub mod api;
pub mod models;

use api::RedditAPI;
use async_trait::async_trait;
use common::config::RedditConfig;
use common::{DigestResult, Item, ItemSource, RetryPolicy};
use futures::stream::{self, StreamExt};
use models::RedditPost;
use tracing::{info, warn};

/// Reddit search results plus each post's top comments.
pub struct RedditSource {
    api: RedditAPI,
    config: RedditConfig,
    retry: RetryPolicy,
}

impl RedditSource {
    pub fn new(config: &RedditConfig, retry: RetryPolicy) -> DigestResult<Self> {
        Ok(Self::with_api(RedditAPI::new(&config.user_agent)?, config, retry))
    }

    pub fn with_api(api: RedditAPI, config: &RedditConfig, retry: RetryPolicy) -> Self {
        Self {
            api,
            config: config.clone(),
            retry,
        }
    }

    async fn build_item(&self, post: RedditPost) -> Item {
        let comments = self
            .retry
            .run("Reddit comments", || {
                self.api.top_comments(&post.id, self.config.top_comments)
            })
            .await
            .unwrap_or_else(|e| {
                warn!("Could not fetch comments for post {}: {}", post.id, e);
                Vec::new()
            });

        let mut content = Vec::with_capacity(comments.len() + 1);
        if let Some(text) = post.body_text() {
            content.push(text);
        }
        content.extend(comments);

        let url = post.permalink_url();
        let mut item = Item::new(post.id, post.title, post.subreddit).with_content(content);
        item.url = url;
        item
    }
}

#[async_trait]
impl ItemSource for RedditSource {
    async fn fetch_items(&self) -> DigestResult<Vec<Item>> {
        let posts = self
            .retry
            .run("Reddit search", || {
                self.api
                    .search_posts(&self.config.search_query, self.config.search_limit)
            })
            .await?;
        info!(
            "Found {} posts for query '{}'",
            posts.len(),
            self.config.search_query
        );

        // One comment request at a time keeps us under Reddit's rate limit.
        let items: Vec<Item> = stream::iter(posts)
            .then(|post| self.build_item(post))
            .collect()
            .await;
        Ok(items)
    }

    fn name(&self) -> &'static str {
        "Reddit"
    }
}
