use crate::error::DigestResult;
use crate::models::Item;
use async_trait::async_trait;

/// Yields a finite batch of candidate items for one pipeline run.
///
/// Transport retries belong to the implementation; the pipeline only sees the
/// final result and treats an error as an empty fetch.
#[async_trait]
pub trait ItemSource: Send + Sync {
    async fn fetch_items(&self) -> DigestResult<Vec<Item>>;
    fn name(&self) -> &'static str;
}
