pub mod models;

use async_trait::async_trait;
use common::config::SummarizerConfig;
use common::{DigestError, DigestResult, RetryPolicy, Summarizer};
use models::{SummarizationParameters, SummarizationRequest, SummarizationResponse};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::info;

pub const INFERENCE_BASE_URL: &str = "https://api-inference.huggingface.co/models";
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Summarization through the HuggingFace hosted inference API.
pub struct HuggingFaceSummarizer {
    client: Client,
    endpoint: String,
    api_token: String,
    max_length: usize,
    min_length: usize,
    retry: RetryPolicy,
}

impl HuggingFaceSummarizer {
    pub fn new(api_token: &str, config: &SummarizerConfig, retry: RetryPolicy) -> DigestResult<Self> {
        let endpoint = format!("{}/{}", INFERENCE_BASE_URL, config.model);
        Self::with_endpoint(&endpoint, api_token, config, retry)
    }

    pub fn with_endpoint(
        endpoint: &str,
        api_token: &str,
        config: &SummarizerConfig,
        retry: RetryPolicy,
    ) -> DigestResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            api_token: api_token.to_string(),
            max_length: config.max_length,
            min_length: config.min_length.min(config.max_length),
            retry,
        })
    }

    async fn request_summary(&self, text: &str) -> DigestResult<String> {
        let body = SummarizationRequest {
            inputs: text,
            parameters: SummarizationParameters {
                max_length: self.max_length,
                min_length: self.min_length,
            },
        };

        let resp = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_token))
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if status == StatusCode::SERVICE_UNAVAILABLE {
            let text = resp.text().await.unwrap_or_default();
            return Err(unavailable_error(&text));
        }
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(DigestError::Summarize(format!(
                "Inference request failed: {} - {}",
                status, text
            )));
        }

        match resp.json::<SummarizationResponse>().await? {
            SummarizationResponse::Summaries(list) => list
                .into_iter()
                .next()
                .map(|s| s.summary_text.trim().to_string())
                .ok_or_else(|| DigestError::Summarize("Empty summary list".to_string())),
            SummarizationResponse::Error { error, .. } => Err(DigestError::Summarize(error)),
        }
    }
}

/// A 503 while the model loads carries `estimated_time` in seconds.
fn unavailable_error(body: &str) -> DigestError {
    let (message, retry_after) = match serde_json::from_str::<SummarizationResponse>(body) {
        Ok(SummarizationResponse::Error {
            error,
            estimated_time,
        }) => (
            error,
            estimated_time
                .filter(|secs| secs.is_finite() && *secs > 0.0)
                .map(Duration::from_secs_f64),
        ),
        _ => (body.to_string(), None),
    };
    info!(
        "Summarization model unavailable: {} (estimated wait {:?})",
        message, retry_after
    );
    DigestError::Unavailable {
        message,
        retry_after,
    }
}

#[async_trait]
impl Summarizer for HuggingFaceSummarizer {
    async fn summarize(&self, text: &str) -> DigestResult<String> {
        if text.trim().is_empty() {
            return Ok(String::new());
        }
        self.retry
            .run("HuggingFace summarization", || self.request_summary(text))
            .await
    }

    fn name(&self) -> &'static str {
        "HuggingFace"
    }
}
