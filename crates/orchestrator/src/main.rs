use anyhow::{Context, Result};
use common::{Config, ExcerptSummarizer, Summarizer};
use ingestion::{DigestPipeline, DigestStore, PipelineOptions, SeenSet};
use huggingface::HuggingFaceSummarizer;
use reddit::RedditSource;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

fn build_summarizer(config: &Config) -> Result<Box<dyn Summarizer>> {
    match &config.summarizer.hf_api_token {
        Some(token) => {
            let summarizer = HuggingFaceSummarizer::new(token, &config.summarizer, config.retry)?;
            info!("Summarizing with HuggingFace model {}", config.summarizer.model);
            Ok(Box::new(summarizer))
        }
        None => {
            warn!("HF_API_TOKEN not set; falling back to excerpt summaries");
            Ok(Box::new(ExcerptSummarizer::default()))
        }
    }
}

fn build_pipeline(config: &Config) -> Result<DigestPipeline> {
    let source = RedditSource::new(&config.reddit, config.retry)
        .context("Failed to build Reddit client")?;
    let summarizer = build_summarizer(config)?;
    let store = DigestStore::from_config(&config.storage);
    let seen = SeenSet::load(&config.storage.seen_ids_path);

    Ok(DigestPipeline::new(Box::new(source), summarizer, store, seen).with_options(
        PipelineOptions {
            max_input_chars: config.summarizer.max_input_chars,
            empty_run_policy: config.empty_run_policy,
        },
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    let _ = dotenv::dotenv();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = Config::from_env()?;
    let mut pipeline = build_pipeline(&config)?;

    let report = pipeline.run().await.context("Digest run failed")?;

    match (&report.snapshot, &report.digest) {
        (Some(snapshot), _) => info!(
            "Stored {} new records in {}",
            report.processed,
            snapshot.display()
        ),
        (None, Some(digest)) => info!(
            "Nothing new; resurfaced {} records in {}",
            report.resurfaced,
            digest.display()
        ),
        (None, None) => info!("Nothing new this run"),
    }

    Ok(())
}
