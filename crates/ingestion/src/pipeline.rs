use crate::seen_set::SeenSet;
use crate::storage::{render_digest, render_resurfaced_digest, run_timestamp, DigestStore};
use crate::tagger::Tagger;
use common::config::EmptyRunPolicy;
use common::{truncate_chars, DigestRecord, DigestResult, Item, ItemSource, Summarizer};
use std::path::PathBuf;
use time::OffsetDateTime;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy)]
pub struct PipelineOptions {
    /// Summarizer input is cut to this many characters.
    pub max_input_chars: usize,
    pub empty_run_policy: EmptyRunPolicy,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            max_input_chars: 3000,
            empty_run_policy: EmptyRunPolicy::Skip,
        }
    }
}

/// Outcome of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub timestamp: String,
    pub fetched: usize,
    pub skipped: usize,
    pub processed: usize,
    pub resurfaced: usize,
    pub snapshot: Option<PathBuf>,
    pub digest: Option<PathBuf>,
}

/// Fetch, deduplicate, summarize, tag, and persist one batch of items.
pub struct DigestPipeline {
    source: Box<dyn ItemSource>,
    summarizer: Box<dyn Summarizer>,
    tagger: Tagger,
    store: DigestStore,
    seen: SeenSet,
    options: PipelineOptions,
}

impl DigestPipeline {
    pub fn new(
        source: Box<dyn ItemSource>,
        summarizer: Box<dyn Summarizer>,
        store: DigestStore,
        seen: SeenSet,
    ) -> Self {
        Self {
            source,
            summarizer,
            tagger: Tagger::default(),
            store,
            seen,
            options: PipelineOptions::default(),
        }
    }

    pub fn with_tagger(mut self, tagger: Tagger) -> Self {
        self.tagger = tagger;
        self
    }

    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn seen(&self) -> &SeenSet {
        &self.seen
    }

    pub async fn run(&mut self) -> DigestResult<RunReport> {
        let timestamp = run_timestamp(OffsetDateTime::now_utc())?;
        self.run_at(&timestamp).await
    }

    /// Runs with an explicit run timestamp; it names the snapshot and is stamped on each record.
    pub async fn run_at(&mut self, timestamp: &str) -> DigestResult<RunReport> {
        info!("Digest run {} starting with source {}", timestamp, self.source.name());

        let items = self.fetch().await;
        let fetched = items.len();

        let records = self.process(items, timestamp).await;
        let mut report = RunReport {
            timestamp: timestamp.to_string(),
            fetched,
            skipped: fetched - records.len(),
            processed: records.len(),
            ..RunReport::default()
        };

        self.persist(timestamp, &records, &mut report)?;

        info!(
            "Digest run {} finished. Fetched: {}, New: {}, Skipped: {}",
            timestamp, report.fetched, report.processed, report.skipped
        );
        Ok(report)
    }

    async fn fetch(&self) -> Vec<Item> {
        match self.source.fetch_items().await {
            Ok(items) => {
                info!("Fetched {} items from {}", items.len(), self.source.name());
                items
            }
            Err(e) => {
                warn!("Fetching from {} failed: {}", self.source.name(), e);
                Vec::new()
            }
        }
    }

    async fn process(&mut self, items: Vec<Item>, timestamp: &str) -> Vec<DigestRecord> {
        let mut records = Vec::new();

        for item in items {
            if self.seen.contains(&item.id) {
                continue;
            }

            let input = item.summary_input();
            let truncated = truncate_chars(&input, self.options.max_input_chars);

            info!("Summarizing item {}: {}", item.id, item.title);
            let result = self.summarizer.summarize(truncated).await;
            let summary = match result {
                Ok(summary) => summary,
                Err(e) => {
                    warn!(
                        "Summarizer {} failed for item {}: {}. Using raw content",
                        self.summarizer.name(),
                        item.id,
                        e
                    );
                    input
                }
            };

            let tags = self.tagger.tag(&summary);
            self.seen.insert(item.id.clone());
            records.push(DigestRecord::from_item(item, timestamp, summary, tags));
        }

        records
    }

    fn persist(
        &self,
        timestamp: &str,
        records: &[DigestRecord],
        report: &mut RunReport,
    ) -> DigestResult<()> {
        if !records.is_empty() {
            // Commit the snapshot only once the seen-set is on disk.
            let staged = self.store.stage_snapshot(timestamp, records)?;
            let digest = self
                .store
                .write_digest(timestamp, &render_digest(timestamp, records))?;
            if let Err(e) = self.seen.persist() {
                self.store.remove_digest(timestamp);
                return Err(e);
            }
            report.snapshot = Some(staged.commit()?);
            report.digest = Some(digest);
            info!(
                "Wrote snapshot of {} records to {}",
                records.len(),
                self.store.snapshot_path(timestamp).display()
            );
            return Ok(());
        }

        match self.options.empty_run_policy {
            EmptyRunPolicy::Skip => {
                info!("No new items; nothing written");
            }
            EmptyRunPolicy::Resurface { limit } => {
                let history: Vec<DigestRecord> =
                    self.store.load_records().into_iter().take(limit).collect();
                if history.is_empty() {
                    info!("No new items and no stored records to resurface");
                } else {
                    info!("No new items; resurfacing {} stored records", history.len());
                    let markdown = render_resurfaced_digest(timestamp, &history);
                    report.digest = Some(self.store.write_digest(timestamp, &markdown)?);
                    report.resurfaced = history.len();
                }
            }
        }
        Ok(())
    }
}
