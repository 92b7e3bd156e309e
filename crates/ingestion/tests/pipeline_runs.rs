use async_trait::async_trait;
use common::config::EmptyRunPolicy;
use common::{DigestError, DigestRecord, DigestResult, Item, ItemSource, Summarizer};
use ingestion::{DigestPipeline, DigestStore, PipelineOptions, SeenSet};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::{tempdir, TempDir};

struct StaticSource {
    items: Vec<Item>,
}

#[async_trait]
impl ItemSource for StaticSource {
    async fn fetch_items(&self) -> DigestResult<Vec<Item>> {
        Ok(self.items.clone())
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

struct FailingSource;

#[async_trait]
impl ItemSource for FailingSource {
    async fn fetch_items(&self) -> DigestResult<Vec<Item>> {
        Err(DigestError::Api("connection refused".into()))
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

/// Echoes its input and remembers every call.
#[derive(Default, Clone)]
struct RecordingSummarizer {
    inputs: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl Summarizer for RecordingSummarizer {
    async fn summarize(&self, text: &str) -> DigestResult<String> {
        self.inputs.lock().unwrap().push(text.to_string());
        Ok(format!("summary: {}", text))
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

/// Fails for any text containing "boom".
struct PickySummarizer;

#[async_trait]
impl Summarizer for PickySummarizer {
    async fn summarize(&self, text: &str) -> DigestResult<String> {
        if text.contains("boom") {
            Err(DigestError::Summarize("model overloaded".into()))
        } else {
            Ok("a fine summary".to_string())
        }
    }

    fn name(&self) -> &'static str {
        "picky"
    }
}

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        Self { dir: tempdir().unwrap() }
    }

    fn store(&self) -> DigestStore {
        DigestStore::new(self.dir.path().join("data"), self.dir.path().join("digests"))
    }

    fn seen_path(&self) -> std::path::PathBuf {
        self.dir.path().join("state").join("seen_ids.json")
    }

    fn pipeline(
        &self,
        source: impl ItemSource + 'static,
        summarizer: impl Summarizer + 'static,
    ) -> DigestPipeline {
        DigestPipeline::new(
            Box::new(source),
            Box::new(summarizer),
            self.store(),
            SeenSet::load(self.seen_path()),
        )
    }

    fn snapshot_count(&self) -> usize {
        self.store().load_snapshots().len()
    }
}

fn item(id: &str, title: &str) -> Item {
    Item::new(id, title, "MachineLearning").with_content(vec![format!("comment on {}", id)])
}

fn read_records(path: &Path) -> Vec<DigestRecord> {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[tokio::test]
async fn only_unseen_items_are_processed() {
    let fixture = Fixture::new();
    let mut seen = SeenSet::load(fixture.seen_path());
    seen.insert("1");
    seen.persist().unwrap();

    let source = StaticSource {
        items: vec![item("1", "A"), item("2", "B")],
    };
    let mut pipeline = fixture.pipeline(source, RecordingSummarizer::default());
    let report = pipeline.run_at("2024-05-01_09-00-00").await.unwrap();

    assert_eq!(report.fetched, 2);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.processed, 1);

    let records = read_records(report.snapshot.as_ref().unwrap());
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].item_id, "2");
    assert_eq!(records[0].title, "B");
    assert_eq!(records[0].timestamp, "2024-05-01_09-00-00");

    let reloaded = SeenSet::load(fixture.seen_path());
    assert_eq!(reloaded.len(), 2);
    assert!(reloaded.contains("1"));
    assert!(reloaded.contains("2"));
}

#[tokio::test]
async fn second_run_with_same_source_writes_nothing() {
    let fixture = Fixture::new();
    let items = vec![item("a", "First"), item("b", "Second")];

    let source = StaticSource {
        items: items.clone(),
    };
    let mut first = fixture.pipeline(source, RecordingSummarizer::default());
    let report = first.run_at("2024-05-01_09-00-00").await.unwrap();
    assert_eq!(report.processed, 2);
    assert!(report.digest.as_ref().unwrap().exists());

    let mut second = fixture.pipeline(StaticSource { items }, RecordingSummarizer::default());
    let report = second.run_at("2024-05-01_10-00-00").await.unwrap();
    assert_eq!(report.processed, 0);
    assert_eq!(report.skipped, 2);
    assert!(report.snapshot.is_none());
    assert!(report.digest.is_none());
    assert_eq!(fixture.snapshot_count(), 1);
}

#[tokio::test]
async fn no_id_lands_in_two_snapshots() {
    let fixture = Fixture::new();
    let batches = [
        vec![item("1", "one"), item("2", "two")],
        vec![item("2", "two"), item("3", "three")],
        vec![item("1", "one"), item("3", "three"), item("4", "four")],
    ];

    for (run, items) in batches.into_iter().enumerate() {
        let mut pipeline = fixture.pipeline(StaticSource { items }, RecordingSummarizer::default());
        pipeline
            .run_at(&format!("2024-05-0{}_09-00-00", run + 1))
            .await
            .unwrap();
    }

    let mut ids = HashSet::new();
    for snapshot in fixture.store().load_snapshots() {
        for record in snapshot.records {
            assert!(ids.insert(record.item_id.clone()), "{} stored twice", record.item_id);
        }
    }
    assert_eq!(ids.len(), 4);
}

#[tokio::test]
async fn duplicates_within_one_fetch_are_processed_once() {
    let fixture = Fixture::new();
    let summarizer = RecordingSummarizer::default();
    let source = StaticSource {
        items: vec![item("x", "first copy"), item("x", "second copy")],
    };

    let mut pipeline = fixture.pipeline(source, summarizer.clone());
    let report = pipeline.run_at("2024-05-01_09-00-00").await.unwrap();

    assert_eq!(report.processed, 1);
    assert_eq!(summarizer.inputs.lock().unwrap().len(), 1);
    let records = read_records(report.snapshot.as_ref().unwrap());
    assert_eq!(records[0].title, "first copy");
}

#[tokio::test]
async fn summarizer_failure_keeps_the_item_with_raw_content() {
    let fixture = Fixture::new();
    let source = StaticSource {
        items: vec![item("ok", "calm post"), item("bad", "boom: new research paper")],
    };

    let mut pipeline = fixture.pipeline(source, PickySummarizer);
    let report = pipeline.run_at("2024-05-01_09-00-00").await.unwrap();
    assert_eq!(report.processed, 2);

    let records = read_records(report.snapshot.as_ref().unwrap());
    let bad = records.iter().find(|r| r.item_id == "bad").unwrap();
    assert_eq!(bad.summary, "boom: new research paper\n\ncomment on bad");
    assert!(bad.tags.contains("research"));

    let ok = records.iter().find(|r| r.item_id == "ok").unwrap();
    assert_eq!(ok.summary, "a fine summary");
    assert!(ok.tags.contains("other"));
    assert!(pipeline.seen().contains("bad"));
}

#[tokio::test]
async fn source_failure_is_an_empty_successful_run() {
    let fixture = Fixture::new();
    let mut pipeline = fixture.pipeline(FailingSource, RecordingSummarizer::default());

    let report = pipeline.run_at("2024-05-01_09-00-00").await.unwrap();

    assert_eq!(report.fetched, 0);
    assert!(report.snapshot.is_none());
    assert!(!fixture.seen_path().exists());
    assert_eq!(fixture.snapshot_count(), 0);
}

#[tokio::test]
async fn corrupt_seen_set_is_treated_as_empty() {
    let fixture = Fixture::new();
    fs::create_dir_all(fixture.seen_path().parent().unwrap()).unwrap();
    fs::write(fixture.seen_path(), "[\"1\", oops").unwrap();

    let source = StaticSource {
        items: vec![item("1", "A"), item("2", "B")],
    };
    let mut pipeline = fixture.pipeline(source, RecordingSummarizer::default());
    let report = pipeline.run_at("2024-05-01_09-00-00").await.unwrap();

    assert_eq!(report.processed, 2);
    let reloaded = SeenSet::load(fixture.seen_path());
    assert!(reloaded.contains("1"));
    assert!(reloaded.contains("2"));
}

#[tokio::test]
async fn summarizer_input_is_truncated() {
    let fixture = Fixture::new();
    let summarizer = RecordingSummarizer::default();
    let long = Item::new("long", "T", "s").with_content(vec!["é".repeat(100)]);

    let mut pipeline = fixture
        .pipeline(StaticSource { items: vec![long] }, summarizer.clone())
        .with_options(PipelineOptions {
            max_input_chars: 10,
            empty_run_policy: EmptyRunPolicy::Skip,
        });
    pipeline.run_at("2024-05-01_09-00-00").await.unwrap();

    let inputs = summarizer.inputs.lock().unwrap();
    assert_eq!(inputs[0].chars().count(), 10);
    assert!(inputs[0].starts_with("T\n\n"));
}

#[tokio::test]
async fn persistence_failure_is_fatal_and_keeps_seen_set() {
    let fixture = Fixture::new();
    // A regular file where the data directory should be.
    fs::write(fixture.dir.path().join("data"), "not a directory").unwrap();

    let source = StaticSource {
        items: vec![item("1", "A")],
    };
    let mut pipeline = fixture.pipeline(source, RecordingSummarizer::default());
    let result = pipeline.run_at("2024-05-01_09-00-00").await;

    assert!(result.is_err());
    assert!(!fixture.seen_path().exists());
}

#[tokio::test]
async fn failed_digest_write_leaves_no_snapshot_behind() {
    let fixture = Fixture::new();
    fs::write(fixture.dir.path().join("digests"), "not a directory").unwrap();

    let items = vec![item("1", "A")];
    let mut failing = fixture.pipeline(
        StaticSource {
            items: items.clone(),
        },
        RecordingSummarizer::default(),
    );
    assert!(failing.run_at("2024-05-01_09-00-00").await.is_err());
    assert_eq!(fixture.snapshot_count(), 0);
    assert_eq!(fs::read_dir(fixture.dir.path().join("data")).unwrap().count(), 0);
    assert!(!fixture.seen_path().exists());

    fs::remove_file(fixture.dir.path().join("digests")).unwrap();
    let mut retry = fixture.pipeline(StaticSource { items }, RecordingSummarizer::default());
    retry.run_at("2024-05-01_10-00-00").await.unwrap();

    let holding_one: usize = fixture
        .store()
        .load_snapshots()
        .iter()
        .filter(|s| s.records.iter().any(|r| r.item_id == "1"))
        .count();
    assert_eq!(holding_one, 1);
}

#[tokio::test]
async fn failed_seen_set_write_rolls_back_the_run() {
    let fixture = Fixture::new();
    // A regular file where the seen-set's directory should be.
    fs::write(fixture.dir.path().join("state"), "not a directory").unwrap();

    let source = StaticSource {
        items: vec![item("1", "A")],
    };
    let mut pipeline = fixture.pipeline(source, RecordingSummarizer::default());
    let result = pipeline.run_at("2024-05-01_09-00-00").await;

    assert!(result.is_err());
    assert_eq!(fixture.snapshot_count(), 0);
    assert_eq!(fs::read_dir(fixture.dir.path().join("data")).unwrap().count(), 0);
    assert!(!fixture.store().digest_path("2024-05-01_09-00-00").exists());
}

#[tokio::test]
async fn resurface_policy_renders_history_without_a_new_snapshot() {
    let fixture = Fixture::new();
    let items = vec![item("1", "one"), item("2", "two"), item("3", "three")];

    let source = StaticSource {
        items: items.clone(),
    };
    let mut first = fixture.pipeline(source, RecordingSummarizer::default());
    first.run_at("2024-05-01_09-00-00").await.unwrap();

    let mut second = fixture
        .pipeline(StaticSource { items }, RecordingSummarizer::default())
        .with_options(PipelineOptions {
            max_input_chars: 3000,
            empty_run_policy: EmptyRunPolicy::Resurface { limit: 2 },
        });
    let report = second.run_at("2024-05-02_09-00-00").await.unwrap();

    assert_eq!(report.processed, 0);
    assert_eq!(report.resurfaced, 2);
    assert!(report.snapshot.is_none());
    assert_eq!(fixture.snapshot_count(), 1);

    let markdown = fs::read_to_string(report.digest.unwrap()).unwrap();
    assert!(markdown.contains("(resurfaced)"));
    assert_eq!(markdown.matches("## [MachineLearning]").count(), 2);
}

#[tokio::test]
async fn resurface_policy_with_no_history_writes_nothing() {
    let fixture = Fixture::new();
    let mut pipeline = fixture
        .pipeline(StaticSource { items: Vec::new() }, RecordingSummarizer::default())
        .with_options(PipelineOptions {
            max_input_chars: 3000,
            empty_run_policy: EmptyRunPolicy::Resurface { limit: 5 },
        });

    let report = pipeline.run_at("2024-05-01_09-00-00").await.unwrap();
    assert_eq!(report.resurfaced, 0);
    assert!(report.digest.is_none());
}
