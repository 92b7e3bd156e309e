use common::config::StorageConfig;
use common::{DigestError, DigestRecord, DigestResult};
use std::fs;
use std::path::{Path, PathBuf};
use time::macros::format_description;
use time::OffsetDateTime;
use tracing::{info, warn};

/// Run timestamp used to name snapshot and digest files, e.g. `2024-05-01_09-30-00`.
pub fn run_timestamp(at: OffsetDateTime) -> DigestResult<String> {
    at.format(format_description!(
        "[year]-[month]-[day]_[hour]-[minute]-[second]"
    ))
    .map_err(|e| DigestError::Parse(format!("Failed to format run timestamp: {}", e)))
}

/// One run's batch of records, named by its run timestamp.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub name: String,
    pub records: Vec<DigestRecord>,
}

/// Write-once snapshot files (`<data_dir>/<ts>.json`) and their Markdown
/// renderings (`<digest_dir>/<ts>.md`).
#[derive(Debug, Clone)]
pub struct DigestStore {
    data_dir: PathBuf,
    digest_dir: PathBuf,
}

impl DigestStore {
    pub fn new(data_dir: impl Into<PathBuf>, digest_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            digest_dir: digest_dir.into(),
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(&config.data_dir, &config.digest_dir)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn snapshot_path(&self, timestamp: &str) -> PathBuf {
        self.data_dir.join(format!("{}.json", timestamp))
    }

    pub fn digest_path(&self, timestamp: &str) -> PathBuf {
        self.digest_dir.join(format!("{}.md", timestamp))
    }

    pub fn write_snapshot(&self, timestamp: &str, records: &[DigestRecord]) -> DigestResult<PathBuf> {
        let path = self.stage_snapshot(timestamp, records)?.commit()?;
        info!("Wrote snapshot of {} records to {}", records.len(), path.display());
        Ok(path)
    }

    /// Writes the snapshot beside its final name. Readers only see it once committed.
    pub fn stage_snapshot(
        &self,
        timestamp: &str,
        records: &[DigestRecord],
    ) -> DigestResult<StagedFile> {
        let json = serde_json::to_string_pretty(records)?;
        StagedFile::write(self.snapshot_path(timestamp), &json)
    }

    pub fn write_digest(&self, timestamp: &str, markdown: &str) -> DigestResult<PathBuf> {
        let path = StagedFile::write(self.digest_path(timestamp), markdown)?.commit()?;
        info!("Wrote digest to {}", path.display());
        Ok(path)
    }

    /// Removes a digest written by a run that later failed.
    pub fn remove_digest(&self, timestamp: &str) {
        let path = self.digest_path(timestamp);
        if let Err(e) = fs::remove_file(&path) {
            warn!("Could not remove digest {}: {}", path.display(), e);
        }
    }

    /// Every readable snapshot, most recent first. Unreadable files are skipped.
    pub fn load_snapshots(&self) -> Vec<Snapshot> {
        let entries = match fs::read_dir(&self.data_dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(
                    "Snapshot directory {} is not readable: {}",
                    self.data_dir.display(),
                    e
                );
                return Vec::new();
            }
        };

        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(String::from))
            .collect();
        names.sort_unstable_by(|a, b| b.cmp(a));

        let mut snapshots = Vec::with_capacity(names.len());
        for name in names {
            let path = self.snapshot_path(&name);
            let parsed = fs::read_to_string(&path)
                .map_err(DigestError::from)
                .and_then(|contents| {
                    serde_json::from_str::<Vec<DigestRecord>>(&contents).map_err(DigestError::from)
                });
            match parsed {
                Ok(records) => snapshots.push(Snapshot { name, records }),
                Err(e) => warn!("Skipping unreadable snapshot {}: {}", path.display(), e),
            }
        }
        snapshots
    }

    /// Records across all snapshots, most recent snapshot first.
    pub fn load_records(&self) -> Vec<DigestRecord> {
        self.load_snapshots()
            .into_iter()
            .flat_map(|snapshot| snapshot.records)
            .collect()
    }
}

/// A file written under a temporary name, renamed into place by `commit`.
/// Dropping it without committing removes the temporary file.
#[derive(Debug)]
pub struct StagedFile {
    temp: PathBuf,
    target: PathBuf,
    committed: bool,
}

impl StagedFile {
    fn write(target: PathBuf, contents: &str) -> DigestResult<Self> {
        ensure_absent(&target)?;
        if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut temp_name = target.as_os_str().to_owned();
        temp_name.push(".tmp");
        let staged = Self {
            temp: PathBuf::from(temp_name),
            target,
            committed: false,
        };
        fs::write(&staged.temp, contents)?;
        Ok(staged)
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Moves the file to its final name, refusing to replace an existing one.
    pub fn commit(mut self) -> DigestResult<PathBuf> {
        ensure_absent(&self.target)?;
        fs::rename(&self.temp, &self.target)?;
        self.committed = true;
        Ok(self.target.clone())
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if !self.committed && self.temp.exists() {
            if let Err(e) = fs::remove_file(&self.temp) {
                warn!("Could not remove staged file {}: {}", self.temp.display(), e);
            }
        }
    }
}

fn ensure_absent(path: &Path) -> DigestResult<()> {
    if path.exists() {
        return Err(DigestError::Storage(format!(
            "{} already exists and will not be overwritten",
            path.display()
        )));
    }
    Ok(())
}

/// Markdown for one run: a heading followed by the records separated by rules.
pub fn render_digest(timestamp: &str, records: &[DigestRecord]) -> String {
    let body = records
        .iter()
        .map(DigestRecord::to_markdown_string)
        .collect::<Vec<_>>()
        .join("\n\n---\n\n");
    format!("# ML Digest {}\n\n{}\n", timestamp, body)
}

/// Markdown for a run that found nothing new and re-surfaces stored records.
pub fn render_resurfaced_digest(timestamp: &str, records: &[DigestRecord]) -> String {
    let body = records
        .iter()
        .map(DigestRecord::to_markdown_string)
        .collect::<Vec<_>>()
        .join("\n\n---\n\n");
    format!(
        "# ML Digest {} (resurfaced)\n\n_No new posts this run. Showing {} earlier entries._\n\n{}\n",
        timestamp,
        records.len(),
        body
    )
}
