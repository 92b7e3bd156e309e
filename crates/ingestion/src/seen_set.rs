use common::DigestResult;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Identifiers of every item that has already gone into a snapshot.
///
/// Backed by a JSON array of strings. The whole set is rewritten on
/// [`SeenSet::persist`] through a temp file and a rename, so the file on disk
/// is always either the previous set or the new one.
#[derive(Debug, Clone)]
pub struct SeenSet {
    path: PathBuf,
    ids: HashSet<String>,
}

impl SeenSet {
    /// Loads the set from `path`. A missing or unreadable file yields an empty set.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let ids = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<Vec<String>>(&contents) {
                Ok(ids) => ids.into_iter().collect(),
                Err(e) => {
                    warn!(
                        "Seen-set file {} is corrupt ({}); starting with an empty set",
                        path.display(),
                        e
                    );
                    HashSet::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashSet::new(),
            Err(e) => {
                warn!(
                    "Could not read seen-set file {} ({}); starting with an empty set",
                    path.display(),
                    e
                );
                HashSet::new()
            }
        };

        info!("Loaded {} seen ids from {}", ids.len(), path.display());
        Self { path, ids }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Returns `false` when the id was already present.
    pub fn insert(&mut self, id: impl Into<String>) -> bool {
        self.ids.insert(id.into())
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn persist(&self) -> DigestResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut ids: Vec<&String> = self.ids.iter().collect();
        ids.sort();
        let json = serde_json::to_string_pretty(&ids)?;

        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, json)?;
        fs::rename(&temp_path, &self.path)?;

        info!("Persisted {} seen ids to {}", self.ids.len(), self.path.display());
        Ok(())
    }
}
