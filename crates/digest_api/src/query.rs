use common::DigestRecord;
use ingestion::DigestStore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Optional filters; blank values are ignored.
#[derive(Debug, Clone, Default)]
pub struct DigestFilter {
    /// Prefix of the run timestamp, e.g. `2024-05` or `2024-05-01`.
    pub date: Option<String>,
    pub source: Option<String>,
    pub tag: Option<String>,
}

impl DigestFilter {
    pub fn matches(&self, record: &DigestRecord) -> bool {
        if let Some(date) = non_blank(&self.date) {
            if !record.timestamp.starts_with(date) {
                return false;
            }
        }
        if let Some(source) = non_blank(&self.source) {
            if !record.source.eq_ignore_ascii_case(source) {
                return false;
            }
        }
        if let Some(tag) = non_blank(&self.tag) {
            if !record.has_tag(tag) {
                return false;
            }
        }
        true
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    pub total: usize,
    pub items: Vec<DigestRecord>,
}

/// Read-only view over the snapshot directory. Every call re-reads the files.
#[derive(Debug, Clone)]
pub struct DigestQuery {
    store: DigestStore,
}

impl DigestQuery {
    pub fn new(store: DigestStore) -> Self {
        Self { store }
    }

    pub fn list(&self, filter: &DigestFilter, offset: usize, limit: usize) -> Page {
        let matching: Vec<DigestRecord> = self
            .store
            .load_records()
            .into_iter()
            .filter(|record| filter.matches(record))
            .collect();

        Page {
            total: matching.len(),
            items: matching.into_iter().skip(offset).take(limit).collect(),
        }
    }

    pub fn latest(&self) -> Option<DigestRecord> {
        self.store.load_records().into_iter().next()
    }

    /// Distinct tags across all snapshots, lower-cased and sorted.
    pub fn tags(&self) -> Vec<String> {
        self.store
            .load_records()
            .into_iter()
            .flat_map(|record| record.tags)
            .map(|tag| tag.to_lowercase())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn sources(&self) -> Vec<String> {
        self.store
            .load_records()
            .into_iter()
            .map(|record| record.source)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}
