use crate::retry::RetryPolicy;
use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub digest_dir: PathBuf,
    pub seen_ids_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            digest_dir: PathBuf::from("digests"),
            seen_ids_path: PathBuf::from("state/seen_ids.json"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RedditConfig {
    pub search_query: String,
    pub search_limit: usize,
    pub top_comments: usize,
    pub user_agent: String,
}

impl Default for RedditConfig {
    fn default() -> Self {
        Self {
            search_query: "machine learning OR jobs OR career advice OR problems OR algorithms OR tutorials OR research".to_string(),
            search_limit: 25,
            top_comments: 3,
            user_agent: "ml-reddit-digest-bot".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SummarizerConfig {
    pub hf_api_token: Option<String>,
    pub model: String,
    pub max_length: usize,
    pub min_length: usize,
    pub max_input_chars: usize,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            hf_api_token: None,
            model: "sshleifer/distilbart-cnn-12-6".to_string(),
            max_length: 100,
            min_length: 30,
            max_input_chars: 3000,
        }
    }
}

/// What a run does when no new items were found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmptyRunPolicy {
    /// Write nothing and report that nothing is new.
    #[default]
    Skip,
    /// Render a digest from the most recent stored records, without a new snapshot.
    Resurface { limit: usize },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub storage: StorageConfig,
    pub reddit: RedditConfig,
    pub summarizer: SummarizerConfig,
    pub retry: RetryPolicy,
    pub empty_run_policy: EmptyRunPolicy,
    pub api_bind_addr: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            reddit: RedditConfig::default(),
            summarizer: SummarizerConfig::default(),
            retry: RetryPolicy::default(),
            empty_run_policy: EmptyRunPolicy::default(),
            api_bind_addr: "127.0.0.1:8000".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; unset or unparsable numbers keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let storage = StorageConfig {
            data_dir: lookup("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.storage.data_dir),
            digest_dir: lookup("DIGEST_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.storage.digest_dir),
            seen_ids_path: lookup("SEEN_IDS_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.storage.seen_ids_path),
        };

        let reddit = RedditConfig {
            search_query: lookup("SEARCH_QUERY")
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(defaults.reddit.search_query),
            search_limit: parse_var(&lookup, "SEARCH_LIMIT")
                .unwrap_or(defaults.reddit.search_limit),
            top_comments: parse_var(&lookup, "TOP_COMMENTS")
                .unwrap_or(defaults.reddit.top_comments),
            user_agent: lookup("REDDIT_USER_AGENT").unwrap_or(defaults.reddit.user_agent),
        };

        let summarizer = SummarizerConfig {
            hf_api_token: lookup("HF_API_TOKEN").filter(|s| !s.trim().is_empty()),
            model: lookup("HF_MODEL").unwrap_or(defaults.summarizer.model),
            max_length: parse_var(&lookup, "SUMMARY_MAX_LENGTH")
                .unwrap_or(defaults.summarizer.max_length),
            min_length: parse_var(&lookup, "SUMMARY_MIN_LENGTH")
                .unwrap_or(defaults.summarizer.min_length),
            max_input_chars: parse_var(&lookup, "SUMMARY_MAX_INPUT_CHARS")
                .unwrap_or(defaults.summarizer.max_input_chars),
        };

        let retry = RetryPolicy::new(
            parse_var(&lookup, "FETCH_MAX_ATTEMPTS").unwrap_or(defaults.retry.max_attempts),
            parse_var(&lookup, "FETCH_BACKOFF_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry.initial_backoff),
        );

        let empty_run_policy = match lookup("EMPTY_RUN_POLICY") {
            None => EmptyRunPolicy::Skip,
            Some(name) => {
                let limit = parse_var(&lookup, "RESURFACE_LIMIT").unwrap_or(10);
                EmptyRunPolicy::parse(&name, limit)
                    .with_context(|| format!("EMPTY_RUN_POLICY has unknown value '{}'", name))?
            }
        };

        Ok(Config {
            storage,
            reddit,
            summarizer,
            retry,
            empty_run_policy,
            api_bind_addr: lookup("API_BIND_ADDR").unwrap_or(defaults.api_bind_addr),
        })
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key).and_then(|s| s.trim().parse().ok())
}

impl EmptyRunPolicy {
    fn parse(name: &str, limit: usize) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "" | "skip" => Some(EmptyRunPolicy::Skip),
            "resurface" => Some(EmptyRunPolicy::Resurface { limit }),
            _ => None,
        }
    }
}
