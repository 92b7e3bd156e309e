pub mod config;
pub mod error;
pub mod models;
pub mod retry;
pub mod source;
pub mod summarizer;

pub use config::{Config, EmptyRunPolicy};
pub use error::{DigestError, DigestResult};
pub use models::{DigestRecord, Item};
pub use retry::RetryPolicy;
pub use source::ItemSource;
pub use summarizer::{truncate_chars, ExcerptSummarizer, Summarizer};
