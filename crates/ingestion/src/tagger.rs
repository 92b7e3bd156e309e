use std::collections::BTreeSet;

pub const DEFAULT_FALLBACK_TAG: &str = "other";

/// Fires `label` when any keyword occurs in the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRule {
    keywords: Vec<String>,
    label: String,
}

impl TagRule {
    pub fn new<I, K>(keywords: I, label: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
            label: label.into(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    fn matches(&self, lowered: &str) -> bool {
        self.keywords.iter().any(|k| lowered.contains(k.as_str()))
    }
}

/// Keyword classifier over an ordered rule table.
#[derive(Debug, Clone)]
pub struct Tagger {
    rules: Vec<TagRule>,
    fallback: String,
}

impl Default for Tagger {
    fn default() -> Self {
        Self::new(
            vec![
                TagRule::new(["paper", "research"], "research"),
                TagRule::new(["job"], "job advice"),
                TagRule::new(["release", "update", "breaking"], "news"),
                TagRule::new(["library", "tutorial"], "tools"),
            ],
            DEFAULT_FALLBACK_TAG,
        )
    }
}

impl Tagger {
    pub fn new(rules: Vec<TagRule>, fallback: impl Into<String>) -> Self {
        Self {
            rules,
            fallback: fallback.into(),
        }
    }

    pub fn rules(&self) -> &[TagRule] {
        &self.rules
    }

    /// All labels whose rule matches, or just the fallback label. Never empty.
    pub fn tag(&self, summary: &str) -> BTreeSet<String> {
        let lowered = summary.trim().to_lowercase();
        let mut tags = BTreeSet::new();

        if !lowered.is_empty() {
            for rule in &self.rules {
                if rule.matches(&lowered) {
                    tags.insert(rule.label.clone());
                }
            }
        }

        if tags.is_empty() {
            tags.insert(self.fallback.clone());
        }
        tags
    }
}
