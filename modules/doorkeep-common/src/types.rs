use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// --- Search results ---

/// One organic result returned by the search provider for a query.
/// Immutable once received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub title: String,
    pub link: String,
    #[serde(default)]
    pub displayed_link: String,
    #[serde(default)]
    pub snippet: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet_highlights: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cached_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl SearchResult {
    /// Minimal result with only the required fields set.
    pub fn new(title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            displayed_link: String::new(),
            snippet: String::new(),
            position: None,
            snippet_highlights: None,
            cached_link: None,
            source: None,
        }
    }

    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = snippet.into();
        self
    }

    pub fn with_position(mut self, position: i64) -> Self {
        self.position = Some(position);
        self
    }

    /// Identity used for deduplication. Rank (`position`) is deliberately
    /// excluded: the same page moving up or down the results is still SEEN.
    pub fn key(&self) -> ResultKey {
        ResultKey::new(&self.title, &self.link)
    }
}

// --- Identity ---

/// Dedup identity of a result: the `(title, link)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResultKey {
    pub title: String,
    pub link: String,
}

impl ResultKey {
    pub fn new(title: &str, link: &str) -> Self {
        Self {
            title: title.to_string(),
            link: link.to_string(),
        }
    }
}

impl fmt::Display for ResultKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.title, self.link)
    }
}

// --- Persistence ---

/// Persisted form of a result, created once when the result is first NEW.
/// Append-only: never mutated or deleted afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub key: ResultKey,
    pub result: SearchResult,
    pub first_seen_at: DateTime<Utc>,
}

impl StoredRecord {
    pub fn new(result: SearchResult, first_seen_at: DateTime<Utc>) -> Self {
        Self {
            key: result.key(),
            result,
            first_seen_at,
        }
    }
}

// --- Queries ---

/// A configured search request. Static configuration, not runtime state.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Query(String);

impl Query {
    pub fn new(q: impl Into<String>) -> Self {
        Self(q.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Query {
    fn from(q: &str) -> Self {
        Self::new(q)
    }
}
