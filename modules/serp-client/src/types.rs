use serde::{Deserialize, Deserializer};

/// Engine parameters sent with every search.
#[derive(Debug, Clone)]
pub struct SearchParams {
    pub engine: String,
    pub google_domain: String,
    /// Country code.
    pub gl: String,
    /// Interface language.
    pub hl: String,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            engine: "google".to_string(),
            google_domain: "google.com".to_string(),
            gl: "us".to_string(),
            hl: "en".to_string(),
        }
    }
}

/// Top-level `search.json` response. Only the fields doorkeep reads.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub organic_results: Vec<OrganicResult>,
    #[serde(default)]
    pub error: Option<String>,
}

/// A single entry of `organic_results`.
#[derive(Debug, Clone, Deserialize)]
pub struct OrganicResult {
    pub position: Option<i64>,
    pub title: String,
    pub link: String,
    #[serde(default)]
    pub displayed_link: String,
    #[serde(default)]
    pub snippet: String,
    /// SerpApi sends an array of words; older payloads used a plain string.
    #[serde(default, deserialize_with = "string_or_list")]
    pub snippet_highlighted_words: Option<String>,
    pub cached_page_link: Option<String>,
    pub source: Option<String>,
}

fn string_or_list<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Highlights {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<Highlights>::deserialize(deserializer)? {
        None => None,
        Some(Highlights::One(s)) => Some(s),
        Some(Highlights::Many(words)) if words.is_empty() => None,
        Some(Highlights::Many(words)) => Some(words.join(", ")),
    })
}
