use anyhow::{Context, Result};
use async_trait::async_trait;

use doorkeep_common::{Query, SearchResult};
use serp_client::{OrganicResult, SerpClient};

/// Source of result batches, one call per query.
#[async_trait]
pub trait Searcher: Send + Sync {
    async fn search(&self, query: &Query) -> Result<Vec<SearchResult>>;
}

#[async_trait]
impl Searcher for SerpClient {
    async fn search(&self, query: &Query) -> Result<Vec<SearchResult>> {
        let results = SerpClient::search(self, query.as_str())
            .await
            .with_context(|| format!("SerpApi search failed for \"{query}\""))?;

        Ok(results.into_iter().map(to_search_result).collect())
    }
}

fn to_search_result(r: OrganicResult) -> SearchResult {
    SearchResult {
        title: r.title,
        link: r.link,
        displayed_link: r.displayed_link,
        snippet: r.snippet,
        position: r.position,
        snippet_highlights: r.snippet_highlighted_words,
        cached_link: r.cached_page_link,
        source: r.source,
    }
}
