pub mod error;
pub mod types;

pub use error::{Result, SerpError};
pub use types::{OrganicResult, SearchParams, SearchResponse};

use std::time::Duration;

const BASE_URL: &str = "https://serpapi.com/search.json";

/// SerpApi reports "no results" as an `error` string on an otherwise
/// successful response.
const NO_RESULTS_PREFIX: &str = "Google hasn't returned any results";

pub struct SerpClient {
    client: reqwest::Client,
    api_key: String,
    params: SearchParams,
    base_url: String,
}

impl SerpClient {
    pub fn new(api_key: String, params: SearchParams, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: reqwest::Client::builder().timeout(timeout).build()?,
            api_key,
            params,
            base_url: BASE_URL.to_string(),
        })
    }

    /// Swap in a preconfigured HTTP client (proxies, custom TLS).
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Point the client at a different endpoint (proxies, local fakes).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Run one search and return its organic results. Single attempt.
    pub async fn search(&self, query: &str) -> Result<Vec<OrganicResult>> {
        tracing::info!(query, engine = %self.params.engine, "SerpApi search");

        let resp = self
            .client
            .get(&self.base_url)
            .query(&[
                ("engine", self.params.engine.as_str()),
                ("q", query),
                ("google_domain", self.params.google_domain.as_str()),
                ("gl", self.params.gl.as_str()),
                ("hl", self.params.hl.as_str()),
                ("api_key", self.api_key.as_str()),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SerpError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = resp.text().await?;
        let results = parse_search_response(&body)?;
        tracing::info!(query, count = results.len(), "SerpApi search complete");
        Ok(results)
    }
}

/// Decode a `search.json` body. Undecodable payloads are errors, never an
/// empty batch.
pub fn parse_search_response(body: &str) -> Result<Vec<OrganicResult>> {
    let response: SearchResponse = serde_json::from_str(body)?;

    match response.error {
        Some(message) if response.organic_results.is_empty() => {
            if message.starts_with(NO_RESULTS_PREFIX) {
                Ok(Vec::new())
            } else {
                Err(SerpError::Api {
                    status: 200,
                    message,
                })
            }
        }
        _ => Ok(response.organic_results),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_organic_results() {
        let body = r#"{
            "search_metadata": {"status": "Success"},
            "organic_results": [
                {
                    "position": 1,
                    "title": "How do I export from FloQast?",
                    "link": "https://stackoverflow.com/questions/1",
                    "displayed_link": "stackoverflow.com › questions",
                    "snippet": "I am trying to export...",
                    "snippet_highlighted_words": ["FloQast", "export"],
                    "cached_page_link": "https://webcache.example/1",
                    "source": "Stack Overflow"
                },
                {
                    "title": "Second",
                    "link": "https://stackexchange.com/q/2"
                }
            ]
        }"#;

        let results = parse_search_response(body).unwrap();
        assert_eq!(results.len(), 2);

        let first = &results[0];
        assert_eq!(first.position, Some(1));
        assert_eq!(first.displayed_link, "stackoverflow.com › questions");
        assert_eq!(first.snippet_highlighted_words.as_deref(), Some("FloQast, export"));
        assert_eq!(first.cached_page_link.as_deref(), Some("https://webcache.example/1"));
        assert_eq!(first.source.as_deref(), Some("Stack Overflow"));

        let second = &results[1];
        assert_eq!(second.position, None);
        assert_eq!(second.snippet, "");
        assert_eq!(second.snippet_highlighted_words, None);
    }

    #[test]
    fn accepts_highlights_as_plain_string() {
        let body = r#"{"organic_results": [
            {"title": "T", "link": "https://t", "snippet_highlighted_words": "FloQast"}
        ]}"#;
        let results = parse_search_response(body).unwrap();
        assert_eq!(results[0].snippet_highlighted_words.as_deref(), Some("FloQast"));
    }

    #[test]
    fn missing_organic_results_is_an_empty_batch() {
        let results = parse_search_response(r#"{"search_metadata": {}}"#).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn no_results_error_is_an_empty_batch() {
        let body = r#"{"error": "Google hasn't returned any results for this query."}"#;
        assert!(parse_search_response(body).unwrap().is_empty());
    }

    #[test]
    fn provider_error_is_reported() {
        let body = r#"{"error": "Invalid API key. Your API key should be here: https://serpapi.com/manage-api-key"}"#;
        match parse_search_response(body) {
            Err(SerpError::Api { status, message }) => {
                assert_eq!(status, 200);
                assert!(message.starts_with("Invalid API key"));
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn malformed_body_is_a_parse_error() {
        assert!(matches!(
            parse_search_response("<html>502 Bad Gateway</html>"),
            Err(SerpError::Parse(_))
        ));
    }

    #[test]
    fn result_without_link_is_a_parse_error() {
        let body = r#"{"organic_results": [{"title": "no link"}]}"#;
        assert!(matches!(parse_search_response(body), Err(SerpError::Parse(_))));
    }

    // --- Transport ---

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// One-shot HTTP listener answering with `status` and `body`. Resolves to
    /// the request line.
    async fn serp_stub(
        status: &'static str,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/search.json", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];
            while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut chunk).await.unwrap();
                assert!(n > 0, "client closed before sending headers");
                buf.extend_from_slice(&chunk[..n]);
            }

            let response = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let head = String::from_utf8_lossy(&buf).into_owned();
            head.lines().next().unwrap_or_default().to_string()
        });

        (url, handle)
    }

    fn client(api_key: &str, base_url: String) -> SerpClient {
        let http = reqwest::Client::builder().no_proxy().build().unwrap();
        SerpClient::new(api_key.to_string(), SearchParams::default(), Duration::from_secs(5))
            .unwrap()
            .with_client(http)
            .with_base_url(base_url)
    }

    #[tokio::test]
    async fn search_sends_engine_params_and_decodes_results() {
        let (url, request) = serp_stub(
            "200 OK",
            r#"{"organic_results": [{"position": 1, "title": "T", "link": "https://t.example"}]}"#,
        )
        .await;

        let results = client("key123", url)
            .search("floqast site:stackoverflow.com")
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "T");
        assert_eq!(results[0].link, "https://t.example");

        let request_line = request.await.unwrap();
        assert!(request_line.starts_with("GET /search.json?"), "{request_line}");
        for param in [
            "engine=google",
            "q=floqast+site%3Astackoverflow.com",
            "google_domain=google.com",
            "gl=us",
            "hl=en",
            "api_key=key123",
        ] {
            assert!(request_line.contains(param), "missing {param} in {request_line}");
        }
    }

    #[tokio::test]
    async fn non_success_status_is_an_api_error() {
        let (url, request) = serp_stub("500 Internal Server Error", "upstream exploded").await;

        let err = client("key123", url).search("floqast").await.unwrap_err();

        match err {
            SerpError::Api { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "upstream exploded");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
        request.await.unwrap();
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_network_error_without_the_api_key() {
        let err = client("SECRET-KEY", "http://127.0.0.1:1/search.json".to_string())
            .search("floqast")
            .await
            .unwrap_err();

        assert!(matches!(err, SerpError::Network(_)), "got {err:?}");
        assert!(!err.to_string().contains("SECRET-KEY"), "{err}");
        assert!(!format!("{err:?}").contains("SECRET-KEY"), "{err:?}");
    }
}
