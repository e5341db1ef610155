use std::time::Duration;

use anyhow::Result;

use crate::error::DoorkeepError;
use crate::types::Query;

const DEFAULT_TABLE: &str = "doorkeep";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
const DEFAULT_DEADLINE_SECS: u64 = 300;
const MAX_QUERY_CONCURRENCY: u64 = 64;

/// Configuration for one doorkeep invocation, loaded from environment variables.
/// Built once at startup and passed explicitly into every collaborator.
#[derive(Debug, Clone)]
pub struct Config {
    // Search provider
    pub serpapi_api_key: String,
    pub google_domain: String,
    pub gl: String,
    pub hl: String,

    // Store
    pub database_url: String,
    pub table: String,

    // Notifications
    pub slack_webhook_url: Option<String>,

    // Run
    pub queries: Vec<Query>,
    pub http_timeout: Duration,
    pub deadline: Duration,
    pub query_concurrency: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| -> Result<String, DoorkeepError> {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| DoorkeepError::Config(format!("{key} environment variable is required")))
        };
        let or_default = |key: &str, default: &str| -> String {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let table = or_default("DOORKEEP_TABLE", DEFAULT_TABLE);
        if !is_valid_table_name(&table) {
            return Err(DoorkeepError::Config(format!(
                "DOORKEEP_TABLE must be a plain SQL identifier, got {table:?}"
            ))
            .into());
        }

        let queries = parse_queries(&required("DOORKEEP_QUERIES")?);
        if queries.is_empty() {
            return Err(DoorkeepError::Config("DOORKEEP_QUERIES contains no queries".into()).into());
        }

        let config = Self {
            serpapi_api_key: required("SERPAPI_API_KEY")?,
            google_domain: or_default("SERPAPI_GOOGLE_DOMAIN", "google.com"),
            gl: or_default("SERPAPI_GL", "us"),
            hl: or_default("SERPAPI_HL", "en"),
            database_url: required("DATABASE_URL")?,
            table,
            slack_webhook_url: lookup("SLACK_WEBHOOK_URL").filter(|v| !v.trim().is_empty()),
            queries,
            http_timeout: Duration::from_secs(parse_number(
                &lookup,
                "DOORKEEP_HTTP_TIMEOUT_SECS",
                DEFAULT_HTTP_TIMEOUT_SECS,
            )?),
            deadline: Duration::from_secs(parse_number(
                &lookup,
                "DOORKEEP_DEADLINE_SECS",
                DEFAULT_DEADLINE_SECS,
            )?),
            query_concurrency: parse_number(&lookup, "DOORKEEP_QUERY_CONCURRENCY", 1)?
                .clamp(1, MAX_QUERY_CONCURRENCY) as usize,
        };

        Ok(config)
    }

    /// Log the loaded configuration with secrets truncated.
    pub fn log_redacted(&self) {
        fn preview(val: &str) -> String {
            let n = val.len().min(5);
            format!("{}...({} chars)", val.get(..n).unwrap_or(""), val.len())
        }

        tracing::info!("Config loaded:");
        tracing::info!("  SERPAPI_API_KEY: {}", preview(&self.serpapi_api_key));
        tracing::info!("  DATABASE_URL: {}", preview(&self.database_url));
        tracing::info!("  DOORKEEP_TABLE: {}", self.table);
        tracing::info!(
            "  SLACK_WEBHOOK_URL: {}",
            self.slack_webhook_url
                .as_deref()
                .map(preview)
                .unwrap_or_else(|| "<not set>".to_string())
        );
        tracing::info!("  queries: {}", self.queries.len());
        tracing::info!(
            "  search: google_domain={} gl={} hl={}",
            self.google_domain,
            self.gl,
            self.hl
        );
        tracing::info!(
            "  http_timeout={}s deadline={}s query_concurrency={}",
            self.http_timeout.as_secs(),
            self.deadline.as_secs(),
            self.query_concurrency
        );
    }
}

/// Split a query list on newlines or `;`, dropping blanks.
pub fn parse_queries(raw: &str) -> Vec<Query> {
    raw.split(['\n', ';'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(Query::new)
        .collect()
}

/// Postgres identifiers that can be interpolated without quoting.
pub fn is_valid_table_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    name.len() <= 63 && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn parse_number(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: u64,
) -> Result<u64, DoorkeepError> {
    match lookup(key).filter(|v| !v.trim().is_empty()) {
        None => Ok(default),
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| DoorkeepError::Config(format!("{key} must be a non-negative integer, got {v:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn base() -> HashMap<String, String> {
        vars(&[
            ("SERPAPI_API_KEY", "serp-secret"),
            ("DATABASE_URL", "postgres://localhost/doorkeep"),
            ("DOORKEEP_QUERIES", "floqast site:stackoverflow.com"),
        ])
    }

    fn load(map: &HashMap<String, String>) -> Result<Config> {
        Config::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_apply_when_optional_vars_missing() {
        let config = load(&base()).unwrap();
        assert_eq!(config.table, "doorkeep");
        assert_eq!(config.google_domain, "google.com");
        assert_eq!(config.gl, "us");
        assert_eq!(config.hl, "en");
        assert_eq!(config.http_timeout, Duration::from_secs(30));
        assert_eq!(config.deadline, Duration::from_secs(300));
        assert_eq!(config.query_concurrency, 1);
        assert!(config.slack_webhook_url.is_none());
        assert_eq!(config.queries, vec![Query::new("floqast site:stackoverflow.com")]);
    }

    #[test]
    fn missing_required_var_is_an_error() {
        let mut map = base();
        map.remove("SERPAPI_API_KEY");
        let err = load(&map).unwrap_err();
        assert!(err.to_string().contains("SERPAPI_API_KEY"));
    }

    #[test]
    fn blank_slack_url_disables_notifications() {
        let mut map = base();
        map.insert("SLACK_WEBHOOK_URL".into(), "  ".into());
        assert!(load(&map).unwrap().slack_webhook_url.is_none());
    }

    #[test]
    fn rejects_table_name_that_needs_quoting() {
        let mut map = base();
        map.insert("DOORKEEP_TABLE".into(), "results; DROP TABLE x".into());
        assert!(load(&map).is_err());
    }

    #[test]
    fn rejects_non_numeric_timeout() {
        let mut map = base();
        map.insert("DOORKEEP_HTTP_TIMEOUT_SECS".into(), "soon".into());
        let err = load(&map).unwrap_err();
        assert!(err.to_string().contains("DOORKEEP_HTTP_TIMEOUT_SECS"));
    }

    #[test]
    fn zero_concurrency_is_clamped_to_one() {
        let mut map = base();
        map.insert("DOORKEEP_QUERY_CONCURRENCY".into(), "0".into());
        assert_eq!(load(&map).unwrap().query_concurrency, 1);
    }

    #[test]
    fn huge_concurrency_is_capped() {
        let mut map = base();
        map.insert("DOORKEEP_QUERY_CONCURRENCY".into(), u64::MAX.to_string());
        assert_eq!(load(&map).unwrap().query_concurrency, 64);
    }

    #[test]
    fn queries_split_on_newlines_and_semicolons() {
        let queries = parse_queries("a OR b\n\n  c ;d;  ");
        assert_eq!(
            queries,
            vec![Query::new("a OR b"), Query::new("c"), Query::new("d")]
        );
    }

    #[test]
    fn whitespace_only_query_list_is_an_error() {
        let mut map = base();
        map.insert("DOORKEEP_QUERIES".into(), " ; \n ".into());
        assert!(load(&map).is_err());
    }

    #[test]
    fn table_name_rules() {
        assert!(is_valid_table_name("doorkeep"));
        assert!(is_valid_table_name("_results_2"));
        assert!(!is_valid_table_name("2results"));
        assert!(!is_valid_table_name("door-keep"));
        assert!(!is_valid_table_name(""));
    }
}
