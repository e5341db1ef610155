use std::sync::Arc;

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use doorkeep_common::{Config, DoorkeepError};
use doorkeep_store::PgResultStore;
use doorkeep_watch::{
    notify::{NoopBackend, NotifyBackend, SlackWebhook},
    Watcher,
};
use serp_client::{SearchParams, SerpClient};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("doorkeep=info".parse()?)
                .add_directive("serp_client=info".parse()?),
        )
        .init();

    info!("Doorkeep starting...");

    let config = Config::from_env()?;
    config.log_redacted();

    let pool = PgPoolOptions::new()
        .max_connections(
            u32::try_from(config.query_concurrency)
                .unwrap_or(u32::MAX)
                .saturating_add(1),
        )
        .acquire_timeout(config.http_timeout)
        .connect(&config.database_url)
        .await?;

    let store = PgResultStore::new(pool, config.table.clone())?;
    store.migrate().await?;

    let searcher = SerpClient::new(
        config.serpapi_api_key.clone(),
        SearchParams {
            google_domain: config.google_domain.clone(),
            gl: config.gl.clone(),
            hl: config.hl.clone(),
            ..SearchParams::default()
        },
        config.http_timeout,
    )?;

    // Slack if configured, otherwise Noop
    let notifier: Arc<dyn NotifyBackend> = match &config.slack_webhook_url {
        Some(url) => {
            info!("Slack notifications enabled");
            let http = reqwest::Client::builder()
                .timeout(config.http_timeout)
                .build()?;
            Arc::new(SlackWebhook::with_client(url.clone(), http))
        }
        None => {
            info!("No SLACK_WEBHOOK_URL set, notifications disabled");
            Arc::new(NoopBackend)
        }
    };

    let watcher = Watcher::new(Arc::new(searcher), Arc::new(store), notifier)
        .with_query_concurrency(config.query_concurrency);

    // Records committed before the deadline stay committed; the next run
    // sees them as SEEN.
    match tokio::time::timeout(config.deadline, watcher.run(&config.queries)).await {
        Err(_) => {
            error!(deadline_secs = config.deadline.as_secs(), "Doorkeep run hit its deadline");
            Err(DoorkeepError::DeadlineExceeded(config.deadline.as_secs()).into())
        }
        Ok(Err(failed)) => {
            for failure in &failed.failures {
                error!(kind = failure.kind(), query = %failure.query(), "{failure}");
            }
            Err(failed.into())
        }
        Ok(Ok(stats)) => {
            info!("Doorkeep complete. {stats}");
            Ok(())
        }
    }
}
