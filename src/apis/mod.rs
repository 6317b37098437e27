use std::time::Duration;
use tracing::warn;

use crate::config::{Config, ScrapeConfig};
use crate::error::{HarvestError, Result};
use crate::pipeline::ShutdownFlag;
use crate::types::{Platform, TemplateSource};

pub mod make;
pub mod n8n;
pub mod zapier;

pub use make::MakeSource;
pub use n8n::N8nSource;
pub use zapier::ZapierSource;

/// Build the source for a platform from the loaded configuration
pub fn source_for(
    platform: Platform,
    config: &Config,
    shutdown: ShutdownFlag,
) -> Result<Box<dyn TemplateSource>> {
    let scrape = config.scrape.clone();
    Ok(match platform {
        Platform::Make => Box::new(MakeSource::new(
            config.platforms.make.clone(),
            scrape,
            shutdown,
        )?),
        Platform::N8n => Box::new(N8nSource::new(
            config.platforms.n8n.clone(),
            scrape,
            shutdown,
        )?),
        Platform::Zapier => Box::new(ZapierSource::new(
            config.platforms.zapier.clone(),
            scrape,
            shutdown,
        )?),
    })
}

pub(crate) fn build_client(timeout_seconds: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_seconds))
        .user_agent(concat!("template_harvester/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(HarvestError::from)
}

/// GET a JSON document, retrying transient failures with exponential
/// backoff. An error here means the page exhausted its retries; callers
/// decide whether that skips the page or the platform.
pub(crate) async fn get_json_with_retry(
    client: &reqwest::Client,
    url: &str,
    scrape: &ScrapeConfig,
) -> Result<serde_json::Value> {
    retry_request(url, scrape, || async {
        let response = client.get(url).send().await?.error_for_status()?;
        Ok(response.json::<serde_json::Value>().await?)
    })
    .await
}

/// GET an HTML/text document with the same retry behavior
pub(crate) async fn get_text_with_retry(
    client: &reqwest::Client,
    url: &str,
    scrape: &ScrapeConfig,
) -> Result<String> {
    retry_request(url, scrape, || async {
        let response = client.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    })
    .await
}

async fn retry_request<T, F, Fut>(url: &str, scrape: &ScrapeConfig, request: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let max_retries = scrape.max_retries.max(1);
    let mut attempt = 1u32;
    loop {
        match request().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < max_retries => {
                let wait =
                    Duration::from_millis(scrape.retry_delay_ms * 2u64.pow(attempt - 1));
                warn!(
                    "Request to {} failed: {}. Retrying in {:?} (attempt {}/{})",
                    url,
                    e,
                    wait,
                    attempt + 1,
                    max_retries
                );
                tokio::time::sleep(wait).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
