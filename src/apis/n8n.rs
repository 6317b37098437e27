use tracing::{debug, info, instrument, warn};

use super::{build_client, get_json_with_retry};
use crate::config::{PlatformConfig, ScrapeConfig};
use crate::error::Result;
use crate::pipeline::ShutdownFlag;
use crate::types::{Platform, RawTemplate, TemplateSource};

/// Source iterator for the n8n workflow template API
pub struct N8nSource {
    client: reqwest::Client,
    config: PlatformConfig,
    scrape: ScrapeConfig,
    shutdown: ShutdownFlag,
}

impl N8nSource {
    pub fn new(
        config: PlatformConfig,
        scrape: ScrapeConfig,
        shutdown: ShutdownFlag,
    ) -> Result<Self> {
        Ok(Self {
            client: build_client(scrape.timeout_seconds)?,
            config,
            scrape,
            shutdown,
        })
    }

    fn page_url(&self, page: u32) -> String {
        format!(
            "{}/templates/search?rows={}&page={}",
            self.config.base_url.trim_end_matches('/'),
            self.config.page_size,
            page
        )
    }
}

#[async_trait::async_trait]
impl TemplateSource for N8nSource {
    fn platform(&self) -> Platform {
        Platform::N8n
    }

    #[instrument(skip(self))]
    async fn fetch_templates(&self) -> Result<Vec<RawTemplate>> {
        let mut all_workflows = Vec::new();

        for page in 1..=self.config.max_pages {
            if self.shutdown.is_set() {
                warn!("Shutdown requested, stopping n8n fetch at page {}", page);
                break;
            }

            let url = self.page_url(page);
            let payload = match get_json_with_retry(&self.client, &url, &self.scrape).await {
                Ok(payload) => payload,
                Err(e) => {
                    // Retries exhausted: this page's records are missing,
                    // the rest of the platform still gets fetched.
                    warn!("n8n page {} skipped after retries: {}", page, e);
                    continue;
                }
            };

            let workflows = payload
                .get("workflows")
                .and_then(|v| v.as_array())
                .cloned()
                .unwrap_or_default();
            let page_count = workflows.len();
            debug!("n8n page {} returned {} workflows", page, page_count);
            all_workflows.extend(workflows);

            if let Some(cap) = self.config.max_templates {
                if all_workflows.len() >= cap {
                    all_workflows.truncate(cap);
                    break;
                }
            }
            // A short page means the listing is exhausted
            if page_count < self.config.page_size as usize {
                break;
            }

            tokio::time::sleep(std::time::Duration::from_millis(
                self.scrape.rate_limit_delay_ms,
            ))
            .await;
        }

        info!(
            "Successfully fetched {} workflows from n8n",
            all_workflows.len()
        );
        Ok(all_workflows)
    }
}
